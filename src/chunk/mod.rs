//! Text chunking
//!
//! Splits normalized source text into windows of roughly
//! `target_chars` characters. When a window would end inside the text,
//! the cut is pulled back to the nearest preceding period so sentences
//! stay whole; chunk length varies as a result. Trimmed chunks no longer
//! than `min_chars` are dropped as noise.

mod boundaries;

pub use boundaries::*;

use crate::config::ChunkConfig;
use crate::parse::normalize_newlines;
use tracing::debug;

/// A text chunk with its position in the normalized source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Trimmed chunk content
    pub text: String,

    /// Byte offset of the window start in the normalized text
    pub byte_start: usize,

    /// Byte offset of the window end in the normalized text
    pub byte_end: usize,

    /// Chunk index among retained chunks (0-based)
    pub index: usize,
}

/// Chunk raw source text
pub fn chunk_text(raw: &str, config: &ChunkConfig) -> Vec<TextChunk> {
    let text = normalize_newlines(raw);
    let target = config.target_chars.max(1);

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = advance_chars(&text, start, target);
        if end < text.len() {
            if let Some(cut) = sentence_cut(&text, start, end) {
                end = cut;
            }
        }

        let piece = text[start..end].trim();
        let length = piece.chars().count();
        if length > config.min_chars {
            chunks.push(TextChunk {
                text: piece.to_string(),
                byte_start: start,
                byte_end: end,
                index: chunks.len(),
            });
        } else if length > 0 {
            debug!(start, end, length, "Dropping short chunk");
        }

        start = end;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(target_chars: usize, min_chars: usize) -> ChunkConfig {
        ChunkConfig {
            target_chars,
            min_chars,
            ..Default::default()
        }
    }

    fn strip_whitespace(text: &str) -> String {
        text.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_short_text_below_minimum_is_dropped() {
        let chunks = chunk_text("Too short to keep.", &config(1000, 50));
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_single_chunk_is_trimmed() {
        let text = "  Whoever causes death by doing any rash or negligent act shall be punished.  \n";
        let chunks = chunk_text(text, &config(1000, 50));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text.trim());
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn test_minimum_length_is_exclusive() {
        let exactly_fifty = "a".repeat(50);
        assert!(chunk_text(&exactly_fifty, &config(1000, 50)).is_empty());

        let fifty_one = "a".repeat(51);
        assert_eq!(chunk_text(&fifty_one, &config(1000, 50)).len(), 1);
    }

    #[test]
    fn test_long_text_splits_on_sentences() {
        let sentence = "The accused drove in a rash manner on a public way under Section 279. ";
        let text = sentence.repeat(40);
        assert!(text.chars().count() >= 2500);

        let chunks = chunk_text(&text, &config(1000, 50));

        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() > 50);
            assert!(chunk.text.chars().count() <= 1001);
        }
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(chunk.text.ends_with('.'), "chunk cut mid-sentence: {:?}", chunk.text);
        }
    }

    #[test]
    fn test_chunks_reassemble_to_source() {
        let sentence = "Section 304A covers death caused by negligence. ";
        let text = sentence.repeat(55);
        let chunks = chunk_text(&text, &config(1000, 50));

        for pair in chunks.windows(2) {
            assert_eq!(pair[0].byte_end, pair[1].byte_start);
        }
        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(strip_whitespace(&joined), strip_whitespace(&text));
    }

    #[test]
    fn test_no_period_cuts_at_window() {
        let text = "a".repeat(2500);
        let chunks = chunk_text(&text, &config(1000, 50));

        let lengths: Vec<usize> = chunks.iter().map(|c| c.text.len()).collect();
        assert_eq!(lengths, vec![1000, 1000, 500]);
    }

    #[test]
    fn test_period_at_window_end_is_kept() {
        let text = format!("{}.{}", "x".repeat(1000), "y".repeat(100));
        let chunks = chunk_text(&text, &config(1000, 50));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text.len(), 1001);
        assert!(chunks[0].text.ends_with('.'));
        assert_eq!(chunks[1].text, "y".repeat(100));
    }

    #[test]
    fn test_short_tail_is_discarded() {
        let text = format!("{}. short tail", "a".repeat(989));
        let chunks = chunk_text(&text, &config(1000, 50));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text.chars().count(), 990);
    }

    #[test]
    fn test_crlf_is_normalized() {
        let text = "Line one of the statute text goes here.\r\nLine two continues the provision.\r\n";
        let chunks = chunk_text(text, &config(1000, 10));

        assert_eq!(chunks.len(), 1);
        assert!(!chunks[0].text.contains('\r'));
        assert!(chunks[0].text.contains("here.\nLine two"));
    }

    #[test]
    fn test_multibyte_text_is_counted_in_chars() {
        let text = "धारा ".repeat(600);
        let chunks = chunk_text(&text, &config(1000, 50));

        assert!(chunks.len() >= 3);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 1000);
        }
    }
}
