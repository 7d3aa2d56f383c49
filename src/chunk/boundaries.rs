//! Window boundary helpers for chunking
//!
//! All positions are byte offsets into a `str` and are always returned on
//! UTF-8 character boundaries. Window sizes are counted in chars.

/// Ensure a position is on a valid UTF-8 character boundary
pub fn ensure_char_boundary(text: &str, pos: usize) -> usize {
    if pos >= text.len() {
        return text.len();
    }
    if text.is_char_boundary(pos) {
        return pos;
    }
    // Search backwards for a valid boundary
    let mut adjusted = pos;
    while adjusted > 0 && !text.is_char_boundary(adjusted) {
        adjusted -= 1;
    }
    adjusted
}

/// Byte offset reached by advancing `chars` characters from `start`
///
/// Returns `text.len()` when the text ends first.
pub fn advance_chars(text: &str, start: usize, chars: usize) -> usize {
    let start = ensure_char_boundary(text, start);
    text[start..]
        .char_indices()
        .nth(chars)
        .map_or(text.len(), |(offset, _)| start + offset)
}

/// Find a sentence cut for the window `[start, end)`
///
/// Searches backward for the last `.` at or before the character at `end`
/// and returns the offset just past it. A period sitting exactly at `start`
/// does not count, so the window always advances. Returns `None` when no
/// period qualifies; the caller then cuts at `end`, which may land
/// mid-word.
pub fn sentence_cut(text: &str, start: usize, end: usize) -> Option<usize> {
    let start = ensure_char_boundary(text, start);
    let end = ensure_char_boundary(text, end);
    let probe_end = end + text[end..].chars().next().map_or(0, char::len_utf8);

    text[start..probe_end]
        .rfind('.')
        .filter(|&relative| relative > 0)
        .map(|relative| start + relative + 1)
}
