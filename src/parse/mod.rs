//! Source text detection and normalization
//!
//! Ingestion only reads plain-text formats; this module decides which
//! files qualify and prepares their text for chunking.

use std::path::Path;

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Check whether a file's extension is in the configured allow-list
///
/// Extensions compare case-insensitively and may be written with or
/// without a leading dot.
pub fn is_supported_file(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = extension_of(path) else {
        return false;
    };
    extensions
        .iter()
        .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(&ext))
}

/// Check if content appears to be binary
pub fn is_binary_content(data: &[u8]) -> bool {
    // Check for null bytes in the first 8KB
    let check_len = std::cmp::min(data.len(), 8192);
    data[..check_len].iter().any(|&b| b == 0)
}

/// Fold platform line endings into `\n`
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_file_allow_list() {
        let exts = vec!["txt".to_string(), ".md".to_string()];
        assert!(is_supported_file(Path::new("crpc.txt"), &exts));
        assert!(is_supported_file(Path::new("notes.MD"), &exts));
        assert!(!is_supported_file(Path::new("scan.pdf"), &exts));
        assert!(!is_supported_file(Path::new("README"), &exts));
    }

    #[test]
    fn test_normalize_newlines() {
        assert_eq!(normalize_newlines("a\r\nb\r\n\r\nc\n"), "a\nb\n\nc\n");
    }

    #[test]
    fn test_binary_detection() {
        assert!(is_binary_content(&[0x00, 0x01, 0x02]));
        assert!(!is_binary_content(b"Section 302 IPC"));
    }
}
