//! Form input sanitization.
//!
//! Text from forms gets trimmed, stripped of control characters, and capped
//! before it reaches validation or the database. Escaping for output is the
//! template engine's job; these helpers only normalize what gets stored.

/// Clean a single-line field: trim, drop all control characters, cap length.
///
/// The cap counts characters, not bytes, so multi-byte input is never split.
#[must_use]
pub fn clean_line(input: &str, max_chars: usize) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(max_chars)
        .collect()
}

/// Clean a multi-line field: keep newlines, drop other control characters,
/// trim, cap length.
#[must_use]
pub fn clean_multiline(input: &str, max_chars: usize) -> String {
    let cleaned: String = input
        .chars()
        .filter(|c| *c == '\n' || !c.is_control())
        .take(max_chars)
        .collect();
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_line_trims_and_strips_controls() {
        assert_eq!(clean_line("  Mara Jensen  ", 100), "Mara Jensen");
        assert_eq!(clean_line("a\x00b\x1bc", 100), "abc");
        assert_eq!(clean_line("one\nline", 100), "oneline");
        assert_eq!(clean_line("tab\there", 100), "tabhere");
    }

    #[test]
    fn test_clean_line_caps_by_chars() {
        assert_eq!(clean_line("abcdef", 3), "abc");
        // Multi-byte characters count as one.
        assert_eq!(clean_line("ééééé", 3), "ééé");
    }

    #[test]
    fn test_clean_multiline_keeps_newlines() {
        assert_eq!(clean_multiline("line one\nline two", 100), "line one\nline two");
        assert_eq!(clean_multiline("a\x00b\r\nc", 100), "ab\nc");
    }

    #[test]
    fn test_clean_multiline_trims_edges() {
        assert_eq!(clean_multiline("\n\nbody\n\n", 100), "body");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(clean_line("", 10), "");
        assert_eq!(clean_line("   ", 10), "");
        assert_eq!(clean_multiline("", 10), "");
    }
}
