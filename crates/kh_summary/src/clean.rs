use once_cell::sync::Lazy;
use regex::Regex;

static TRUNCATION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\+\d+ chars\]").unwrap());
static PERIOD_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{3,}").unwrap());

/// Normalize a raw text fragment from the news feed: drop the
/// `[+N chars]` truncation markers NewsAPI appends, collapse ellipsis
/// runs to a single period, trim.
pub fn clean(text: &str) -> String {
    let text = TRUNCATION_MARKER.replace_all(text, "");
    let text = PERIOD_RUNS.replace_all(&text, ".");
    text.trim().to_string()
}

/// Char-safe prefix, never splits inside a multi-byte sequence.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_truncation_marker() {
        assert_eq!(clean("Breaking news [+120 chars]"), "Breaking news");
    }

    #[test]
    fn test_collapses_period_runs() {
        assert_eq!(clean("to be continued...."), "to be continued.");
        assert_eq!(clean("wait... what"), "wait. what");
        // two periods are left alone
        assert_eq!(clean("v1.2"), "v1.2");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("   "), "");
    }

    #[test]
    fn test_idempotent() {
        for input in [
            "Breaking news [+120 chars]",
            "dots..... everywhere.....",
            "  plain text  ",
            "",
        ] {
            let once = clean(input);
            assert_eq!(clean(&once), once);
        }
    }

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        // Devanagari chars are multi-byte; slicing must not panic
        assert_eq!(truncate_chars("नमस्ते दुनिया", 6), "नमस्ते");
    }
}
