use std::collections::HashSet;

const MIN_SENTENCE_CHARS: usize = 50;
const MAX_SENTENCES: usize = 6;
/// Boilerplate a scraped page drags in regardless of the article
const BOILERPLATE_MARKERS: [&str; 4] =
    ["cookie", "subscribe", "advertisement", "terms of service"];
/// Latin terminators plus the Devanagari danda, so Hindi text segments too
const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '।'];

/// Extractive summary with no model behind it: pick the first few
/// substantial, non-boilerplate, non-duplicate sentences out of
/// everything we know about the article. Total, always returns text.
///
/// When nothing qualifies the result degrades to `"{title}. {description}"`
/// even if that is near-empty. Callers compensate with their own length
/// checks; do not strengthen this here.
pub fn summarize(title: &str, description: &str, content: &str, excerpt: &str) -> String {
    let blob = format!("{}. {}. {}. {}", title, description, content, excerpt);

    let mut seen = HashSet::new();
    let mut selected: Vec<&str> = Vec::new();
    for candidate in blob.split(|c: char| SENTENCE_TERMINATORS.contains(&c)) {
        let candidate = candidate.trim();
        if candidate.chars().count() <= MIN_SENTENCE_CHARS {
            continue;
        }
        let normalized = candidate.to_lowercase();
        if BOILERPLATE_MARKERS
            .iter()
            .any(|marker| normalized.contains(marker))
        {
            continue;
        }
        if seen.insert(normalized) {
            selected.push(candidate);
            if selected.len() >= MAX_SENTENCES {
                break;
            }
        }
    }

    if selected.is_empty() {
        return format!("{}. {}", title, description);
    }

    let mut summary = selected.join(". ");
    if !summary.ends_with('.') {
        summary.push('.');
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_A: &str =
        "The central bank held interest rates steady for the third consecutive quarter amid easing inflation";
    const LONG_B: &str =
        "Analysts expect consumer spending to pick up through the festival season across most sectors";
    const LONG_C: &str =
        "Exports grew faster than imports for the first time in eighteen months according to the ministry";

    #[test]
    fn test_deduplicates_preserving_first_seen_order() {
        let blob = format!(
            "{a}. {b}. {a}. {c}. {a}.",
            a = LONG_A,
            b = LONG_B,
            c = LONG_C
        );
        let summary = summarize("t", "d", &blob, "");
        assert_eq!(summary.matches(LONG_A).count(), 1);
        assert!(summary.contains(LONG_B));
        assert!(summary.contains(LONG_C));
        // first-seen order survives
        let pos_a = summary.find(LONG_A).unwrap();
        let pos_b = summary.find(LONG_B).unwrap();
        let pos_c = summary.find(LONG_C).unwrap();
        assert!(pos_a < pos_b && pos_b < pos_c);
    }

    #[test]
    fn test_excludes_boilerplate_regardless_of_length() {
        let noisy =
            "Subscribe to our newsletter for daily updates delivered straight to your inbox every morning";
        let blob = format!("{}. {}.", LONG_A, noisy);
        let summary = summarize("t", "d", &blob, "");
        assert!(summary.contains(LONG_A));
        assert!(!summary.to_lowercase().contains("subscribe"));
    }

    #[test]
    fn test_short_sentences_are_dropped() {
        let summary = summarize("t", "d", "Too short. Also short.", "");
        assert_eq!(summary, "t. d");
    }

    #[test]
    fn test_degenerate_fallback_is_title_dot_description() {
        let summary = summarize(
            "Markets rally",
            "Stocks surged",
            "Accept cookies to continue. Advertisement.",
            "",
        );
        assert_eq!(summary, "Markets rally. Stocks surged");
    }

    #[test]
    fn test_caps_at_six_sentences() {
        let sentences: Vec<String> = (0..10)
            .map(|i| {
                format!(
                    "Sentence number {} padded with enough words to clear the fifty character minimum",
                    i
                )
            })
            .collect();
        let blob = sentences.join(". ");
        let summary = summarize("t", "d", &blob, "");
        let count = summary
            .split('.')
            .filter(|s| s.trim().chars().count() > MIN_SENTENCE_CHARS)
            .count();
        assert_eq!(count, MAX_SENTENCES);
    }

    #[test]
    fn test_splits_on_devanagari_danda() {
        let hindi =
            "भारतीय अर्थव्यवस्था ने इस तिमाही में उम्मीद से बेहतर प्रदर्शन किया और विकास दर सात प्रतिशत रही। सरकार ने बुनियादी ढांचे में निवेश बढ़ाने की घोषणा की है जिससे रोजगार के नए अवसर पैदा होंगे।";
        let summary = summarize("शीर्षक", "विवरण", hindi, "");
        assert!(summary.contains("भारतीय अर्थव्यवस्था"));
        assert!(summary.contains("बुनियादी ढांचे"));
        // the danda itself is a delimiter, not part of a sentence
        assert!(!summary.contains('।'));
    }

    #[test]
    fn test_ends_with_period() {
        let summary = summarize("t", "d", LONG_A, "");
        assert!(summary.ends_with('.'));
    }
}
