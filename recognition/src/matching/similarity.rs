//! Windowed edit-similarity for approximate keyword matching.

use strsim::normalized_levenshtein;

/// Best similarity ratio between `pattern` and sliding word-windows of the
/// text, with the window's word count matching the pattern's.
///
/// Returns the ratio and the window text that produced it, or `None` when
/// the text has no words. Texts shorter than the pattern are compared
/// whole.
pub fn best_window(words: &[&str], pattern: &str) -> Option<(f64, String)> {
    if words.is_empty() || pattern.is_empty() {
        return None;
    }

    let pattern_len = pattern.split(' ').count().max(1);
    let window_len = pattern_len.min(words.len());

    let mut best: Option<(f64, String)> = None;
    for window in words.windows(window_len) {
        let candidate = window.join(" ");
        let ratio = normalized_levenshtein(pattern, &candidate);
        if best.as_ref().is_none_or(|(b, _)| ratio > *b) {
            best = Some((ratio, candidate));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<&str> {
        text.split(' ').collect()
    }

    #[test]
    fn test_single_word_typo() {
        let (ratio, text) = best_window(&words("changd the flter"), "filter").unwrap();
        assert_eq!(text, "flter");
        // One deletion out of six characters
        assert!((ratio - (1.0 - 1.0 / 6.0)).abs() < 1e-9, "ratio={ratio}");
    }

    #[test]
    fn test_exact_window_is_perfect() {
        let (ratio, text) = best_window(&words("replaced the oil filter"), "filter").unwrap();
        assert_eq!(text, "filter");
        assert!((ratio - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_multi_word_pattern() {
        let (ratio, text) =
            best_window(&words("full hydralic pump overhaul"), "hydraulic pump").unwrap();
        assert_eq!(text, "hydralic pump");
        assert!(ratio > 0.9, "ratio={ratio}");
    }

    #[test]
    fn test_text_shorter_than_pattern() {
        let (ratio, text) = best_window(&words("pump"), "hydraulic pump").unwrap();
        assert_eq!(text, "pump");
        assert!(ratio < 0.5, "ratio={ratio}");
    }

    #[test]
    fn test_empty_inputs() {
        assert!(best_window(&[], "filter").is_none());
        assert!(best_window(&words("some text"), "").is_none());
    }

    #[test]
    fn test_unrelated_words_score_low() {
        let (ratio, _) = best_window(&words("welded the boom cylinder"), "filter").unwrap();
        assert!(ratio < 0.5, "ratio={ratio}");
    }
}
