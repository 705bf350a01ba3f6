//! Keyword matching against normalized text.
//!
//! Strategies run in priority order — exact substring, then synonym
//! substring, then approximate — and the first satisfied one wins, so a
//! keyword contributes at most one hit per call. Matching is case- and
//! accent-insensitive by construction: both sides are normalized before
//! they get here.

pub mod similarity;

use serde::Serialize;

use crate::rules::{Keyword, RuleSet};

/// How a keyword was found in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Synonym,
    Fuzzy,
}

/// One keyword found in one text. Ephemeral; consumed by the scorer.
#[derive(Debug, Clone)]
pub struct MatchHit {
    pub keyword_id: i64,
    pub category_id: i64,
    pub kind: MatchKind,
    /// The phrase as it matched: the literal or synonym for substring hits,
    /// the text window for approximate hits.
    pub matched_text: String,
    /// 1.0 for Exact/Synonym, the similarity ratio otherwise.
    pub similarity: f64,
}

/// Find all keyword hits in already-normalized text.
///
/// A category may accumulate hits from several of its keywords; each
/// keyword yields at most one.
pub fn find_hits(normalized_text: &str, ruleset: &RuleSet, fuzzy_threshold: f64) -> Vec<MatchHit> {
    if normalized_text.is_empty() {
        return Vec::new();
    }

    let words: Vec<&str> = normalized_text.split(' ').collect();

    ruleset
        .keywords()
        .iter()
        .filter_map(|keyword| match_keyword(normalized_text, &words, keyword, fuzzy_threshold))
        .collect()
}

fn match_keyword(
    text: &str,
    words: &[&str],
    keyword: &Keyword,
    fuzzy_threshold: f64,
) -> Option<MatchHit> {
    match_exact(text, keyword)
        .or_else(|| match_synonym(text, keyword))
        .or_else(|| match_fuzzy(words, keyword, fuzzy_threshold))
}

fn match_exact(text: &str, keyword: &Keyword) -> Option<MatchHit> {
    if text.contains(&keyword.literal) {
        Some(MatchHit {
            keyword_id: keyword.id,
            category_id: keyword.category_id,
            kind: MatchKind::Exact,
            matched_text: keyword.literal.clone(),
            similarity: 1.0,
        })
    } else {
        None
    }
}

fn match_synonym(text: &str, keyword: &Keyword) -> Option<MatchHit> {
    keyword
        .synonyms
        .iter()
        .find(|synonym| text.contains(synonym.as_str()))
        .map(|synonym| MatchHit {
            keyword_id: keyword.id,
            category_id: keyword.category_id,
            kind: MatchKind::Synonym,
            matched_text: synonym.clone(),
            similarity: 1.0,
        })
}

fn match_fuzzy(words: &[&str], keyword: &Keyword, fuzzy_threshold: f64) -> Option<MatchHit> {
    let mut best: Option<(f64, String)> = None;
    for pattern in std::iter::once(&keyword.literal).chain(keyword.synonyms.iter()) {
        if let Some((ratio, window)) = similarity::best_window(words, pattern) {
            if best.as_ref().is_none_or(|(b, _)| ratio > *b) {
                best = Some((ratio, window));
            }
        }
    }

    let (ratio, window) = best?;
    if ratio >= fuzzy_threshold {
        Some(MatchHit {
            keyword_id: keyword.id,
            category_id: keyword.category_id,
            kind: MatchKind::Fuzzy,
            matched_text: window,
            similarity: ratio,
        })
    } else {
        None
    }
}
