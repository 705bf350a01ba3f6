//! Routing for pre-structured descriptions.
//!
//! Workshop records are often entered as `|`-separated segments with a
//! leading marker word, e.g. `Parts: one oil filter | Work done: full
//! service`. When markers are present, each dimension's pass only sees the
//! segments addressed to it (unmarked segments go to both). Text without
//! markers is analyzed whole by both passes.

const PARTS_MARKERS: &[&str] = &["part", "parts", "spare", "spares"];
const LABOR_MARKERS: &[&str] = &["labor", "labour", "work", "works", "service"];

/// How a description splits across the two dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// No dimension markers; both passes analyze the whole description.
    Whole,
    /// Marked segments routed per dimension.
    Split { parts: String, labor: String },
}

fn leading_word(segment: &str) -> Option<String> {
    segment
        .trim_start()
        .split(|c: char| !c.is_alphanumeric())
        .next()
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

fn marks_parts(segment: &str) -> bool {
    leading_word(segment).is_some_and(|w| PARTS_MARKERS.contains(&w.as_str()))
}

fn marks_labor(segment: &str) -> bool {
    leading_word(segment).is_some_and(|w| LABOR_MARKERS.contains(&w.as_str()))
}

/// Split a description into per-dimension texts.
pub fn route(description: &str) -> Routed {
    if !description.contains('|') {
        return Routed::Whole;
    }

    let segments: Vec<&str> = description.split('|').map(str::trim).collect();
    if !segments.iter().any(|s| marks_parts(s) || marks_labor(s)) {
        return Routed::Whole;
    }

    let mut parts = String::new();
    let mut labor = String::new();
    for segment in segments {
        if segment.is_empty() {
            continue;
        }
        let to_parts = marks_parts(segment);
        let to_labor = marks_labor(segment);
        if to_parts || !to_labor {
            if !parts.is_empty() {
                parts.push(' ');
            }
            parts.push_str(segment);
        }
        if to_labor || !to_parts {
            if !labor.is_empty() {
                labor.push(' ');
            }
            labor.push_str(segment);
        }
    }

    Routed::Split { parts, labor }
}
