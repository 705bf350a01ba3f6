//! Text normalization for keyword matching.
//!
//! Both sides of every comparison — rule phrases at load time, descriptions
//! at analysis time — pass through the same canonical form, which is what
//! makes matching case- and accent-insensitive.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize text into its canonical comparable form.
///
/// Applied in order: lowercase; strip diacritics (NFD decomposition, then
/// combining marks dropped); replace any character outside letters/digits/
/// spaces with a space; collapse whitespace runs to one space; trim.
///
/// Total and idempotent. Empty or whitespace-only input yields `""`.
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
