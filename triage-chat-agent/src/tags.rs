//! Keyword tags pulled from the user's own description

use std::collections::HashSet;

/// Maximum number of tags returned
pub const MAX_TAGS: usize = 6;

const STOP_WORDS: &[&str] = &[
    "and", "but", "the", "for", "with", "have", "had", "been", "very", "mild", "severe", "pain",
    "feel", "feels", "felt", "since", "that", "this", "there", "also", "little", "some",
];

/// Extract up to [`MAX_TAGS`] distinct keywords from free text.
///
/// Words are lowercased and split on anything that is not an ASCII letter.
/// Words of two letters or fewer and common filler words are skipped; order
/// of first appearance is kept.
pub fn extract_tags(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut seen = HashSet::new();

    lowered
        .split(|c: char| !c.is_ascii_lowercase())
        .filter(|word| word.len() > 2 && !STOP_WORDS.contains(word))
        .filter(|word| seen.insert(*word))
        .take(MAX_TAGS)
        .map(str::to_string)
        .collect()
}
