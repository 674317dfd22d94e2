//! Script detection: Devanagari, romanized Marathi, or plain Latin text.

use std::collections::HashSet;

use crate::emotion::labels::Script;
use crate::emotion::lexicon::Lexicon;

/// Share of distinct words that must be lexicon words for text to count as transliterated.
pub const TRANSLITERATION_THRESHOLD: f32 = 0.2;

/// True if any code point falls in the Devanagari block (U+0900..=U+097F).
pub fn contains_devanagari(text: &str) -> bool {
    text.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c))
}

/// Fraction of distinct lowercase words that are exact lexicon words.
///
/// Empty input yields `0.0` rather than dividing by zero.
pub fn vocabulary_ratio(text: &str, lexicon: &Lexicon) -> f32 {
    let lowered = text.to_lowercase();
    let words: HashSet<&str> = lowered.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let hits = words.iter().filter(|w| lexicon.is_vocabulary_word(w)).count();
    hits as f32 / words.len() as f32
}

pub fn detect_script(text: &str, lexicon: &Lexicon) -> Script {
    if contains_devanagari(text) {
        Script::Devanagari
    } else if vocabulary_ratio(text, lexicon) > TRANSLITERATION_THRESHOLD {
        Script::Transliterated
    } else {
        Script::Latin
    }
}
