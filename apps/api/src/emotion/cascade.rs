//! Emotion classifier: an ordered cascade of pure rules over the lexicon.
//!
//! # Cascade
//! 1. Script detection (Devanagari / transliterated / Latin).
//! 2. Priority stem: any priority-label stem inside any word.
//! 3. Marker: any marker stem inside any word.
//! 4. Phrase: any exact phrase inside the lowercased text, labels in declaration order.
//! 5. Combination: an intensifier word co-occurring with a trigger word.
//! 6. Lexicon count: label whose stems hit the most words; ties go to the earlier label.
//! 7. Statistical fallback for Latin text: sarcasm indicators, then polarity.
//!
//! Steps 2 to 6 run for native (Devanagari or transliterated) text. Latin text
//! runs only the marker step before the fallback, since the markers are English
//! slang. The first rule that yields a label wins; a native text nothing matches
//! is neutral.
//!
//! # Substring matching
//! Steps 2, 3, 5 and 6 test whether a lexicon stem occurs *inside* an input
//! word, not whether the word equals it. Short stems over-match ("ka" hits
//! "kaka"). That is accepted: romanized Marathi has no fixed spelling, and
//! inflected forms ("ragavlaas" for "ragavla") should still hit their stem.

use tracing::debug;

use crate::emotion::labels::{ClassificationResult, EmotionLabel, MatchedVia, Script};
use crate::emotion::lexicon::Lexicon;
use crate::emotion::polarity::compound_score;
use crate::emotion::script::detect_script;

/// Compound score at or beyond which plain text is happy / sad rather than positive / negative.
pub const STRONG_POLARITY: f32 = 0.5;
/// Compound score magnitude below which plain text is neutral.
pub const POLARITY_THRESHOLD: f32 = 0.05;

/// The text as given, its lowercased form and the lowercased words.
pub struct CascadeInput<'a> {
    pub text: &'a str,
    pub lowered: &'a str,
    pub words: Vec<&'a str>,
}

impl<'a> CascadeInput<'a> {
    fn new(text: &'a str, lowered: &'a str) -> Self {
        Self {
            text,
            lowered,
            words: lowered.split_whitespace().collect(),
        }
    }
}

/// A single cascade step: a pure predicate that may produce a label.
pub type Rule = fn(&CascadeInput<'_>, &Lexicon) -> Option<EmotionLabel>;

/// Native-text rules in evaluation order.
pub const NATIVE_CASCADE: &[(MatchedVia, Rule)] = &[
    (MatchedVia::PriorityStem, priority_stem_rule),
    (MatchedVia::Marker, marker_rule),
    (MatchedVia::Phrase, phrase_rule),
    (MatchedVia::Combination, combination_rule),
    (MatchedVia::LexiconCount, lexicon_count_rule),
];

/// Latin-text rules, tried before the statistical fallback.
pub const LATIN_CASCADE: &[(MatchedVia, Rule)] = &[(MatchedVia::Marker, marker_rule)];

/// `stem` occurs anywhere inside `word`. Deliberately fuzzy; see the module docs.
pub fn contains_stem(word: &str, stem: &str) -> bool {
    !stem.is_empty() && word.contains(stem)
}

/// Classifies `text` into exactly one emotion. Never fails.
pub fn classify(text: &str, lexicon: &Lexicon) -> EmotionLabel {
    classify_detailed(text, lexicon).label
}

/// Like [`classify`], also reporting the deciding stage and detected script.
pub fn classify_detailed(text: &str, lexicon: &Lexicon) -> ClassificationResult {
    let script = detect_script(text, lexicon);
    let lowered = text.to_lowercase();
    let input = CascadeInput::new(text, &lowered);

    let (label, matched_via) = if input.words.is_empty() {
        (EmotionLabel::Neutral, MatchedVia::Default)
    } else if script.is_native() {
        run_rules(NATIVE_CASCADE, &input, lexicon)
            .unwrap_or((EmotionLabel::Neutral, MatchedVia::Default))
    } else {
        run_rules(LATIN_CASCADE, &input, lexicon).unwrap_or_else(|| {
            (
                statistical_fallback(&input, lexicon),
                MatchedVia::StatisticalFallback,
            )
        })
    };

    debug!(%label, ?matched_via, ?script, "Classified text");
    ClassificationResult {
        label,
        matched_via,
        script,
    }
}

fn run_rules(
    rules: &[(MatchedVia, Rule)],
    input: &CascadeInput<'_>,
    lexicon: &Lexicon,
) -> Option<(EmotionLabel, MatchedVia)> {
    rules
        .iter()
        .find_map(|(via, rule)| rule(input, lexicon).map(|label| (label, *via)))
}

// ────────────────────────────────────────────────────────────────────────────
// Rules
// ────────────────────────────────────────────────────────────────────────────

pub fn priority_stem_rule(input: &CascadeInput<'_>, lexicon: &Lexicon) -> Option<EmotionLabel> {
    let label = lexicon.priority_label()?;
    let stems = lexicon.words_for(label)?;
    any_word_has_stem(&input.words, stems.iter()).then_some(label)
}

pub fn marker_rule(input: &CascadeInput<'_>, lexicon: &Lexicon) -> Option<EmotionLabel> {
    let markers = lexicon.markers()?;
    any_word_has_stem(&input.words, markers.stems.iter()).then_some(markers.label)
}

pub fn phrase_rule(input: &CascadeInput<'_>, lexicon: &Lexicon) -> Option<EmotionLabel> {
    lexicon
        .entries()
        .iter()
        .find(|entry| {
            entry
                .phrases
                .iter()
                .any(|phrase| input.lowered.contains(phrase.as_str()))
        })
        .map(|entry| entry.label)
}

pub fn combination_rule(input: &CascadeInput<'_>, lexicon: &Lexicon) -> Option<EmotionLabel> {
    lexicon
        .combinations()
        .iter()
        .find(|rule| {
            any_word_has_stem(&input.words, rule.intensifiers.iter())
                && any_word_has_stem(&input.words, rule.triggers.iter())
        })
        .map(|rule| rule.label)
}

pub fn lexicon_count_rule(input: &CascadeInput<'_>, lexicon: &Lexicon) -> Option<EmotionLabel> {
    let mut best: Option<(EmotionLabel, usize)> = None;
    for entry in lexicon.entries() {
        if !lexicon.is_counted(entry.label) {
            continue;
        }
        let count = input
            .words
            .iter()
            .filter(|word| entry.words.iter().any(|stem| contains_stem(word, stem)))
            .count();
        // Strictly greater: the first label to reach the maximum keeps it.
        if count > 0 && best.map_or(true, |(_, max)| count > max) {
            best = Some((entry.label, count));
        }
    }
    best.map(|(label, _)| label)
}

/// Sarcasm indicators first, then the polarity score mapped onto five labels.
pub fn statistical_fallback(input: &CascadeInput<'_>, lexicon: &Lexicon) -> EmotionLabel {
    if lexicon
        .sarcasm_indicators()
        .iter()
        .any(|indicator| input.lowered.contains(indicator.as_str()))
    {
        return EmotionLabel::Sarcasm;
    }
    polarity_label(compound_score(input.text))
}

pub fn polarity_label(compound: f32) -> EmotionLabel {
    if compound >= STRONG_POLARITY {
        EmotionLabel::Happy
    } else if compound >= POLARITY_THRESHOLD {
        EmotionLabel::Positive
    } else if compound <= -STRONG_POLARITY {
        EmotionLabel::Sad
    } else if compound <= -POLARITY_THRESHOLD {
        EmotionLabel::Negative
    } else {
        EmotionLabel::Neutral
    }
}

fn any_word_has_stem<'s>(words: &[&str], mut stems: impl Iterator<Item = &'s String>) -> bool {
    stems.any(|stem| words.iter().any(|word| contains_stem(word, stem)))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
