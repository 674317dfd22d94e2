//! Emotion labels and classification results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of emotions the classifier can produce.
///
/// `Neutral` is the fallback: every classification yields exactly one label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionLabel {
    Happy,
    Sad,
    Angry,
    Surprise,
    Question,
    #[default]
    Neutral,
    Excited,
    Flirt,
    Roast,
    Sarcasm,
    Positive,
    Negative,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 12] = [
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Angry,
        EmotionLabel::Surprise,
        EmotionLabel::Question,
        EmotionLabel::Neutral,
        EmotionLabel::Excited,
        EmotionLabel::Flirt,
        EmotionLabel::Roast,
        EmotionLabel::Sarcasm,
        EmotionLabel::Positive,
        EmotionLabel::Negative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Angry => "angry",
            EmotionLabel::Surprise => "surprise",
            EmotionLabel::Question => "question",
            EmotionLabel::Neutral => "neutral",
            EmotionLabel::Excited => "excited",
            EmotionLabel::Flirt => "flirt",
            EmotionLabel::Roast => "roast",
            EmotionLabel::Sarcasm => "sarcasm",
            EmotionLabel::Positive => "positive",
            EmotionLabel::Negative => "negative",
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which writing system the input was judged to be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Script {
    /// Contains at least one Devanagari code point.
    Devanagari,
    /// Romanized Marathi: enough words hit the lexicon.
    Transliterated,
    /// Anything else; handled by the polarity scorer.
    Latin,
}

impl Script {
    /// Native and transliterated text go through the lexicon cascade.
    pub fn is_native(&self) -> bool {
        matches!(self, Script::Devanagari | Script::Transliterated)
    }
}

/// The cascade stage that produced a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedVia {
    /// A priority-label stem occurs inside an input word.
    PriorityStem,
    /// A marker substring occurs inside an input word.
    Marker,
    /// An exact phrase occurs inside the lowercased text.
    Phrase,
    /// A hand-authored co-occurrence rule fired.
    Combination,
    /// The label with the highest stem-hit count won.
    LexiconCount,
    /// Polarity score or sarcasm indicator for non-native text.
    StatisticalFallback,
    /// Nothing matched.
    Default,
}

/// Full classifier verdict, for debugging and the classify endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: EmotionLabel,
    pub matched_via: MatchedVia,
    pub script: Script,
}
