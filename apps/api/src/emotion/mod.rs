// Emotion classification: lexicon store, script detection, rule cascade, polarity fallback.
// Everything here is pure and CPU-light; handlers call it inline.

pub mod cascade;
pub mod handlers;
pub mod labels;
pub mod lexicon;
pub mod polarity;
pub mod script;

pub use cascade::classify_detailed;
pub use labels::{ClassificationResult, EmotionLabel, MatchedVia, Script};
pub use lexicon::Lexicon;
