//! Lexicon store: per-emotion keyword stems and trigger phrases.
//!
//! Loaded once at startup from a JSON resource and shared read-only for the
//! life of the process. Emotion entries are an ordered list: declaration order
//! drives both the phrase scan and the tie-break of the weighted count.
//!
//! A bad resource is fatal. The classifier never runs on a partial lexicon.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::emotion::labels::EmotionLabel;

/// The lexicon shipped with the service.
const BUNDLED_LEXICON: &str = include_str!("../../lexicon/marathi.json");

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("failed to read lexicon {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed lexicon: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("lexicon declares no emotions")]
    Empty,

    #[error("emotion '{0}' is declared more than once")]
    DuplicateLabel(EmotionLabel),

    #[error("emotion '{0}' has neither words nor phrases")]
    EmptyEntry(EmotionLabel),

    #[error("{role} label '{label}' has no words in the lexicon")]
    MissingLabel {
        role: &'static str,
        label: EmotionLabel,
    },
}

// ────────────────────────────────────────────────────────────────────────────
// On-disk shape
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LexiconFile {
    emotions: Vec<EmotionEntryFile>,
    #[serde(default)]
    priority_label: Option<EmotionLabel>,
    #[serde(default)]
    markers: Option<MarkerFile>,
    #[serde(default)]
    combinations: Vec<CombinationFile>,
    #[serde(default)]
    sarcasm_indicators: Vec<String>,
    #[serde(default = "default_count_excluded")]
    count_excluded: Vec<EmotionLabel>,
}

#[derive(Debug, Deserialize)]
struct EmotionEntryFile {
    label: EmotionLabel,
    #[serde(default)]
    words: Vec<String>,
    #[serde(default)]
    phrases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MarkerFile {
    label: EmotionLabel,
    stems: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CombinationFile {
    label: EmotionLabel,
    intensifiers: Vec<String>,
    triggers: Vec<String>,
}

fn default_count_excluded() -> Vec<EmotionLabel> {
    vec![EmotionLabel::Neutral]
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory store
// ────────────────────────────────────────────────────────────────────────────

/// Keyword stems and exact phrases for one emotion.
#[derive(Debug, Clone)]
pub struct EmotionEntry {
    pub label: EmotionLabel,
    pub words: BTreeSet<String>,
    pub phrases: BTreeSet<String>,
}

/// Single-signal rule: any stem inside any word yields `label`.
#[derive(Debug, Clone)]
pub struct MarkerRule {
    pub label: EmotionLabel,
    pub stems: Vec<String>,
}

/// Co-occurrence rule: an intensifier word plus a trigger word yields `label`.
#[derive(Debug, Clone)]
pub struct CombinationRule {
    pub label: EmotionLabel,
    pub intensifiers: Vec<String>,
    pub triggers: Vec<String>,
}

/// Immutable lexicon. Construct once, pass by reference (or `Arc`) to the classifier.
#[derive(Debug, Clone)]
pub struct Lexicon {
    entries: Vec<EmotionEntry>,
    vocabulary: HashSet<String>,
    priority_label: Option<EmotionLabel>,
    markers: Option<MarkerRule>,
    combinations: Vec<CombinationRule>,
    sarcasm_indicators: Vec<String>,
    count_excluded: Vec<EmotionLabel>,
}

impl Lexicon {
    /// Loads from `path` when given, otherwise from the bundled resource.
    pub fn load(path: Option<&Path>) -> Result<Self, LexiconError> {
        let lexicon = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::bundled()?,
        };
        info!(
            emotions = lexicon.entries.len(),
            vocabulary = lexicon.vocabulary.len(),
            source = %path.map(|p| p.display().to_string()).unwrap_or_else(|| "bundled".to_string()),
            "Lexicon loaded"
        );
        Ok(lexicon)
    }

    pub fn bundled() -> Result<Self, LexiconError> {
        Self::from_json_str(BUNDLED_LEXICON)
    }

    pub fn from_path(path: &Path) -> Result<Self, LexiconError> {
        let raw = std::fs::read_to_string(path).map_err(|source| LexiconError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, LexiconError> {
        let file: LexiconFile = serde_json::from_str(raw)?;
        Self::from_file(file)
    }

    fn from_file(file: LexiconFile) -> Result<Self, LexiconError> {
        if file.emotions.is_empty() {
            return Err(LexiconError::Empty);
        }

        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(file.emotions.len());
        for raw in file.emotions {
            if !seen.insert(raw.label) {
                return Err(LexiconError::DuplicateLabel(raw.label));
            }
            let entry = EmotionEntry {
                label: raw.label,
                words: normalize_all(&raw.words).collect(),
                phrases: normalize_all(&raw.phrases).collect(),
            };
            if entry.words.is_empty() && entry.phrases.is_empty() {
                return Err(LexiconError::EmptyEntry(entry.label));
            }
            entries.push(entry);
        }

        let vocabulary = entries
            .iter()
            .flat_map(|e| e.words.iter().cloned())
            .collect();

        let lexicon = Lexicon {
            entries,
            vocabulary,
            priority_label: file.priority_label,
            markers: file.markers.map(|m| MarkerRule {
                label: m.label,
                stems: normalize_all(&m.stems).collect(),
            }),
            combinations: file
                .combinations
                .into_iter()
                .map(|c| CombinationRule {
                    label: c.label,
                    intensifiers: normalize_all(&c.intensifiers).collect(),
                    triggers: normalize_all(&c.triggers).collect(),
                })
                .collect(),
            sarcasm_indicators: normalize_all(&file.sarcasm_indicators).collect(),
            count_excluded: file.count_excluded,
        };

        if let Some(label) = lexicon.priority_label {
            if lexicon.words_for(label).map_or(true, |w| w.is_empty()) {
                return Err(LexiconError::MissingLabel {
                    role: "priority",
                    label,
                });
            }
        }
        if let Some(markers) = &lexicon.markers {
            if markers.stems.is_empty() {
                return Err(LexiconError::MissingLabel {
                    role: "marker",
                    label: markers.label,
                });
            }
        }

        Ok(lexicon)
    }

    /// Emotion entries in declaration order.
    pub fn entries(&self) -> &[EmotionEntry] {
        &self.entries
    }

    pub fn words_for(&self, label: EmotionLabel) -> Option<&BTreeSet<String>> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| &e.words)
    }

    /// Exact membership in the union of all word sets.
    pub fn is_vocabulary_word(&self, word: &str) -> bool {
        self.vocabulary.contains(word)
    }

    pub fn priority_label(&self) -> Option<EmotionLabel> {
        self.priority_label
    }

    pub fn markers(&self) -> Option<&MarkerRule> {
        self.markers.as_ref()
    }

    pub fn combinations(&self) -> &[CombinationRule] {
        &self.combinations
    }

    pub fn sarcasm_indicators(&self) -> &[String] {
        &self.sarcasm_indicators
    }

    /// Whether `label` takes part in the weighted count.
    pub fn is_counted(&self, label: EmotionLabel) -> bool {
        !self.count_excluded.contains(&label)
    }
}

/// Lowercases, trims, and turns `snake_joined` phrases into spaced ones.
fn normalize_all(items: &[String]) -> impl Iterator<Item = String> + '_ {
    items
        .iter()
        .map(|s| s.trim().to_lowercase().replace('_', " "))
        .filter(|s| !s.is_empty())
}
