//! Image search: picks a reaction GIF for a caption.
//!
//! `ImageSearch` is the seam: `GiphyClient` in production, in-memory fakes in
//! tests. `AppState` carries it as `Arc<dyn ImageSearch>`.
//!
//! Which queries to try, and in what order, is decided by `search_plan` from
//! the caption's classification. The pipeline walks the plan until a query
//! returns results.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::emotion::{ClassificationResult, EmotionLabel};

const GIPHY_SEARCH_URL: &str = "https://api.giphy.com/v1/gifs/search";
const GIPHY_RATING: &str = "g";
/// Upper bound (inclusive) of the random result offset, for variety between calls.
const MAX_RANDOM_OFFSET: u32 = 10;

pub const DEFAULT_LIMIT: u32 = 5;
pub const FLIRT_LIMIT: u32 = 10;

/// Neutral fallback GIFs: used for labels without their own list, and for the
/// retry after a failed fetch.
pub const FALLBACK_URLS: &[&str] = &[HAPPY_DANCE_GIF, SAD_FACE_GIF, BURN_GIF];

const HAPPY_DANCE_GIF: &str = "https://media.giphy.com/media/ICOgUNjpvO0PC/giphy.gif";
const SAD_FACE_GIF: &str = "https://media.giphy.com/media/3oKIPnAiaMCws8nOsE/giphy.gif";
const BURN_GIF: &str = "https://media.giphy.com/media/W3QKEujo8vztC/giphy.gif";

const FLIRT_TERMS: &[&str] = &[
    "cute couple reaction",
    "flirting anime",
    "love cute cartoon",
    "romantic reaction",
    "sweet love",
    "cute love",
    "anime blush",
    "shy cute",
    "cute flirt",
    "blushing reaction",
];

const SARCASM_TERMS: &[&str] = &[
    "sarcastic reaction",
    "eye roll",
    "yeah right meme",
    "sure sure gif",
    "obviously meme",
    "skill issue meme",
    "git gud reaction",
    "cope seethe meme",
    "sarcastic face",
    "eyeroll gif",
    "whatever reaction",
    "sarcastic clap",
    "slow clap",
    "sarcastic applause",
];

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("no image search API key configured")]
    MissingApiKey,
}

impl SearchError {
    /// The backend refused the call for exceeding its request quota (HTTP 429).
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, SearchError::Api { status: 429, .. })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// URLs of images matching `query`, at most `limit`. Empty when nothing matched.
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<String>, SearchError>;

    /// Downloads the image at `url`.
    async fn fetch(&self, url: &str) -> Result<Bytes, SearchError>;

    fn backend_name(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// Search plans
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub term: String,
    pub limit: u32,
}

/// Ordered queries to try for a caption.
///
/// Native text searches by emotion only. Latin text tries its own words first,
/// then the emotion terms. Flirt starts with its own shuffled list.
pub fn search_plan<R: Rng + ?Sized>(
    text: &str,
    classification: &ClassificationResult,
    rng: &mut R,
) -> Vec<SearchQuery> {
    let mut plan = Vec::new();
    let label = classification.label;

    if label == EmotionLabel::Flirt {
        let mut flirt: Vec<&str> = FLIRT_TERMS.to_vec();
        flirt.shuffle(rng);
        push_terms(&mut plan, flirt, FLIRT_LIMIT);
    }

    if classification.script.is_native() {
        push_terms(&mut plan, emotion_terms(label).iter().copied(), DEFAULT_LIMIT);
        push_terms(&mut plan, ["funny reaction"], DEFAULT_LIMIT);
    } else {
        let words: Vec<&str> = text.split_whitespace().collect();
        let first_two = words.iter().take(2).copied().collect::<Vec<_>>().join(" ");
        let first = words.first().copied().unwrap_or("");
        push_terms(&mut plan, [text.trim(), first_two.as_str(), first], DEFAULT_LIMIT);
        push_terms(&mut plan, emotion_terms(label).iter().copied(), DEFAULT_LIMIT);
        push_terms(&mut plan, ["reaction", "funny"], DEFAULT_LIMIT);
    }

    plan
}

fn push_terms<'a>(plan: &mut Vec<SearchQuery>, terms: impl IntoIterator<Item = &'a str>, limit: u32) {
    for term in terms {
        let term = term.trim();
        if term.is_empty() || plan.iter().any(|q| q.term == term) {
            continue;
        }
        plan.push(SearchQuery {
            term: term.to_string(),
            limit,
        });
    }
}

pub fn emotion_terms(label: EmotionLabel) -> &'static [&'static str] {
    match label {
        EmotionLabel::Happy => &["happy meme", "joy reaction", "excited gif"],
        EmotionLabel::Sad => &["sad meme", "depressed reaction", "crying gif"],
        EmotionLabel::Positive => &["positive vibes", "good mood", "optimistic"],
        EmotionLabel::Negative => &["angry meme", "frustrated reaction", "annoyed gif"],
        EmotionLabel::Neutral => &["neutral reaction", "meh meme", "whatever gif"],
        EmotionLabel::Flirt => &["cute flirt", "romantic cute", "sweet couple"],
        EmotionLabel::Roast => &["roast meme", "savage reaction", "burn gif"],
        EmotionLabel::Sarcasm => SARCASM_TERMS,
        EmotionLabel::Angry => &["angry reaction", "rage meme", "mad funny"],
        EmotionLabel::Surprise => &["shocked reaction", "surprised meme", "wow face"],
        EmotionLabel::Question => &["confused meme", "thinking reaction", "doubt face"],
        EmotionLabel::Excited => &["excited reaction", "awesome", "celebration"],
    }
}

/// Fallback GIFs for `label`.
pub fn fallback_urls(label: EmotionLabel) -> &'static [&'static str] {
    match label {
        EmotionLabel::Happy => &[HAPPY_DANCE_GIF],
        EmotionLabel::Sad | EmotionLabel::Sarcasm | EmotionLabel::Flirt | EmotionLabel::Neutral => {
            &[SAD_FACE_GIF]
        }
        EmotionLabel::Roast | EmotionLabel::Negative => &[BURN_GIF],
        EmotionLabel::Positive => &[SAD_FACE_GIF, HAPPY_DANCE_GIF, BURN_GIF],
        _ => FALLBACK_URLS,
    }
}

/// A random fallback GIF URL for `label`.
pub fn fallback_url<R: Rng + ?Sized>(label: EmotionLabel, rng: &mut R) -> &'static str {
    fallback_urls(label).choose(rng).copied().unwrap_or(HAPPY_DANCE_GIF)
}

/// A random neutral fallback other than `failed`, for retrying a failed fetch.
pub fn retry_url<R: Rng + ?Sized>(failed: &str, rng: &mut R) -> Option<&'static str> {
    let candidates: Vec<&'static str> = FALLBACK_URLS
        .iter()
        .copied()
        .filter(|url| *url != failed)
        .collect();
    candidates.choose(rng).copied()
}

// ────────────────────────────────────────────────────────────────────────────
// Giphy backend
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GiphySearchResponse {
    data: Vec<GiphyGif>,
}

#[derive(Debug, Deserialize)]
struct GiphyGif {
    images: GiphyImages,
}

#[derive(Debug, Deserialize)]
struct GiphyImages {
    #[serde(default)]
    original: Option<GiphyRendition>,
}

#[derive(Debug, Deserialize)]
struct GiphyRendition {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GiphyErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct GiphyClient {
    client: Client,
    api_key: Option<String>,
}

impl GiphyClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, SearchError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl ImageSearch for GiphyClient {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<String>, SearchError> {
        let api_key = self.api_key.as_deref().ok_or(SearchError::MissingApiKey)?;
        let offset = rand::thread_rng().gen_range(0..=MAX_RANDOM_OFFSET);
        let limit = limit.to_string();
        let offset = offset.to_string();

        let response = self
            .client
            .get(GIPHY_SEARCH_URL)
            .query(&[
                ("api_key", api_key),
                ("q", query),
                ("limit", limit.as_str()),
                ("rating", GIPHY_RATING),
                ("offset", offset.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GiphyErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GiphySearchResponse = response.json().await?;
        let urls: Vec<String> = parsed
            .data
            .into_iter()
            .filter_map(|gif| gif.images.original.and_then(|o| o.url))
            .collect();
        debug!(query, offset = %offset, hits = urls.len(), "Giphy search");
        Ok(urls)
    }

    async fn fetch(&self, url: &str) -> Result<Bytes, SearchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Api {
                status: status.as_u16(),
                message: format!("fetching {url} failed"),
            });
        }
        Ok(response.bytes().await?)
    }

    fn backend_name(&self) -> &'static str {
        "giphy"
    }
}
