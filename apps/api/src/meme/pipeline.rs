//! Meme pipeline: caption text in, captioned image out.
//!
//! # Steps
//! 1. Validate: blank text is rejected.
//! 2. Classify the caption against the lexicon.
//! 3. Walk the search plan until a query returns hits; otherwise use the
//!    label's fallback GIF. A rate-limited search stops the walk.
//! 4. Fetch the chosen image (one retry with a neutral fallback on failure).
//! 5. Decode, caption every frame and encode. CPU-bound, so it runs on
//!    `tokio::task::spawn_blocking` with owned inputs and its own typesetter.

use std::sync::Arc;

use anyhow::anyhow;
use bytes::Bytes;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::caption::{
    decode_frames, encode_frames, render_caption, CaptionStyle, EncodedImage, LayoutParams,
    TypesetterFactory,
};
use crate::emotion::{classify_detailed, ClassificationResult, Lexicon};
use crate::errors::AppError;
use crate::meme::search::{fallback_url, retry_url, search_plan, ImageSearch, SearchError};

#[derive(Debug)]
pub struct GeneratedMeme {
    pub image: EncodedImage,
    pub classification: ClassificationResult,
    pub source_url: String,
    pub frame_count: usize,
}

pub struct MemePipeline {
    lexicon: Arc<Lexicon>,
    search: Arc<dyn ImageSearch>,
    fonts: Arc<dyn TypesetterFactory>,
    style: CaptionStyle,
    params: LayoutParams,
}

impl MemePipeline {
    pub fn new(
        lexicon: Arc<Lexicon>,
        search: Arc<dyn ImageSearch>,
        fonts: Arc<dyn TypesetterFactory>,
    ) -> Self {
        Self {
            lexicon,
            search,
            fonts,
            style: CaptionStyle::default(),
            params: LayoutParams::default(),
        }
    }

    pub async fn generate(&self, text: &str) -> Result<GeneratedMeme, AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("text cannot be empty".to_string()));
        }

        let classification = classify_detailed(text, &self.lexicon);
        info!(
            label = %classification.label,
            matched_via = ?classification.matched_via,
            script = ?classification.script,
            "Classified caption"
        );

        let url = self.find_image_url(text, &classification).await;
        let (source_url, bytes) = self.fetch_source(&url).await?;

        let fonts = Arc::clone(&self.fonts);
        let style = self.style;
        let params = self.params.clone();
        let caption = text.to_string();
        let (image, frame_count) = tokio::task::spawn_blocking(move || {
            render_meme(&bytes, &caption, fonts.as_ref(), &style, &params)
        })
        .await
        .map_err(|e| AppError::Internal(anyhow!("render task failed: {e}")))??;

        info!(
            source = %source_url,
            frames = frame_count,
            content_type = image.content_type,
            bytes = image.bytes.len(),
            "Meme rendered"
        );

        Ok(GeneratedMeme {
            image,
            classification,
            source_url,
            frame_count,
        })
    }

    /// First hit of the search plan, or a fallback URL for the label. Never fails.
    pub async fn find_image_url(&self, text: &str, classification: &ClassificationResult) -> String {
        let mut rng = StdRng::from_entropy();
        let plan = search_plan(text, classification, &mut rng);

        for query in plan {
            match self.search.search(&query.term, query.limit).await {
                Ok(urls) => {
                    if let Some(url) = urls.choose(&mut rng) {
                        debug!(term = %query.term, hits = urls.len(), "Search hit");
                        return url.clone();
                    }
                    debug!(term = %query.term, "No results, trying next term");
                }
                Err(SearchError::MissingApiKey) => {
                    warn!(
                        backend = self.search.backend_name(),
                        "No image search API key, using fallback image"
                    );
                    break;
                }
                Err(e) if e.is_rate_limited() => {
                    warn!(
                        backend = self.search.backend_name(),
                        term = %query.term,
                        "Image search rate limited, using fallback image"
                    );
                    break;
                }
                Err(e) => {
                    warn!(term = %query.term, error = %e, "Image search failed, trying next term");
                }
            }
        }

        fallback_url(classification.label, &mut rng).to_string()
    }

    async fn fetch_source(&self, url: &str) -> Result<(String, Bytes), AppError> {
        match self.search.fetch(url).await {
            Ok(bytes) => Ok((url.to_string(), bytes)),
            Err(e) => {
                let Some(fallback) = retry_url(url, &mut StdRng::from_entropy()) else {
                    return Err(e.into());
                };
                warn!(url, error = %e, fallback, "Image fetch failed, trying fallback");
                let bytes = self.search.fetch(fallback).await?;
                Ok((fallback.to_string(), bytes))
            }
        }
    }
}

/// Decode, caption and encode. Runs on the blocking pool.
fn render_meme(
    bytes: &[u8],
    caption: &str,
    fonts: &dyn TypesetterFactory,
    style: &CaptionStyle,
    params: &LayoutParams,
) -> Result<(EncodedImage, usize), AppError> {
    let frames = decode_frames(bytes)?;
    let frame_count = frames.len();

    let mut typesetter = fonts.typesetter();
    let rendered = render_caption(frames, caption, &mut *typesetter, style, params);

    Ok((encode_frames(&rendered)?, frame_count))
}
