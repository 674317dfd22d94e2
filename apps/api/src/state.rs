use std::sync::Arc;

use crate::emotion::Lexicon;
use crate::meme::MemePipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Loaded once at startup, immutable afterwards.
    pub lexicon: Arc<Lexicon>,
    pub pipeline: Arc<MemePipeline>,
}
