//! Axum route handlers for the Meme API.

use axum::{
    extract::State,
    http::{header, HeaderName},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::state::AppState;

pub const DETECTED_EMOTION_HEADER: HeaderName = HeaderName::from_static("x-detected-emotion");

#[derive(Debug, Deserialize)]
pub struct GenerateMemeRequest {
    pub text: String,
}

/// POST /api/v1/memes
///
/// Captions a reaction image with `text`. Responds with the raw image bytes
/// (PNG for stills, GIF for animations) and the detected emotion in a header.
pub async fn handle_generate_meme(
    State(state): State<AppState>,
    Json(request): Json<GenerateMemeRequest>,
) -> Result<Response, AppError> {
    let meme = state.pipeline.generate(&request.text).await?;

    Ok((
        [
            (header::CONTENT_TYPE, meme.image.content_type.to_string()),
            (DETECTED_EMOTION_HEADER, meme.classification.label.to_string()),
        ],
        meme.image.bytes,
    )
        .into_response())
}
