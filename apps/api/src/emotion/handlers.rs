//! Axum route handlers for the Classify API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::emotion::{classify_detailed, EmotionLabel, MatchedVia, Script};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub label: EmotionLabel,
    pub matched_via: MatchedVia,
    pub script: Script,
}

/// POST /api/v1/classify
///
/// Runs the emotion cascade on `text` and reports which stage decided.
pub async fn handle_classify(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let result = classify_detailed(&request.text, &state.lexicon);

    Ok(Json(ClassifyResponse {
        label: result.label,
        matched_via: result.matched_via,
        script: result.script,
    }))
}
