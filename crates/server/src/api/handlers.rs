use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use segmenter_core::SanitizedConfig;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// "available" or "missing"
    pub transcoder: String,
}

/// GET /api/v1/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let transcoder = if state.transcoder_available() {
        "available"
    } else {
        "missing"
    };
    Json(HealthResponse {
        status: "ok".to_string(),
        transcoder: transcoder.to_string(),
    })
}

/// GET /api/v1/config
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}
