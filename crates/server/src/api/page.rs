use axum::{extract::State, response::Html};
use std::sync::Arc;

use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Bounds of the segment length control on the upload page.
pub const MIN_PAGE_SEGMENT_SECONDS: u32 = 60;
pub const MAX_PAGE_SEGMENT_SECONDS: u32 = 600;

/// GET /
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_index(state.converter().segment_seconds()))
}

fn render_index(default_seconds: u32) -> String {
    let default_seconds =
        default_seconds.clamp(MIN_PAGE_SEGMENT_SECONDS, MAX_PAGE_SEGMENT_SECONDS);
    INDEX_HTML
        .replace("{{MIN_SECONDS}}", &MIN_PAGE_SEGMENT_SECONDS.to_string())
        .replace("{{MAX_SECONDS}}", &MAX_PAGE_SEGMENT_SECONDS.to_string())
        .replace("{{DEFAULT_SECONDS}}", &default_seconds.to_string())
}
