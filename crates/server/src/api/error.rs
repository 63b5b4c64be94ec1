use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use super::convert::FileReport;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<FileReport>>,
}

/// Errors returned by API handlers as JSON bodies.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Multipart(#[from] MultipartError),

    /// At least one upload failed; no archive is produced.
    #[error("{message}")]
    ConversionFailed {
        message: String,
        results: Vec<FileReport>,
    },

    #[error("{message}")]
    TranscoderMissing {
        message: String,
        results: Vec<FileReport>,
    },

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(e) => e.status(),
            ApiError::ConversionFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::TranscoderMissing { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Multipart(e) => ErrorResponse {
                error: e.body_text(),
                results: None,
            },
            ApiError::ConversionFailed { message, results }
            | ApiError::TranscoderMissing { message, results } => ErrorResponse {
                error: message,
                results: Some(results),
            },
            other => ErrorResponse {
                error: other.to_string(),
                results: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
