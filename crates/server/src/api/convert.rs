//! Upload conversion endpoint.
//!
//! Uploads are written to a scratch directory that lives only as long as the
//! request, converted one after another, and streamed back as a single zip
//! written into that same directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Local;
use futures::StreamExt;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use segmenter_core::{ConversionResult, ErrorKind};

use super::error::ApiError;
use crate::archive;
use crate::state::AppState;

/// Multipart field carrying an `.m4a` upload (may repeat).
pub const UPLOAD_FIELD: &str = "file";
/// Optional multipart field with the segment length in seconds.
pub const SEGMENT_TIME_FIELD: &str = "segment_time";

/// Per-file outcome reported when a request fails.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub file: String,
    pub status: ReportStatus,
    pub segments: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Converted,
    Failed,
}

impl FileReport {
    pub fn new(file: &str, result: &ConversionResult) -> Self {
        let failed = !result.success();
        Self {
            file: file.to_string(),
            status: if failed {
                ReportStatus::Failed
            } else {
                ReportStatus::Converted
            },
            segments: result.segments().len(),
            kind: result.error_kind(),
            error: failed.then(|| result.output_dir_or_error()),
        }
    }
}

#[derive(Debug)]
struct Upload {
    file_name: String,
    path: PathBuf,
    /// Archive folder used when several files are uploaded together.
    folder: String,
}

#[derive(Debug, Default)]
struct UploadForm {
    uploads: Vec<Upload>,
    segment_seconds: Option<u32>,
}

/// POST /api/v1/convert
///
/// Multipart form with one or more `file` fields and an optional
/// `segment_time`. Responds with a zip of all segments, or a JSON report
/// when any file fails.
pub async fn convert_uploads(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4();
    let scratch = tempfile::Builder::new()
        .prefix("segmenter-")
        .tempdir()
        .map_err(|e| ApiError::Internal(format!("Failed to create scratch directory: {}", e)))?;

    let form = read_form(&mut multipart, scratch.path()).await?;
    if form.uploads.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "No file uploaded, send one or more '{}' fields",
            UPLOAD_FIELD
        )));
    }

    let converter = state.converter();
    let segment_seconds = form
        .segment_seconds
        .unwrap_or_else(|| converter.segment_seconds());
    info!(
        %request_id,
        files = form.uploads.len(),
        segment_seconds,
        "Converting uploads"
    );

    let mut reports = Vec::with_capacity(form.uploads.len());
    let mut converted = Vec::with_capacity(form.uploads.len());
    for upload in &form.uploads {
        let result = converter
            .convert_file_with(&upload.path, segment_seconds)
            .await;
        reports.push(FileReport::new(&upload.file_name, &result));
        if result.success() {
            converted.push((upload.folder.clone(), result.segments().to_vec()));
        }
    }

    let failed = reports
        .iter()
        .filter(|r| r.status == ReportStatus::Failed)
        .count();
    if failed > 0 {
        warn!(%request_id, failed, total = reports.len(), "Upload conversion failed");
        if reports
            .iter()
            .any(|r| r.kind == Some(ErrorKind::ExternalToolMissing))
        {
            state.set_transcoder_available(false);
            return Err(ApiError::TranscoderMissing {
                message: "Transcoder is not available on the server".to_string(),
                results: reports,
            });
        }
        return Err(ApiError::ConversionFailed {
            message: format!("{} of {} files failed to convert", failed, reports.len()),
            results: reports,
        });
    }
    state.set_transcoder_available(true);

    let entries = archive::layout(&converted);
    let zip_path = scratch.path().join(format!("{}.zip", request_id));
    let zip_dest = zip_path.clone();
    let size = tokio::task::spawn_blocking(move || archive::write_zip(&entries, &zip_dest))
        .await
        .map_err(|e| ApiError::Internal(format!("Archive task failed: {}", e)))?
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let file_name = archive::archive_file_name(&Local::now());
    info!(%request_id, archive = %file_name, bytes = size, "Archive ready");

    let zip = tokio::fs::File::open(&zip_path)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to open archive: {}", e)))?;
    // Scratch directory lives until the body is dropped
    let body = Body::from_stream(ReaderStream::new(zip).map(move |chunk| {
        let _scratch = &scratch;
        chunk
    }));

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
            (header::CONTENT_LENGTH, size.to_string()),
        ],
        body,
    )
        .into_response())
}

async fn read_form(multipart: &mut Multipart, scratch: &Path) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();
    let mut folders = HashSet::new();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            UPLOAD_FIELD => {
                let file_name = field
                    .file_name()
                    .and_then(sanitize_file_name)
                    .ok_or_else(|| ApiError::BadRequest("Upload is missing a file name".into()))?;

                // One directory per upload so equal names never collide
                let dir = scratch.join(form.uploads.len().to_string());
                tokio::fs::create_dir(&dir).await.map_err(scratch_error)?;
                let path = dir.join(&file_name);

                let mut file = tokio::fs::File::create(&path)
                    .await
                    .map_err(scratch_error)?;
                while let Some(chunk) = field.chunk().await? {
                    file.write_all(&chunk).await.map_err(scratch_error)?;
                }
                file.flush().await.map_err(scratch_error)?;

                let stem = Path::new(&file_name)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file_name.clone());
                let folder = unique_folder(&stem, &mut folders);
                debug!(file = %file_name, folder = %folder, "Stored upload");
                form.uploads.push(Upload {
                    file_name,
                    path,
                    folder,
                });
            }
            SEGMENT_TIME_FIELD => {
                let text = field.text().await?;
                form.segment_seconds = parse_segment_time(&text)?;
            }
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

fn scratch_error(e: std::io::Error) -> ApiError {
    ApiError::Internal(format!("Failed to store upload: {}", e))
}

/// Empty means "use the default"; anything else must be a positive integer.
fn parse_segment_time(text: &str) -> Result<Option<u32>, ApiError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    match text.parse::<u32>() {
        Ok(seconds) if seconds > 0 => Ok(Some(seconds)),
        _ => Err(ApiError::BadRequest(format!(
            "{} must be a positive whole number of seconds, got '{}'",
            SEGMENT_TIME_FIELD, text
        ))),
    }
}

/// Last path component of a client-supplied name.
fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next()?.trim();
    match base {
        "" | "." | ".." => None,
        base => Some(base.to_string()),
    }
}

fn unique_folder(stem: &str, taken: &mut HashSet<String>) -> String {
    let mut candidate = stem.to_string();
    let mut n = 2;
    while !taken.insert(candidate.clone()) {
        candidate = format!("{}-{}", stem, n);
        n += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use segmenter_core::ConverterError;

    #[test]
    fn test_parse_segment_time() {
        assert_eq!(parse_segment_time("").unwrap(), None);
        assert_eq!(parse_segment_time(" 180 ").unwrap(), Some(180));
        assert!(parse_segment_time("0").is_err());
        assert!(parse_segment_time("-60").is_err());
        assert!(parse_segment_time("ten").is_err());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("book.m4a").as_deref(), Some("book.m4a"));
        assert_eq!(
            sanitize_file_name("../../etc/book.m4a").as_deref(),
            Some("book.m4a")
        );
        assert_eq!(
            sanitize_file_name("C:\\Users\\me\\book.m4a").as_deref(),
            Some("book.m4a")
        );
        assert_eq!(sanitize_file_name(".."), None);
        assert_eq!(sanitize_file_name("dir/"), None);
    }

    #[test]
    fn test_unique_folder() {
        let mut taken = HashSet::new();
        assert_eq!(unique_folder("book", &mut taken), "book");
        assert_eq!(unique_folder("book", &mut taken), "book-2");
        assert_eq!(unique_folder("book", &mut taken), "book-3");
        assert_eq!(unique_folder("other", &mut taken), "other");
    }

    #[test]
    fn test_file_report_failed() {
        let err = ConverterError::UnsupportedFormat {
            path: PathBuf::from("notes.txt"),
            extension: "txt".to_string(),
        };
        let result = ConversionResult::failed(PathBuf::from("notes.txt"), &err);
        let report = FileReport::new("notes.txt", &result);

        assert_eq!(report.status, ReportStatus::Failed);
        assert_eq!(report.kind, Some(ErrorKind::UnsupportedFormat));
        assert_eq!(report.segments, 0);
        assert!(report.error.unwrap().contains("txt"));
    }

    #[test]
    fn test_file_report_converted_serializes_without_error() {
        let result = ConversionResult::converted(
            PathBuf::from("book.m4a"),
            PathBuf::from("book_segments"),
            vec![PathBuf::from("book_segments/segment_000.mp3")],
        );
        let json = serde_json::to_value(FileReport::new("book.m4a", &result)).unwrap();
        assert_eq!(json["status"], "converted");
        assert_eq!(json["segments"], 1);
        assert!(json.get("error").is_none());
    }
}
