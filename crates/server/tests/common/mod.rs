//! In-process test harness for the HTTP API.
//!
//! Builds the real router around a [`MockTranscoder`], so uploads are
//! "converted" without ffmpeg and every request can be inspected.

#![allow(dead_code)]

use std::io::{Cursor, Read};
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use segmenter_core::testing::MockTranscoder;
use segmenter_core::{Config, SegmentConverter};
use segmenter_server::{create_router, AppState};

const BOUNDARY: &str = "segmenter-test-boundary";

/// Router plus the mock behind it.
pub struct TestFixture {
    pub router: Router,
    pub state: Arc<AppState>,
    pub transcoder: Arc<MockTranscoder>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Bytes,
    /// Parsed JSON body, `Null` when the body is not JSON.
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: header::HeaderName) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Entry names of a zip response body, in archive order.
    pub fn zip_entries(&self) -> Vec<String> {
        let mut archive =
            zip::ZipArchive::new(Cursor::new(self.bytes.to_vec())).expect("Body is not a zip");
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    pub fn zip_entry_contents(&self, name: &str) -> String {
        let mut archive =
            zip::ZipArchive::new(Cursor::new(self.bytes.to_vec())).expect("Body is not a zip");
        let mut contents = String::new();
        archive
            .by_name(name)
            .expect("Missing zip entry")
            .read_to_string(&mut contents)
            .unwrap();
        contents
    }
}

/// One part of a multipart form.
pub enum Part<'a> {
    File { name: &'a str, contents: &'a [u8] },
    Text { name: &'a str, value: &'a str },
}

/// Upload part for the `file` field.
pub fn file(name: &str) -> Part<'_> {
    Part::File {
        name,
        contents: b"fake m4a data",
    }
}

pub fn segment_time(value: &str) -> Part<'_> {
    Part::Text {
        name: "segment_time",
        value,
    }
}

impl TestFixture {
    /// Mock writing two segments per upload.
    pub async fn new() -> Self {
        Self::with_transcoder(MockTranscoder::new().with_segment_count(2)).await
    }

    pub async fn with_transcoder(transcoder: MockTranscoder) -> Self {
        Self::with_config(Config::default(), transcoder).await
    }

    pub async fn with_config(config: Config, transcoder: MockTranscoder) -> Self {
        let transcoder = Arc::new(transcoder);
        let converter =
            SegmentConverter::new(transcoder.clone(), config.converter.segment_seconds);
        let state = Arc::new(AppState::with_converter(config, converter));
        state.check_transcoder().await;

        Self {
            router: create_router(state.clone()),
            state,
            transcoder,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// POST a multipart form built from `parts`.
    pub async fn post_form(&self, path: &str, parts: &[Part<'_>]) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File { name, contents } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
                         Content-Type: audio/mp4\r\n\r\n",
                        name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(contents);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}",
                        name, value
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
