//! Error types for the converter module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Maximum number of stderr bytes carried into an error message.
const STDERR_TAIL_BYTES: usize = 2048;

/// Errors that can occur while converting a file into segments.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// Input file (or directory) does not exist.
    #[error("Input not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Input file extension is not a supported format.
    #[error("Unsupported input format '{extension}' for {path}, expected an .m4a file")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// Transcoder binary could not be found.
    #[error("Transcoder not found: '{path}' is not installed or not on PATH")]
    ExternalToolMissing { path: PathBuf },

    /// Transcoder exists but has no MP3 encoder compiled in.
    #[error("Transcoder at '{path}' has no MP3 encoder available")]
    EncoderUnavailable { path: PathBuf },

    /// Transcoder exited with a non-zero status.
    #[error("Transcoding failed ({}): {stderr}", describe_status(.status))]
    TranscodeFailed { status: Option<i32>, stderr: String },

    /// Transcoding exceeded the configured timeout and was killed.
    #[error("Transcoding timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Invalid settings, such as a zero segment length.
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// Output directory could not be prepared.
    #[error("Failed to prepare output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl ConverterError {
    /// Creates a transcode failure, keeping only the tail of a long stderr.
    pub fn transcode_failed(status: Option<i32>, stderr: &str) -> Self {
        Self::TranscodeFailed {
            status,
            stderr: stderr_tail(stderr),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// The category this error is reported under.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputNotFound { .. } => ErrorKind::InputNotFound,
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::ExternalToolMissing { .. } | Self::EncoderUnavailable { .. } => {
                ErrorKind::ExternalToolMissing
            }
            Self::TranscodeFailed { .. } | Self::Timeout { .. } => ErrorKind::TranscodeFailed,
            Self::InvalidConfiguration { .. } => ErrorKind::InvalidConfiguration,
            Self::OutputDirectory { .. } | Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// Error categories surfaced to callers and serialized in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InputNotFound,
    UnsupportedFormat,
    ExternalToolMissing,
    TranscodeFailed,
    InvalidConfiguration,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InputNotFound => "input_not_found",
            Self::UnsupportedFormat => "unsupported_format",
            Self::ExternalToolMissing => "external_tool_missing",
            Self::TranscodeFailed => "transcode_failed",
            Self::InvalidConfiguration => "invalid_configuration",
            Self::Io => "io",
        };
        f.write_str(name)
    }
}

/// Trims stderr to its last lines so error messages stay readable.
fn stderr_tail(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.len() <= STDERR_TAIL_BYTES {
        return trimmed.to_string();
    }

    let mut start = trimmed.len() - STDERR_TAIL_BYTES;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    // Prefer cutting at a line boundary
    let tail = &trimmed[start..];
    let tail = tail.find('\n').map(|i| &tail[i + 1..]).unwrap_or(tail);
    format!("...\n{}", tail)
}
