//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex_lite::Regex;

use super::error::{ConverterError, ErrorKind};

/// Extension accepted as conversion input (compared case-insensitively).
pub const SUPPORTED_EXTENSION: &str = "m4a";

/// Suffix appended to the input stem to name the output directory.
pub const OUTPUT_DIR_SUFFIX: &str = "_segments";

/// Output pattern handed to ffmpeg's segment muxer.
pub const SEGMENT_PATTERN: &str = "segment_%03d.mp3";

/// Whether a path has the supported input extension.
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(SUPPORTED_EXTENSION))
        .unwrap_or(false)
}

/// Name of the segment at `index` (zero based), matching [`SEGMENT_PATTERN`].
pub fn segment_file_name(index: usize) -> String {
    format!("segment_{:03}.mp3", index)
}

/// Whether a file name was produced by the segment muxer.
pub fn is_segment_file_name(name: &str) -> bool {
    static SEGMENT_RE: OnceLock<Regex> = OnceLock::new();
    SEGMENT_RE
        .get_or_init(|| Regex::new(r"^segment_[0-9]{3,}\.mp3$").expect("valid segment regex"))
        .is_match(name)
}

/// Output directory for an input: `<stem>_segments` next to the file.
pub fn default_output_dir(input_path: &Path) -> Option<PathBuf> {
    let stem = input_path.file_stem()?.to_str()?;
    if stem.is_empty() {
        return None;
    }
    let parent = input_path.parent().unwrap_or_else(|| Path::new(""));
    Some(parent.join(format!("{}{}", stem, OUTPUT_DIR_SUFFIX)))
}

/// A single file-to-segments conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Source audio file.
    pub input_path: PathBuf,
    /// Directory that receives the segments.
    pub output_dir: PathBuf,
    /// Segment length in seconds (always > 0).
    pub segment_seconds: u32,
}

impl ConversionRequest {
    /// Builds a request whose output directory is derived from the input name.
    pub fn new(input_path: impl Into<PathBuf>, segment_seconds: u32) -> Result<Self, ConverterError> {
        if segment_seconds == 0 {
            return Err(ConverterError::invalid_configuration(
                "segment length must be greater than zero seconds",
            ));
        }

        let input_path = input_path.into();
        let output_dir = default_output_dir(&input_path).ok_or_else(|| {
            ConverterError::invalid_configuration(format!(
                "cannot derive an output directory name from {}",
                input_path.display()
            ))
        })?;

        Ok(Self {
            input_path,
            output_dir,
            segment_seconds,
        })
    }

    /// Overrides the derived output directory.
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Full ffmpeg output pattern inside the output directory.
    pub fn output_pattern(&self) -> PathBuf {
        self.output_dir.join(SEGMENT_PATTERN)
    }
}

/// Exit status and diagnostics of one transcoder run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeOutput {
    /// Process exit code, `None` if killed by a signal.
    pub status_code: Option<i32>,
    /// Captured stderr (lossy UTF-8).
    pub stderr: String,
}

impl TranscodeOutput {
    /// Whether the transcoder exited with status 0.
    pub fn success(&self) -> bool {
        self.status_code == Some(0)
    }
}

/// Outcome of converting one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionOutcome {
    /// Segments were written, listed in playback order.
    Converted {
        output_dir: PathBuf,
        segments: Vec<PathBuf>,
    },
    /// Conversion failed; nothing in the output should be treated as complete.
    Failed { kind: ErrorKind, message: String },
}

/// Result of converting one input file. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub input_path: PathBuf,
    #[serde(flatten)]
    pub outcome: ConversionOutcome,
}

impl ConversionResult {
    pub fn converted(input_path: PathBuf, output_dir: PathBuf, segments: Vec<PathBuf>) -> Self {
        Self {
            input_path,
            outcome: ConversionOutcome::Converted {
                output_dir,
                segments,
            },
        }
    }

    pub fn failed(input_path: PathBuf, error: &ConverterError) -> Self {
        Self {
            input_path,
            outcome: ConversionOutcome::Failed {
                kind: error.kind(),
                message: error.to_string(),
            },
        }
    }

    pub fn success(&self) -> bool {
        matches!(self.outcome, ConversionOutcome::Converted { .. })
    }

    /// Output directory on success, error message on failure.
    pub fn output_dir_or_error(&self) -> String {
        match &self.outcome {
            ConversionOutcome::Converted { output_dir, .. } => output_dir.display().to_string(),
            ConversionOutcome::Failed { message, .. } => message.clone(),
        }
    }

    /// Error kind, if the conversion failed.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.outcome {
            ConversionOutcome::Converted { .. } => None,
            ConversionOutcome::Failed { kind, .. } => Some(*kind),
        }
    }

    /// Segment files, empty on failure.
    pub fn segments(&self) -> &[PathBuf] {
        match &self.outcome {
            ConversionOutcome::Converted { segments, .. } => segments,
            ConversionOutcome::Failed { .. } => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_input() {
        assert!(is_supported_input(Path::new("book.m4a")));
        assert!(is_supported_input(Path::new("/audio/Book.M4A")));
        assert!(!is_supported_input(Path::new("notes.txt")));
        assert!(!is_supported_input(Path::new("book.m4a.part")));
        assert!(!is_supported_input(Path::new("m4a")));
    }

    #[test]
    fn test_segment_names_sort_in_playback_order() {
        let mut names: Vec<String> = (0..12).rev().map(segment_file_name).collect();
        names.sort();
        assert_eq!(names[0], "segment_000.mp3");
        assert_eq!(names[2], "segment_002.mp3");
        assert_eq!(names[11], "segment_011.mp3");
    }

    #[test]
    fn test_is_segment_file_name() {
        assert!(is_segment_file_name("segment_000.mp3"));
        assert!(is_segment_file_name("segment_1234.mp3"));
        assert!(!is_segment_file_name("segment_1.mp3"));
        assert!(!is_segment_file_name("cover.jpg"));
        assert!(!is_segment_file_name("my_segment_000.mp3"));
    }

    #[test]
    fn test_default_output_dir() {
        assert_eq!(
            default_output_dir(Path::new("/books/book.m4a")),
            Some(PathBuf::from("/books/book_segments"))
        );
        assert_eq!(
            default_output_dir(Path::new("book.m4a")),
            Some(PathBuf::from("book_segments"))
        );
    }

    #[test]
    fn test_request_rejects_zero_segment_length() {
        let err = ConversionRequest::new("/books/book.m4a", 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_request_output_pattern() {
        let request = ConversionRequest::new("/books/book.m4a", 300).unwrap();
        assert_eq!(request.output_dir, PathBuf::from("/books/book_segments"));
        assert_eq!(
            request.output_pattern(),
            PathBuf::from("/books/book_segments/segment_%03d.mp3")
        );

        let request = request.with_output_dir("/tmp/out");
        assert_eq!(request.output_pattern(), PathBuf::from("/tmp/out/segment_%03d.mp3"));
    }

    #[test]
    fn test_result_views() {
        let ok = ConversionResult::converted(
            PathBuf::from("a.m4a"),
            PathBuf::from("a_segments"),
            vec![PathBuf::from("a_segments/segment_000.mp3")],
        );
        assert!(ok.success());
        assert_eq!(ok.output_dir_or_error(), "a_segments");
        assert_eq!(ok.segments().len(), 1);
        assert!(ok.error_kind().is_none());

        let err = ConverterError::transcode_failed(Some(1), "mocked error");
        let failed = ConversionResult::failed(PathBuf::from("b.m4a"), &err);
        assert!(!failed.success());
        assert!(failed.output_dir_or_error().contains("mocked error"));
        assert_eq!(failed.error_kind(), Some(ErrorKind::TranscodeFailed));
        assert!(failed.segments().is_empty());
    }

    #[test]
    fn test_result_serialization() {
        let err = ConverterError::ExternalToolMissing {
            path: PathBuf::from("ffmpeg"),
        };
        let failed = ConversionResult::failed(PathBuf::from("b.m4a"), &err);
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "external_tool_missing");
        assert_eq!(json["input_path"], "b.m4a");
    }
}
