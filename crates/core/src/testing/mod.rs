//! Testing utilities and mock implementations.
//!
//! This module provides a scripted [`Transcoder`](crate::converter::Transcoder)
//! so conversion and batch logic can be tested without ffmpeg installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use segmenter_core::testing::{fixtures, MockTranscoder};
//!
//! let dir = tempfile::tempdir()?;
//! fixtures::write_files(dir.path(), &["a.m4a", "b.m4a", "notes.txt"]);
//!
//! let mock = Arc::new(MockTranscoder::new().fail_on("b.m4a", 1, "corrupt"));
//! // Use in SegmentConverter / DirectoryWalker / AppState...
//! ```

mod mock_transcoder;

pub use mock_transcoder::MockTranscoder;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    /// Create placeholder files with the given names inside `dir`.
    pub fn write_files(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).expect("Failed to create fixture dir");
                }
                std::fs::write(&path, b"dummy content").expect("Failed to write fixture");
                path
            })
            .collect()
    }

    /// Whether an `ffmpeg` binary can be executed, for tests that need the real tool.
    pub fn ffmpeg_available() -> bool {
        std::process::Command::new("ffmpeg")
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Generate a sine-tone M4A of `seconds` length with the real ffmpeg.
    pub fn generate_tone_m4a(path: &Path, seconds: u32) -> bool {
        std::process::Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-y", "-f", "lavfi", "-i"])
            .arg(format!("sine=frequency=440:duration={}", seconds))
            .args(["-c:a", "aac"])
            .arg(path)
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Container duration in seconds as reported by `ffprobe`, `None` when it can't be read.
    pub fn media_duration(path: &Path) -> Option<f64> {
        let output = std::process::Command::new("ffprobe")
            .args(["-v", "error", "-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(path)
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        String::from_utf8_lossy(&output.stdout).trim().parse().ok()
    }
}
