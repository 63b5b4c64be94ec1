//! Configuration for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default segment length: five minutes.
pub const DEFAULT_SEGMENT_SECONDS: u32 = 300;

/// Configuration for segment conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Length of each segment in seconds.
    #[serde(default = "default_segment_seconds")]
    pub segment_seconds: u32,

    /// MP3 encoder passed to `-c:a`.
    #[serde(default = "default_mp3_encoder")]
    pub mp3_encoder: String,

    /// Target bitrate. Encoder default when unset.
    #[serde(default)]
    pub bitrate_kbps: Option<u32>,

    /// Timeout for a single file in seconds. No timeout when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,

    /// Additional ffmpeg arguments inserted before the output pattern.
    #[serde(default)]
    pub extra_ffmpeg_args: Vec<String>,

    /// Files converted concurrently during a directory walk.
    #[serde(default = "default_max_parallel")]
    pub max_parallel_conversions: usize,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_segment_seconds() -> u32 {
    DEFAULT_SEGMENT_SECONDS
}

fn default_mp3_encoder() -> String {
    "libmp3lame".to_string()
}

fn default_log_level() -> String {
    "error".to_string()
}

fn default_max_parallel() -> usize {
    1
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            segment_seconds: default_segment_seconds(),
            mp3_encoder: default_mp3_encoder(),
            bitrate_kbps: None,
            timeout_secs: None,
            ffmpeg_log_level: default_log_level(),
            extra_ffmpeg_args: Vec::new(),
            max_parallel_conversions: default_max_parallel(),
        }
    }
}

impl ConverterConfig {
    /// Creates a config pointing at a specific ffmpeg binary.
    pub fn with_ffmpeg_path(ffmpeg_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ..Default::default()
        }
    }

    /// Sets the segment length in seconds.
    pub fn with_segment_seconds(mut self, segment_seconds: u32) -> Self {
        self.segment_seconds = segment_seconds;
        self
    }

    /// Sets the per-file timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Sets the maximum parallel conversions for directory walks.
    pub fn with_max_parallel(mut self, max: usize) -> Self {
        self.max_parallel_conversions = max;
        self
    }
}
