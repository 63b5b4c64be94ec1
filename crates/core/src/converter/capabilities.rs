//! MP3 encoder capability detection.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::error::ConverterError;

/// MP3 encoders detected in an ffmpeg build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderCapabilities {
    /// LAME (the usual `-c:a mp3` encoder)
    pub libmp3lame: bool,
    /// Shine fixed-point encoder
    pub libshine: bool,
    /// Windows Media Foundation encoder
    pub mp3_mf: bool,
}

impl EncoderCapabilities {
    /// Detect available MP3 encoders by listing ffmpeg's encoders.
    pub async fn detect(ffmpeg_path: &Path) -> Result<Self, ConverterError> {
        let output = Command::new(ffmpeg_path)
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::ExternalToolMissing {
                        path: ffmpeg_path.to_path_buf(),
                    }
                } else {
                    ConverterError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ConverterError::transcode_failed(
                output.status.code(),
                "ffmpeg -encoders failed",
            ));
        }

        Ok(Self::parse(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Parses the table printed by `ffmpeg -encoders`.
    fn parse(listing: &str) -> Self {
        // Rows look like " A....D libmp3lame   libmp3lame MP3 (MPEG audio layer 3)"
        let names: Vec<&str> = listing
            .lines()
            .filter_map(|line| {
                let mut cols = line.split_whitespace();
                let flags = cols.next()?;
                if flags.starts_with('A') && flags.len() == 6 {
                    cols.next()
                } else {
                    None
                }
            })
            .collect();

        Self {
            libmp3lame: names.contains(&"libmp3lame"),
            libshine: names.contains(&"libshine"),
            mp3_mf: names.contains(&"mp3_mf"),
        }
    }

    /// Best available MP3 encoder, LAME first.
    pub fn preferred_mp3_encoder(&self) -> Option<&'static str> {
        if self.libmp3lame {
            Some("libmp3lame")
        } else if self.libshine {
            Some("libshine")
        } else if self.mp3_mf {
            Some("mp3_mf")
        } else {
            None
        }
    }

    /// Whether the named encoder is present. Unknown names are assumed present.
    pub fn supports(&self, encoder: &str) -> bool {
        match encoder {
            "libmp3lame" => self.libmp3lame,
            "libshine" => self.libshine,
            "mp3_mf" => self.mp3_mf,
            "mp3" => self.has_mp3_encoder(),
            _ => true,
        }
    }

    /// Encoder to use for `configured`: itself when present, otherwise the
    /// preferred one. `None` when this build has no MP3 encoder at all.
    pub fn resolve(&self, configured: &str) -> Option<String> {
        if self.supports(configured) {
            Some(configured.to_string())
        } else {
            self.preferred_mp3_encoder().map(str::to_string)
        }
    }

    /// Check if any MP3 encoder is available.
    pub fn has_mp3_encoder(&self) -> bool {
        self.libmp3lame || self.libshine || self.mp3_mf
    }
}
