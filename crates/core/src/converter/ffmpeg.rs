//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::RwLock;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use super::capabilities::EncoderCapabilities;
use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Transcoder;
use super::types::{ConversionRequest, TranscodeOutput};

/// Runs ffmpeg's segment muxer as a subprocess.
pub struct FfmpegTranscoder {
    config: ConverterConfig,
    /// Encoder passed to `-c:a`; replaced by `validate` when the configured one is missing.
    encoder: RwLock<String>,
}

impl FfmpegTranscoder {
    /// Creates a new FFmpeg transcoder with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        let encoder = RwLock::new(config.mp3_encoder.clone());
        Self { config, encoder }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    /// Encoder currently used for `-c:a`.
    pub async fn encoder(&self) -> String {
        self.encoder.read().await.clone()
    }

    async fn args_for(&self, request: &ConversionRequest) -> Vec<String> {
        let encoder = self.encoder.read().await;
        self.build_args(request, &encoder)
    }

    /// Builds ffmpeg arguments for converting and splitting one file.
    fn build_args(&self, request: &ConversionRequest, encoder: &str) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-y".to_string(), // Overwrite segments of a previous run
            "-i".to_string(),
            request.input_path.to_string_lossy().to_string(),
            // Audio only; audiobooks often carry cover art as a video stream
            "-vn".to_string(),
            "-map".to_string(),
            "0:a".to_string(),
            "-c:a".to_string(),
            encoder.to_string(),
        ];

        if let Some(bitrate) = self.config.bitrate_kbps {
            args.extend(["-b:a".to_string(), format!("{}k", bitrate)]);
        }

        args.extend([
            "-f".to_string(),
            "segment".to_string(),
            "-segment_time".to_string(),
            request.segment_seconds.to_string(),
            "-reset_timestamps".to_string(),
            "1".to_string(),
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ]);

        args.extend(self.config.extra_ffmpeg_args.iter().cloned());

        args.push(request.output_pattern().to_string_lossy().to_string());

        args
    }

    fn spawn_error(&self, e: std::io::Error) -> ConverterError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConverterError::ExternalToolMissing {
                path: self.config.ffmpeg_path.clone(),
            }
        } else {
            ConverterError::Io(e)
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn transcode(
        &self,
        request: &ConversionRequest,
    ) -> Result<TranscodeOutput, ConverterError> {
        let args = self.args_for(request).await;
        debug!(
            ffmpeg = %self.config.ffmpeg_path.display(),
            args = ?args,
            "Spawning ffmpeg"
        );

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        // Drain stderr concurrently with wait()
        let mut stderr = child.stderr.take().ok_or_else(|| {
            ConverterError::Io(std::io::Error::other("ffmpeg stderr was not captured"))
        })?;
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf).await.map(|_| buf)
        });

        let status = match self.config.timeout_secs {
            Some(timeout_secs) => {
                match timeout(Duration::from_secs(timeout_secs), child.wait()).await {
                    Ok(status) => status?,
                    Err(_) => {
                        let _ = child.kill().await;
                        stderr_task.abort();
                        return Err(ConverterError::Timeout { timeout_secs });
                    }
                }
            }
            None => child.wait().await?,
        };

        let stderr = match stderr_task.await {
            Ok(Ok(buf)) => String::from_utf8_lossy(&buf).into_owned(),
            _ => String::new(),
        };

        Ok(TranscodeOutput {
            status_code: status.code(),
            stderr,
        })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        let capabilities = EncoderCapabilities::detect(&self.config.ffmpeg_path).await?;

        let encoder = capabilities
            .resolve(&self.config.mp3_encoder)
            .ok_or_else(|| ConverterError::EncoderUnavailable {
                path: self.config.ffmpeg_path.clone(),
            })?;

        if encoder != self.config.mp3_encoder {
            warn!(
                configured = %self.config.mp3_encoder,
                using = %encoder,
                "Configured MP3 encoder not in this ffmpeg build, falling back"
            );
        }
        *self.encoder.write().await = encoder;

        Ok(())
    }
}
