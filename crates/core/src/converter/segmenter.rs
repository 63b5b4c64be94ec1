//! Single-file conversion: validation, output directory handling and cleanup.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::ffmpeg::FfmpegTranscoder;
use super::traits::Transcoder;
use super::types::{is_segment_file_name, is_supported_input, ConversionRequest, ConversionResult};

/// Converts one audio file into fixed-length MP3 segments.
///
/// Every failure is folded into a [`ConversionResult`] by [`convert_file`];
/// nothing escapes to the caller. Segment files from a failed run are removed
/// so they are never mistaken for complete output.
///
/// [`convert_file`]: SegmentConverter::convert_file
#[derive(Clone)]
pub struct SegmentConverter {
    transcoder: Arc<dyn Transcoder>,
    segment_seconds: u32,
}

impl SegmentConverter {
    /// Creates a converter around an arbitrary transcoder.
    pub fn new(transcoder: Arc<dyn Transcoder>, segment_seconds: u32) -> Self {
        Self {
            transcoder,
            segment_seconds,
        }
    }

    /// Creates an ffmpeg-backed converter from configuration.
    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(
            Arc::new(FfmpegTranscoder::new(config.clone())),
            config.segment_seconds,
        )
    }

    /// Default segment length used by [`convert_file`](Self::convert_file).
    pub fn segment_seconds(&self) -> u32 {
        self.segment_seconds
    }

    pub fn transcoder(&self) -> &dyn Transcoder {
        self.transcoder.as_ref()
    }

    /// Converts `input` into `<stem>_segments` next to it, using the default length.
    pub async fn convert_file(&self, input: &Path) -> ConversionResult {
        self.convert_file_with(input, self.segment_seconds).await
    }

    /// Converts `input` into `<stem>_segments` next to it.
    pub async fn convert_file_with(&self, input: &Path, segment_seconds: u32) -> ConversionResult {
        let outcome = match ConversionRequest::new(input, segment_seconds) {
            Ok(request) => self.try_convert(&request).await.map(|s| (request.output_dir, s)),
            Err(e) => Err(e),
        };
        Self::into_result(input, outcome)
    }

    /// Converts `input` into an explicit output directory.
    pub async fn convert_into(
        &self,
        input: &Path,
        output_dir: &Path,
        segment_seconds: u32,
    ) -> ConversionResult {
        let outcome = match ConversionRequest::new(input, segment_seconds) {
            Ok(request) => {
                let request = request.with_output_dir(output_dir);
                self.try_convert(&request).await.map(|s| (request.output_dir, s))
            }
            Err(e) => Err(e),
        };
        Self::into_result(input, outcome)
    }

    fn into_result(
        input: &Path,
        outcome: Result<(PathBuf, Vec<PathBuf>), ConverterError>,
    ) -> ConversionResult {
        match outcome {
            Ok((output_dir, segments)) => {
                ConversionResult::converted(input.to_path_buf(), output_dir, segments)
            }
            Err(e) => {
                error!(input = %input.display(), kind = %e.kind(), "Conversion failed: {}", e);
                ConversionResult::failed(input.to_path_buf(), &e)
            }
        }
    }

    /// Runs one request, returning the segments in playback order.
    pub async fn try_convert(
        &self,
        request: &ConversionRequest,
    ) -> Result<Vec<PathBuf>, ConverterError> {
        if request.segment_seconds == 0 {
            return Err(ConverterError::invalid_configuration(
                "segment length must be greater than zero seconds",
            ));
        }

        check_input(&request.input_path).await?;

        let created = prepare_output_dir(&request.output_dir).await?;

        info!(
            input = %request.input_path.display(),
            output_dir = %request.output_dir.display(),
            segment_seconds = request.segment_seconds,
            transcoder = self.transcoder.name(),
            "Processing file"
        );
        let start = Instant::now();

        let result = self.run_transcoder(request).await;
        match result {
            Ok(segments) => {
                info!(
                    input = %request.input_path.display(),
                    segments = segments.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Converted to MP3 segments"
                );
                Ok(segments)
            }
            Err(e) => {
                cleanup_output(&request.output_dir, created).await;
                Err(e)
            }
        }
    }

    async fn run_transcoder(
        &self,
        request: &ConversionRequest,
    ) -> Result<Vec<PathBuf>, ConverterError> {
        let output = self.transcoder.transcode(request).await?;
        if !output.success() {
            return Err(ConverterError::transcode_failed(
                output.status_code,
                &output.stderr,
            ));
        }

        let segments = list_segments(&request.output_dir).await?;
        if segments.is_empty() {
            return Err(ConverterError::transcode_failed(
                output.status_code,
                "transcoder exited successfully but produced no segments",
            ));
        }

        Ok(segments)
    }
}

async fn check_input(input: &Path) -> Result<(), ConverterError> {
    let metadata = match tokio::fs::metadata(input).await {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ConverterError::InputNotFound {
                path: input.to_path_buf(),
            })
        }
        Err(e) => return Err(ConverterError::Io(e)),
    };

    if !metadata.is_file() {
        return Err(ConverterError::InputNotFound {
            path: input.to_path_buf(),
        });
    }

    if !is_supported_input(input) {
        return Err(ConverterError::UnsupportedFormat {
            path: input.to_path_buf(),
            extension: input
                .extension()
                .map(|e| e.to_string_lossy().to_string())
                .unwrap_or_default(),
        });
    }

    Ok(())
}

/// Creates the output directory, or clears stale segments from an earlier run.
///
/// Returns whether the directory was created by this call.
async fn prepare_output_dir(output_dir: &Path) -> Result<bool, ConverterError> {
    let existed = tokio::fs::try_exists(output_dir).await.unwrap_or(false);

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|source| ConverterError::OutputDirectory {
            path: output_dir.to_path_buf(),
            source,
        })?;

    if existed {
        let stale = list_segments(output_dir).await?;
        if !stale.is_empty() {
            debug!(
                output_dir = %output_dir.display(),
                count = stale.len(),
                "Removing segments from a previous run"
            );
        }
        for path in stale {
            tokio::fs::remove_file(&path).await?;
        }
    }

    Ok(!existed)
}

/// Segment files in `dir`, sorted into playback order.
pub async fn list_segments(dir: &Path) -> Result<Vec<PathBuf>, ConverterError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut segments = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let is_segment = entry
            .file_name()
            .to_str()
            .map(is_segment_file_name)
            .unwrap_or(false);
        if is_segment && entry.file_type().await?.is_file() {
            segments.push(entry.path());
        }
    }

    // Numeric order: segment_1000 plays after segment_999
    segments.sort_by_key(|path| {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.strip_prefix("segment_"))
            .and_then(|index| index.parse::<u64>().ok())
            .unwrap_or(u64::MAX)
    });
    Ok(segments)
}

/// Removes partial segments; drops the directory too if this run created it.
async fn cleanup_output(output_dir: &Path, created: bool) {
    match list_segments(output_dir).await {
        Ok(partial) => {
            for path in partial {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    warn!(path = %path.display(), "Failed to remove partial segment: {}", e);
                }
            }
        }
        Err(e) => {
            warn!(output_dir = %output_dir.display(), "Failed to list partial output: {}", e);
        }
    }

    if created {
        // Fails harmlessly if something else was written there meanwhile
        if let Err(e) = tokio::fs::remove_dir(output_dir).await {
            debug!(output_dir = %output_dir.display(), "Output directory kept: {}", e);
        }
    }
}
