//! Trait definitions for the converter module.

use async_trait::async_trait;

use super::error::ConverterError;
use super::types::{ConversionRequest, TranscodeOutput};

/// An external tool that decodes one input and writes MP3 segments.
///
/// Implementations only run the tool. Validating the request, preparing the
/// output directory and interpreting the exit status is left to
/// [`SegmentConverter`](super::SegmentConverter).
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Transcodes and splits `request.input_path` into `request.output_dir`.
    ///
    /// A non-zero exit is reported through [`TranscodeOutput`], not as an
    /// error. Errors are reserved for failing to run the tool at all.
    async fn transcode(&self, request: &ConversionRequest)
        -> Result<TranscodeOutput, ConverterError>;

    /// Checks that the tool is installed and able to encode MP3.
    async fn validate(&self) -> Result<(), ConverterError>;
}
