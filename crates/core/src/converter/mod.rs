//! Converter module for splitting audio files into MP3 segments.
//!
//! This module provides the [`SegmentConverter`], which validates a request,
//! prepares the output directory, runs a [`Transcoder`] and turns the outcome
//! into a [`ConversionResult`]. The production transcoder is
//! [`FfmpegTranscoder`], which drives ffmpeg's segment muxer.
//!
//! # Features
//!
//! - M4A input, MP3 output split into fixed-length segments
//! - Zero-padded segment names (`segment_000.mp3`, ...) in playback order
//! - Cleanup of partial output on failure
//! - Optional per-file timeout
//! - MP3 encoder detection
//!
//! # Example
//!
//! ```ignore
//! use segmenter_core::converter::{ConverterConfig, SegmentConverter};
//!
//! let converter = SegmentConverter::from_config(&ConverterConfig::default());
//!
//! // Validate ffmpeg is available
//! converter.transcoder().validate().await?;
//!
//! let result = converter.convert_file(Path::new("/books/book.m4a")).await;
//! if result.success() {
//!     println!("{} segments in {}", result.segments().len(), result.output_dir_or_error());
//! }
//! ```

mod capabilities;
mod config;
mod error;
mod ffmpeg;
mod segmenter;
mod traits;
mod types;

pub use capabilities::EncoderCapabilities;
pub use config::{ConverterConfig, DEFAULT_SEGMENT_SECONDS};
pub use error::{ConverterError, ErrorKind};
pub use ffmpeg::FfmpegTranscoder;
pub use segmenter::{list_segments, SegmentConverter};
pub use traits::Transcoder;
pub use types::{
    default_output_dir, is_segment_file_name, is_supported_input, segment_file_name,
    ConversionOutcome, ConversionRequest, ConversionResult, TranscodeOutput, OUTPUT_DIR_SUFFIX,
    SEGMENT_PATTERN, SUPPORTED_EXTENSION,
};
