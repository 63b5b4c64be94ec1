pub mod batch;
pub mod config;
pub mod converter;
pub mod testing;

pub use batch::{BatchResult, DirectoryWalker};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, SanitizedConfig, ServerConfig,
};
pub use converter::{
    ConversionOutcome, ConversionRequest, ConversionResult, ConverterConfig, ConverterError,
    EncoderCapabilities, ErrorKind, FfmpegTranscoder, SegmentConverter, TranscodeOutput,
    Transcoder, DEFAULT_SEGMENT_SECONDS,
};
