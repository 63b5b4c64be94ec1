use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Segment length is positive
/// - At least one conversion may run at a time
/// - A configured timeout is not 0
/// - Server port is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let converter = &config.converter;

    if converter.segment_seconds == 0 {
        return Err(ConfigError::ValidationError(
            "converter.segment_seconds must be greater than 0".to_string(),
        ));
    }

    if converter.max_parallel_conversions == 0 {
        return Err(ConfigError::ValidationError(
            "converter.max_parallel_conversions must be at least 1".to_string(),
        ));
    }

    if converter.timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "converter.timeout_secs cannot be 0 (omit it to disable the timeout)".to_string(),
        ));
    }

    if converter.mp3_encoder.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "converter.mp3_encoder cannot be empty".to_string(),
        ));
    }

    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    Ok(())
}
