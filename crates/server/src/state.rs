use std::sync::atomic::{AtomicBool, Ordering};

use segmenter_core::{Config, SanitizedConfig, SegmentConverter};
use tracing::{error, info};

/// Shared application state
pub struct AppState {
    config: Config,
    converter: SegmentConverter,
    transcoder_available: AtomicBool,
}

impl AppState {
    /// State backed by the ffmpeg transcoder described in `config`.
    pub fn new(config: Config) -> Self {
        let converter = SegmentConverter::from_config(&config.converter);
        Self::with_converter(config, converter)
    }

    /// State around an explicit converter (used to inject mock transcoders).
    pub fn with_converter(config: Config, converter: SegmentConverter) -> Self {
        Self {
            config,
            converter,
            transcoder_available: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn converter(&self) -> &SegmentConverter {
        &self.converter
    }

    /// Probes the transcoder and records whether it can be used.
    pub async fn check_transcoder(&self) -> bool {
        let transcoder = self.converter.transcoder();
        let available = match transcoder.validate().await {
            Ok(()) => {
                info!(transcoder = transcoder.name(), "Transcoder available");
                true
            }
            Err(e) => {
                error!(transcoder = transcoder.name(), "Transcoder unavailable: {}", e);
                false
            }
        };
        self.set_transcoder_available(available);
        available
    }

    pub fn transcoder_available(&self) -> bool {
        self.transcoder_available.load(Ordering::Relaxed)
    }

    pub fn set_transcoder_available(&self, available: bool) {
        self.transcoder_available.store(available, Ordering::Relaxed);
    }
}
