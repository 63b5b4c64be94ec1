use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::converter::ConverterConfig;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Web server configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted upload request in megabytes.
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

impl ServerConfig {
    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.max_upload_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    7860
}

fn default_max_upload_mb() -> u64 {
    1024
}

/// Config as exposed over the API (local paths reduced to file names)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub converter: SanitizedConverterConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConverterConfig {
    pub ffmpeg: String,
    pub segment_seconds: u32,
    pub mp3_encoder: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate_kbps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let converter = &config.converter;
        Self {
            converter: SanitizedConverterConfig {
                ffmpeg: converter
                    .ffmpeg_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "ffmpeg".to_string()),
                segment_seconds: converter.segment_seconds,
                mp3_encoder: converter.mp3_encoder.clone(),
                bitrate_kbps: converter.bitrate_kbps,
                timeout_secs: converter.timeout_secs,
            },
            server: config.server.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.server.port, 7860);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.converter.segment_seconds, 300);
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[converter]
ffmpeg_path = "/usr/local/bin/ffmpeg"
segment_seconds = 180
bitrate_kbps = 96
timeout_secs = 900
extra_ffmpeg_args = ["-ac", "1"]

[server]
host = "127.0.0.1"
port = 9000
max_upload_mb = 256
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.converter.ffmpeg_path,
            PathBuf::from("/usr/local/bin/ffmpeg")
        );
        assert_eq!(config.converter.segment_seconds, 180);
        assert_eq!(config.converter.bitrate_kbps, Some(96));
        assert_eq!(config.converter.timeout_secs, Some(900));
        assert_eq!(config.converter.extra_ffmpeg_args, vec!["-ac", "1"]);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.max_upload_bytes(), 256 * 1024 * 1024);
    }

    #[test]
    fn test_deserialize_rejects_negative_segment_time() {
        let result: Result<Config, _> = toml::from_str("[converter]\nsegment_seconds = -5\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_sanitized_config_hides_paths() {
        let mut config = Config::default();
        config.converter.ffmpeg_path = PathBuf::from("/home/alice/bin/ffmpeg");
        let sanitized = SanitizedConfig::from(&config);
        assert_eq!(sanitized.converter.ffmpeg, "ffmpeg");
        assert_eq!(sanitized.converter.segment_seconds, 300);
        assert_eq!(sanitized.server.port, 7860);
    }
}
