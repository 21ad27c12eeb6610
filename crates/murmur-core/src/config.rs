use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MurmurError, Result};

/// Top-level configuration for the Murmur application.
///
/// Loaded from `~/.murmur/config.toml` by default. Each section corresponds
/// to one component of the dictation pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MurmurConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
}

impl MurmurConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MurmurConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| MurmurError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Audio capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Capture sample rate in Hz.
    pub sample_rate_hz: u32,
    /// Encoder bit rate in bits per second.
    pub bit_rate: u32,
    /// Directory where recording files are written before transcription.
    pub recordings_dir: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 16_000,
            bit_rate: 128_000,
            recordings_dir: "~/.murmur/recordings".to_string(),
        }
    }
}

/// Cloud speech gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Base URL of the transcription/enhancement gateway.
    pub api_endpoint: String,
    /// Bearer token for the gateway.
    pub api_key: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Recognition language tag (e.g. "en-US").
    pub language: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_endpoint: String::new(),
            api_key: String::new(),
            request_timeout_secs: 30,
            language: "en-US".to_string(),
        }
    }
}

impl SpeechConfig {
    /// Whether both endpoint and key are present.
    pub fn has_credentials(&self) -> bool {
        !self.api_endpoint.is_empty() && !self.api_key.is_empty()
    }
}

/// Screen corner the overlay surfaces anchor to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorCorner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    BottomCenter,
}

/// Overlay placement configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Which screen corner the surfaces anchor to.
    pub corner: AnchorCorner,
    /// Horizontal offset from the anchor corner in pixels.
    pub x_offset_px: i32,
    /// Vertical offset from the anchor corner in pixels.
    pub y_offset_px: i32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            corner: AnchorCorner::BottomCenter,
            x_offset_px: 0,
            y_offset_px: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MurmurConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.audio.sample_rate_hz, 16_000);
        assert_eq!(config.audio.bit_rate, 128_000);
        assert_eq!(config.speech.request_timeout_secs, 30);
        assert_eq!(config.speech.language, "en-US");
        assert_eq!(config.overlay.corner, AnchorCorner::BottomCenter);
        assert_eq!(config.overlay.y_offset_px, 200);
    }

    #[test]
    fn test_has_credentials() {
        let mut speech = SpeechConfig::default();
        assert!(!speech.has_credentials());
        speech.api_endpoint = "https://gw.example.com".to_string();
        assert!(!speech.has_credentials());
        speech.api_key = "secret".to_string();
        assert!(speech.has_credentials());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = MurmurConfig::default();
        config.general.log_level = "debug".to_string();
        config.speech.api_endpoint = "https://gw.example.com".to_string();
        config.overlay.corner = AnchorCorner::TopRight;
        config.save(&path).unwrap();

        let loaded = MurmurConfig::load(&path).unwrap();
        assert_eq!(loaded.general.log_level, "debug");
        assert_eq!(loaded.speech.api_endpoint, "https://gw.example.com");
        assert_eq!(loaded.overlay.corner, AnchorCorner::TopRight);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = MurmurConfig::load(Path::new("/nonexistent/murmur.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = MurmurConfig::load_or_default(Path::new("/nonexistent/murmur.toml"));
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_load_or_default_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is not [ valid toml").unwrap();

        let config = MurmurConfig::load_or_default(&path);
        assert_eq!(config.audio.sample_rate_hz, 16_000);
    }

    #[test]
    fn test_partial_config_uses_section_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general]\nlog_level = \"trace\"\n").unwrap();

        let config = MurmurConfig::load(&path).unwrap();
        assert_eq!(config.general.log_level, "trace");
        assert_eq!(config.audio.bit_rate, 128_000);
        assert_eq!(config.overlay.y_offset_px, 200);
    }

    #[test]
    fn test_anchor_corner_serde_kebab_case() {
        let toml = "[overlay]\ncorner = \"top-left\"\n";
        let config: MurmurConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.overlay.corner, AnchorCorner::TopLeft);
    }
}
