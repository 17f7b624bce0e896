//! Capture tuning parameters.
//!
//! The settle and auto-trigger delays are empirical, so they are carried as
//! configuration rather than literals. Defaults match the behavior of the
//! portfolio page this component was built for.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::export::validate_file_name;

/// Default wait after a seek completes before rasterizing
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 100;

/// Default wait after metadata loads before the automatic capture
pub const DEFAULT_AUTO_DELAY_MS: u64 = 500;

/// Default JPEG quality factor
pub const DEFAULT_QUALITY: f32 = 0.95;

/// Default name of the exported file
pub const DEFAULT_FILE_NAME: &str = "video-thumbnail.jpg";

/// Tuning for a `ThumbnailCapture`.
///
/// # Example TOML
///
/// ```toml
/// [capture]
/// settle_delay_ms = 100
/// auto_delay_ms = 500
/// quality = 0.95
/// file_name = "video-thumbnail.jpg"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Delay between seek completion and rasterization, in milliseconds
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Delay between metadata load and the automatic capture, in milliseconds
    #[serde(default = "default_auto_delay_ms")]
    pub auto_delay_ms: u64,

    /// JPEG quality in (0, 1]
    #[serde(default = "default_quality")]
    pub quality: f32,

    /// Exported file name
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}

fn default_auto_delay_ms() -> u64 {
    DEFAULT_AUTO_DELAY_MS
}

fn default_quality() -> f32 {
    DEFAULT_QUALITY
}

fn default_file_name() -> String {
    DEFAULT_FILE_NAME.to_string()
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            auto_delay_ms: default_auto_delay_ms(),
            quality: default_quality(),
            file_name: default_file_name(),
        }
    }
}

impl CaptureConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn auto_delay(&self) -> Duration {
        Duration::from_millis(self.auto_delay_ms)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "quality must be in (0, 1], got {}",
                self.quality
            )));
        }

        validate_file_name(&self.file_name)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(())
    }
}
