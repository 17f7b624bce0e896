//! Configuration management for posterframe
//!
//! This module handles loading, saving, and validating configuration for the
//! posterframe CLI. Configuration is stored in TOML format.
//!
//! # Configuration File Locations
//!
//! - Linux: `~/.config/posterframe/config.toml`
//! - macOS: `~/Library/Application Support/io.posterframe.posterframe/config.toml`
//! - Windows: `%APPDATA%\posterframe\posterframe\config\config.toml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pf_core::{CaptureConfig, FfmpegTools};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// posterframe configuration
///
/// # Example TOML
///
/// ```toml
/// [capture]
/// settle_delay_ms = 100
/// auto_delay_ms = 500
/// quality = 0.95
/// file_name = "video-thumbnail.jpg"
///
/// [ffmpeg]
/// ffmpeg = "ffmpeg"
/// ffprobe = "ffprobe"
///
/// [output]
/// format = "table"  # "table" | "json" | "quiet"
/// verbose = false
///
/// [logging]
/// level = "warn"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Capture tuning
    #[serde(default)]
    pub capture: CaptureConfig,

    /// ffmpeg tool locations
    #[serde(default)]
    pub ffmpeg: FfmpegTools,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format: "table", "json", "quiet"
    #[serde(default = "default_format")]
    pub format: String,

    /// Verbose output
    #[serde(default)]
    pub verbose: bool,
}

fn default_format() -> String {
    "table".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            verbose: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from custom path or default
    pub fn load_from(custom_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = custom_path {
            Self::load(path)
        } else {
            Self::load_default()
        }
    }

    /// Get default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("io", "posterframe", "posterframe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        // Validate output format
        let valid_formats = ["table", "json", "quiet"];
        if !valid_formats.contains(&self.output.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid output format '{}'. Valid values: {:?}",
                self.output.format, valid_formats
            )));
        }

        // Validate log level
        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level '{}'. Valid values: {:?}",
                self.logging.level, valid_levels
            )));
        }

        if self.ffmpeg.ffmpeg.as_os_str().is_empty() || self.ffmpeg.ffprobe.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "ffmpeg and ffprobe program paths must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Generate a sample configuration file content
    pub fn sample_toml() -> &'static str {
        r#"# posterframe configuration

[capture]
# Wait after a seek completes before grabbing the frame, in milliseconds
settle_delay_ms = 100
# Wait after metadata loads before the automatic capture, in milliseconds
auto_delay_ms = 500
# JPEG quality in (0, 1]
quality = 0.95
# Name of the exported file
file_name = "video-thumbnail.jpg"

[ffmpeg]
# Program names or full paths
ffmpeg = "ffmpeg"
ffprobe = "ffprobe"

[output]
# Output format: "table", "json", "quiet"
format = "table"
# Enable verbose output
verbose = false

[logging]
# Log level: "error", "warn", "info", "debug", "trace"
level = "warn"
"#
    }
}

/// CLI configuration overrides
///
/// Command-line arguments take precedence over config file values.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Output format override
    pub output_format: Option<String>,
    /// Verbose flag override
    pub verbose: Option<bool>,
    /// Debug flag override
    pub debug: Option<bool>,
    /// JPEG quality override
    pub quality: Option<f32>,
    /// Settle delay override
    pub settle_delay_ms: Option<u64>,
    /// Auto-trigger delay override
    pub auto_delay_ms: Option<u64>,
    /// Export file name override
    pub file_name: Option<String>,
}

impl Config {
    /// Apply CLI overrides to configuration
    pub fn with_overrides(mut self, overrides: &CliOverrides) -> Self {
        if let Some(ref format) = overrides.output_format {
            self.output.format = format.clone();
        }
        if let Some(verbose) = overrides.verbose {
            self.output.verbose = verbose;
        }
        if let Some(debug) = overrides.debug {
            if debug {
                self.logging.level = "debug".to_string();
            }
        }
        if let Some(quality) = overrides.quality {
            self.capture.quality = quality;
        }
        if let Some(ms) = overrides.settle_delay_ms {
            self.capture.settle_delay_ms = ms;
        }
        if let Some(ms) = overrides.auto_delay_ms {
            self.capture.auto_delay_ms = ms;
        }
        if let Some(ref name) = overrides.file_name {
            if !name.is_empty() {
                self.capture.file_name = name.clone();
            }
        }
        self
    }
}
