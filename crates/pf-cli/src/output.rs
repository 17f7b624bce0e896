//! Output formatting for CLI results
//!
//! This module provides consistent output formatting across all CLI commands.
//! It supports three output formats:
//! - Table: Human-readable tables (default)
//! - JSON: Structured JSON for scripting and automation
//! - Quiet: Minimal output, exit codes only

use std::path::Path;
use std::str::FromStr;

use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

use pf_core::{CaptureOutcome, Controls, ExportReceipt, VideoMetadata};

use crate::config::Config;
use crate::ExitCode;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for scripting
    Json,
    /// Minimal output - exit codes only
    Quiet,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "quiet" => Ok(Self::Quiet),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::Quiet => write!(f, "quiet"),
        }
    }
}

/// Standard JSON response wrapper for consistent schema
#[derive(Serialize)]
pub struct JsonResponse<T: Serialize> {
    /// Whether the operation was successful
    pub success: bool,
    /// The response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// ISO 8601 timestamp
    pub timestamp: String,
    /// Command that was executed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl<T: Serialize> JsonResponse<T> {
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            command: None,
        }
    }

    /// Create a successful response with command context
    pub fn success_with_command(data: T, command: &str) -> Self {
        Self {
            command: Some(command.to_string()),
            ..Self::success(data)
        }
    }
}

impl JsonResponse<()> {
    /// Create an error response
    pub fn error(message: &str) -> JsonResponse<()> {
        JsonResponse {
            success: false,
            data: None,
            error: Some(message.to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            command: None,
        }
    }
}

/// Formats output for different modes
pub struct OutputFormatter {
    format: OutputFormat,
    verbose: bool,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Get the current output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.format == OutputFormat::Quiet
    }

    /// Format the result of a capture run
    pub fn format_capture(&self, capture: &CaptureOutput) -> String {
        match self.format {
            OutputFormat::Table => self.capture_table(capture),
            OutputFormat::Json => self.to_json_response(capture, "capture"),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format probed video metadata
    pub fn format_probe(&self, probe: &ProbeOutput) -> String {
        match self.format {
            OutputFormat::Table => self.probe_table(probe),
            OutputFormat::Json => self.to_json_response(probe, "probe"),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format the effective configuration
    pub fn format_config(&self, config: &Config, path: Option<&Path>) -> String {
        match self.format {
            OutputFormat::Table => self.config_table(config, path),
            OutputFormat::Json => self.to_json_response(
                &ConfigOutput {
                    path: path.map(|p| p.display().to_string()),
                    config,
                },
                "config show",
            ),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format a generic success result
    pub fn format_success<T: Serialize>(&self, data: &T, command: &str) -> String {
        match self.format {
            OutputFormat::Table => String::new(), // Table format handles success differently
            OutputFormat::Json => self.to_json_response(data, command),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format error with exit code context
    pub fn format_error_with_code(&self, error: &dyn std::fmt::Display, code: ExitCode) -> String {
        match self.format {
            OutputFormat::Table => format!("Error: {error}"),
            OutputFormat::Json => {
                let response = JsonResponse::<()>::error(&error.to_string());
                let mut output = match serde_json::to_value(&response) {
                    Ok(value) => value,
                    Err(e) => return format!("{{\"error\": \"{e}\"}}"),
                };
                output["exit_code"] = serde_json::json!(code as i32);
                output["exit_code_name"] = serde_json::json!(code.name());
                self.to_json(&output)
            }
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Where error reports go: JSON envelopes on stdout next to the other
    /// JSON output, human-readable text on stderr, nothing when quiet
    pub fn error_target(&self) -> Option<ErrorTarget> {
        match self.format {
            OutputFormat::Table => Some(ErrorTarget::Stderr),
            OutputFormat::Json => Some(ErrorTarget::Stdout),
            OutputFormat::Quiet => None,
        }
    }

    /// Print an error with its exit code
    pub fn report_error(&self, error: &dyn std::fmt::Display, code: ExitCode) {
        match self.error_target() {
            Some(ErrorTarget::Stdout) => println!("{}", self.format_error_with_code(error, code)),
            Some(ErrorTarget::Stderr) => eprintln!("✗ {error}"),
            None => {}
        }
    }

    /// Format progress message (only shown in verbose mode)
    pub fn progress(&self, message: &str) {
        if self.verbose && self.format == OutputFormat::Table {
            eprintln!("... {message}");
        }
    }

    /// Format success message
    pub fn success(&self, message: &str) {
        if self.format == OutputFormat::Table {
            println!("✓ {message}");
        }
    }

    /// Format error message
    pub fn error(&self, message: &str) {
        if self.format == OutputFormat::Table {
            eprintln!("✗ {message}");
        } else if self.format == OutputFormat::Json {
            println!("{}", self.to_json(&JsonResponse::<()>::error(message)));
        }
        // Quiet mode: no output, rely on exit code
    }

    /// Format warning message
    pub fn warning(&self, message: &str) {
        if self.format == OutputFormat::Table {
            eprintln!("⚠ {message}");
        } else if self.format == OutputFormat::Json {
            println!(
                "{}",
                self.to_json(&WarningOutput {
                    warning: message.to_string(),
                    timestamp: chrono::Utc::now().to_rfc3339(),
                })
            );
        }
    }

    /// Format info message (only in verbose mode)
    pub fn info(&self, message: &str) {
        if self.verbose && self.format == OutputFormat::Table {
            println!("ℹ {message}");
        }
    }

    fn to_json<T: Serialize>(&self, value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }

    /// Format data with consistent JSON response wrapper
    fn to_json_response<T: Serialize>(&self, value: &T, command: &str) -> String {
        let response = JsonResponse::success_with_command(value, command);
        serde_json::to_string_pretty(&response).unwrap_or_else(|e| {
            let err_response = JsonResponse::<()>::error(&format!("Serialization error: {e}"));
            self.to_json(&err_response)
        })
    }

    fn capture_table(&self, capture: &CaptureOutput) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Property", "Value"]);
        table.add_row(vec!["Video", &capture.video]);
        table.add_row(vec!["Status", &capture.status]);
        if let Some(ref reason) = capture.reason {
            table.add_row(vec!["Reason", reason]);
        }
        if let Some(seek_time) = capture.seek_time {
            table.add_row(vec!["Frame Time", &format!("{seek_time:.2}s")]);
        }
        if let (Some(width), Some(height)) = (capture.width, capture.height) {
            table.add_row(vec!["Dimensions", &format!("{width}x{height}")]);
        }
        if let Some(quality) = capture.quality {
            table.add_row(vec!["JPEG Quality", &quality.to_string()]);
        }
        if let Some(bytes) = capture.bytes {
            table.add_row(vec!["Size", &format_bytes(bytes)]);
        }
        table.add_row(vec!["Saved To", capture.file.as_deref().unwrap_or("-")]);
        table.add_row(vec!["Trigger", &capture.trigger_label]);
        table.to_string()
    }

    fn probe_table(&self, probe: &ProbeOutput) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Property", "Value"]);
        table.add_row(vec!["Video", &probe.video]);
        table.add_row(vec![
            "Duration",
            &probe
                .duration
                .map(|d| format!("{d:.3}s"))
                .unwrap_or_else(|| "unknown".to_string()),
        ]);
        table.add_row(vec!["Dimensions", &format!("{}x{}", probe.width, probe.height)]);
        table.add_row(vec![
            "Midpoint",
            &probe
                .midpoint
                .map(|m| format!("{m:.3}s"))
                .unwrap_or_else(|| "-".to_string()),
        ]);
        table.to_string()
    }

    fn config_table(&self, config: &Config, path: Option<&Path>) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Setting", "Value"]);
        table.add_row(vec![
            "config file",
            &path
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(defaults)".to_string()),
        ]);
        table.add_row(vec![
            "capture.settle_delay_ms",
            &config.capture.settle_delay_ms.to_string(),
        ]);
        table.add_row(vec![
            "capture.auto_delay_ms",
            &config.capture.auto_delay_ms.to_string(),
        ]);
        table.add_row(vec!["capture.quality", &config.capture.quality.to_string()]);
        table.add_row(vec!["capture.file_name", &config.capture.file_name]);
        table.add_row(vec!["ffmpeg.ffmpeg", &config.ffmpeg.ffmpeg.display().to_string()]);
        table.add_row(vec!["ffmpeg.ffprobe", &config.ffmpeg.ffprobe.display().to_string()]);
        table.add_row(vec!["output.format", &config.output.format]);
        table.add_row(vec!["output.verbose", &config.output.verbose.to_string()]);
        table.add_row(vec!["logging.level", &config.logging.level]);
        table.to_string()
    }
}

fn format_bytes(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

// JSON output structures

/// Stream an error report is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorTarget {
    Stdout,
    Stderr,
}

/// Result of a capture run
#[derive(Debug, Serialize)]
pub struct CaptureOutput {
    pub video: String,
    /// "captured", "skipped", "abandoned" or "cancelled"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Media time of the captured frame, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seek_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub trigger_label: String,
    pub export_visible: bool,
}

impl CaptureOutput {
    pub fn new(
        video: &Path,
        outcome: &CaptureOutcome,
        receipt: Option<&ExportReceipt>,
        controls: Controls,
    ) -> Self {
        let (status, reason) = match outcome {
            CaptureOutcome::Captured(_) => ("captured", None),
            CaptureOutcome::Skipped(reason) => ("skipped", Some(reason.to_string())),
            CaptureOutcome::Abandoned => (
                "abandoned",
                Some("video closed before it was ready".to_string()),
            ),
            CaptureOutcome::Cancelled => ("cancelled", None),
        };
        let image = outcome.image();

        Self {
            video: video.display().to_string(),
            status: status.to_string(),
            reason,
            seek_time: image.map(|i| i.taken_at()),
            width: image.map(|i| i.width()),
            height: image.map(|i| i.height()),
            quality: image.map(|i| i.quality()),
            bytes: image.map(|i| i.len()),
            file: receipt.map(|r| r.location.display().to_string()),
            trigger_label: controls.trigger_label.text().to_string(),
            export_visible: controls.export_visible,
        }
    }
}

/// Probed video metadata
#[derive(Debug, Serialize)]
pub struct ProbeOutput {
    pub video: String,
    /// Duration in seconds, absent when unknown
    pub duration: Option<f64>,
    pub width: u32,
    pub height: u32,
    /// Time a capture would seek to
    pub midpoint: Option<f64>,
}

impl ProbeOutput {
    pub fn new(video: &Path, meta: &VideoMetadata) -> Self {
        Self {
            video: video.display().to_string(),
            duration: meta.duration.is_finite().then_some(meta.duration),
            width: meta.width,
            height: meta.height,
            midpoint: meta.midpoint(),
        }
    }
}

#[derive(Serialize)]
struct ConfigOutput<'a> {
    path: Option<String>,
    config: &'a Config,
}

#[derive(Serialize)]
struct WarningOutput {
    warning: String,
    timestamp: String,
}

/// Simple success message for JSON output
#[derive(Serialize)]
pub struct SuccessMessage {
    pub message: String,
}

impl SuccessMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
