//! posterframe - CLI for capturing midpoint video thumbnails
//!
//! This crate provides a command-line interface for:
//! - Capturing a JPEG thumbnail from the middle of a video
//! - Probing video metadata
//! - Managing the configuration file

pub mod cli;
pub mod config;
pub mod output;

#[cfg(test)]
mod proptests;

pub use cli::Cli;
pub use config::{CliOverrides, Config};
pub use output::{JsonResponse, OutputFormat, OutputFormatter, SuccessMessage};

/// Exit codes for CLI operations
///
/// Exit codes provide machine-readable status for scripting:
/// - 0: Success - thumbnail captured and exported
/// - 1: General error - unspecified error occurred
/// - 3: Nothing captured - the video gave no usable midpoint frame
/// - 5: Invalid input - bad arguments, configuration or video file
/// - 6: Tool missing - ffmpeg or ffprobe could not be started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully (exit code 0)
    Success = 0,
    /// General error (exit code 1)
    GeneralError = 1,
    /// Capture finished without an image (exit code 3)
    NothingCaptured = 3,
    /// Invalid input provided (exit code 5)
    InvalidInput = 5,
    /// ffmpeg tooling not found (exit code 6)
    ToolMissing = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Convert to process exit code
    pub fn to_exit_code(self) -> std::process::ExitCode {
        std::process::ExitCode::from(self as u8)
    }

    /// Get the exit code name as a string
    pub fn name(&self) -> &'static str {
        match self {
            ExitCode::Success => "SUCCESS",
            ExitCode::GeneralError => "GENERAL_ERROR",
            ExitCode::NothingCaptured => "NOTHING_CAPTURED",
            ExitCode::InvalidInput => "INVALID_INPUT",
            ExitCode::ToolMissing => "TOOL_MISSING",
        }
    }

    /// Get a human-readable description of the exit code
    pub fn description(&self) -> &'static str {
        match self {
            ExitCode::Success => "Operation completed successfully",
            ExitCode::GeneralError => "An unspecified error occurred",
            ExitCode::NothingCaptured => "No thumbnail was captured",
            ExitCode::InvalidInput => "Invalid arguments, configuration or input file",
            ExitCode::ToolMissing => "ffmpeg or ffprobe is not installed",
        }
    }
}
