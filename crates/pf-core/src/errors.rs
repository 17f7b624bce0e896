//! Error types for posterframe core.
//!
//! "Nothing to capture" conditions (missing video, unknown duration, no
//! stored image) are not errors; they surface as `CaptureOutcome` values or
//! `None`. The types here cover failures of the collaborators themselves.

use thiserror::Error;

/// Video source errors.
#[derive(Debug, Error)]
pub enum SourceError {
    /// External tool could not be started
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// External tool exited unsuccessfully
    #[error("{program} exited with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// Probe output could not be understood
    #[error("invalid probe output: {0}")]
    Probe(String),

    /// Input has no video stream
    #[error("no video stream in {0}")]
    NoVideoStream(String),

    /// Decoded frame smaller than the surface
    #[error("short frame: expected {expected} bytes, got {actual}")]
    ShortFrame { expected: usize, actual: usize },

    /// Surface has no pixels to draw into
    #[error("capture surface is empty ({width}x{height})")]
    EmptySurface { width: u32, height: u32 },
}

impl SourceError {
    /// Whether the error means the external tool is not installed
    pub fn is_tool_missing(&self) -> bool {
        matches!(self, SourceError::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Still image encoding errors.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Nothing has been drawn at a usable size
    #[error("cannot encode an empty surface")]
    EmptySurface,

    /// Quality outside (0, 1]
    #[error("quality {0} is out of range (0, 1]")]
    InvalidQuality(f32),

    /// Underlying codec failure
    #[error("jpeg encoding failed: {0}")]
    Jpeg(#[from] image::ImageError),
}

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    /// File name is empty or escapes the target directory
    #[error("invalid export file name: {0:?}")]
    InvalidFileName(String),

    /// Writing the file failed
    #[error("export write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while running the capture pipeline.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Spawned capture task panicked
    #[error("capture task failed: {0}")]
    TaskFailed(String),
}

/// Invalid tuning parameters.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid capture configuration: {0}")]
    Invalid(String),
}
