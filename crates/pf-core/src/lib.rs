//! posterframe core - midpoint thumbnail capture for video sources.
//!
//! This crate implements:
//! - The `ThumbnailCapture` component (capture, export, trigger policy)
//! - The `VideoSource` and `ExportSink` collaborator seams
//! - The capture surface and JPEG encoding of captured frames
//! - An ffmpeg/ffprobe backed `VideoSource` (feature `ffmpeg`)

#![forbid(unsafe_code)]

// Component
pub mod capture;

// Collaborators
pub mod source;
pub mod export;

// Raster and encoding
pub mod surface;
pub mod thumbnail;
pub mod encode;

// Supporting modules
pub mod config;
pub mod errors;
pub mod harness;

#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;

#[cfg(test)]
mod proptests;

pub use capture::{CaptureOutcome, CaptureTask, Controls, SkipReason, ThumbnailCapture, TriggerLabel};
pub use config::CaptureConfig;
pub use errors::{CaptureError, ConfigError, EncodeError, ExportError, SourceError};
pub use export::{DirectoryExport, ExportReceipt, ExportSink};
pub use source::{MediaEvent, ReadyState, VideoMetadata, VideoSource};
pub use surface::CaptureSurface;
pub use thumbnail::ThumbnailImage;

#[cfg(feature = "ffmpeg")]
pub use ffmpeg::{FfmpegTools, FfmpegVideo};
