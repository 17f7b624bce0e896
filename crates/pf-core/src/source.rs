//! The video source seam.
//!
//! A `VideoSource` stands in for a media element owned by the host: it
//! reports metadata and readiness, accepts seek requests, announces
//! `LoadedMetadata` and `Seeked` on a broadcast channel, rasterizes its
//! current frame on request and accepts a poster.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::errors::SourceError;
use crate::surface::CaptureSurface;

/// Capacity of the media event channel an implementation should allocate
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Media readiness, ordered from least to most data available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ReadyState {
    HaveNothing = 0,
    HaveMetadata = 1,
    HaveCurrentData = 2,
    HaveFutureData = 3,
    HaveEnoughData = 4,
}

/// Notifications a video source emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    /// Duration and dimensions became known
    LoadedMetadata,
    /// A requested seek finished
    Seeked,
}

/// Duration and native dimensions of a video
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VideoMetadata {
    /// Duration in seconds; NaN when unknown
    pub duration: f64,
    /// Native width in pixels
    pub width: u32,
    /// Native height in pixels
    pub height: u32,
}

impl VideoMetadata {
    /// Whether a capture can be attempted: finite and strictly positive
    pub fn has_known_duration(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }

    /// Seek target for the midpoint frame
    pub fn midpoint(&self) -> Option<f64> {
        self.has_known_duration().then(|| self.duration / 2.0)
    }
}

#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Metadata, once loaded
    fn metadata(&self) -> Option<VideoMetadata>;

    /// Current readiness
    fn ready_state(&self) -> ReadyState;

    /// Subscribe to media events emitted from now on
    fn subscribe(&self) -> broadcast::Receiver<MediaEvent>;

    /// Request a seek; completion is announced with `MediaEvent::Seeked`
    fn set_current_time(&self, seconds: f64);

    /// Rasterize the current frame, scaled to the surface size
    async fn draw_frame(&self, surface: &mut CaptureSurface) -> Result<(), SourceError>;

    /// Assign the preview image
    fn set_poster(&self, url: String);
}

/// Wait for the next occurrence of `wanted`.
///
/// Returns `false` if the source closed its channel first, meaning the
/// notification will never arrive.
pub async fn wait_for(events: &mut broadcast::Receiver<MediaEvent>, wanted: MediaEvent) -> bool {
    loop {
        match events.recv().await {
            Ok(event) if event == wanted => return true,
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "media event receiver lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return false,
        }
    }
}

/// Wait until the source has metadata, returning immediately if it already
/// does. Returns `false` if the source went away first.
pub async fn wait_for_metadata(video: &dyn VideoSource) -> bool {
    // Subscribe before checking so a load between the two is not missed
    let mut events = video.subscribe();
    if video.ready_state() >= ReadyState::HaveMetadata {
        return true;
    }
    wait_for(&mut events, MediaEvent::LoadedMetadata).await
}
