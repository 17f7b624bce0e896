//! Test harness for posterframe core.
//!
//! Provides a scriptable `VideoSource` whose notifications are driven by the
//! test, an in-memory `ExportSink`, and a helper for yielding until a
//! spawned pipeline reaches a given point.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::errors::{ExportError, SourceError};
use crate::export::ExportSink;
use crate::source::{MediaEvent, ReadyState, VideoMetadata, VideoSource, EVENT_CHANNEL_CAPACITY};
use crate::surface::CaptureSurface;
use crate::thumbnail::ThumbnailImage;

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Video source driven entirely by the test.
///
/// Each drawn frame gets a different flat colour so consecutive captures
/// produce different images.
pub struct ScriptedVideo {
    metadata: Mutex<Option<VideoMetadata>>,
    ready: Mutex<ReadyState>,
    seeks: Mutex<Vec<f64>>,
    poster: Mutex<Option<String>>,
    events: Mutex<Option<broadcast::Sender<MediaEvent>>>,
    draws: AtomicUsize,
    auto_seek: bool,
    fail_draws: AtomicBool,
}

impl ScriptedVideo {
    fn with_state(metadata: Option<VideoMetadata>, ready: ReadyState) -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            metadata: Mutex::new(metadata),
            ready: Mutex::new(ready),
            seeks: Mutex::new(Vec::new()),
            poster: Mutex::new(None),
            events: Mutex::new(Some(tx)),
            draws: AtomicUsize::new(0),
            auto_seek: true,
            fail_draws: AtomicBool::new(false),
        }
    }

    /// A video whose metadata is already loaded
    pub fn loaded(duration: f64, width: u32, height: u32) -> Self {
        Self::with_state(
            Some(VideoMetadata { duration, width, height }),
            ReadyState::HaveEnoughData,
        )
    }

    /// A video that has not loaded anything yet
    pub fn unloaded() -> Self {
        Self::with_state(None, ReadyState::HaveNothing)
    }

    /// Seeks only complete when the test calls `complete_seek`
    pub fn manual_seeks(mut self) -> Self {
        self.auto_seek = false;
        self
    }

    /// Make metadata available and announce it
    pub fn load_metadata(&self, metadata: VideoMetadata) {
        *lock(&self.metadata) = Some(metadata);
        *lock(&self.ready) = ReadyState::HaveEnoughData;
        self.emit(MediaEvent::LoadedMetadata);
    }

    /// Announce a finished seek
    pub fn complete_seek(&self) {
        self.emit(MediaEvent::Seeked);
    }

    /// Drop the event channel, as if the element was destroyed
    pub fn close(&self) {
        lock(&self.events).take();
    }

    /// Make subsequent `draw_frame` calls fail
    pub fn fail_draws(&self, fail: bool) {
        self.fail_draws.store(fail, Ordering::SeqCst);
    }

    /// Positions requested through `set_current_time`
    pub fn seek_requests(&self) -> Vec<f64> {
        lock(&self.seeks).clone()
    }

    /// Number of successful rasterizations
    pub fn draw_count(&self) -> usize {
        self.draws.load(Ordering::SeqCst)
    }

    pub fn poster(&self) -> Option<String> {
        lock(&self.poster).clone()
    }

    /// Live subscriptions to the event channel
    pub fn subscriber_count(&self) -> usize {
        lock(&self.events)
            .as_ref()
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    fn emit(&self, event: MediaEvent) {
        if let Some(tx) = lock(&self.events).as_ref() {
            // No subscribers is fine
            let _ = tx.send(event);
        }
    }
}

#[async_trait]
impl VideoSource for ScriptedVideo {
    fn metadata(&self) -> Option<VideoMetadata> {
        *lock(&self.metadata)
    }

    fn ready_state(&self) -> ReadyState {
        *lock(&self.ready)
    }

    fn subscribe(&self) -> broadcast::Receiver<MediaEvent> {
        match lock(&self.events).as_ref() {
            Some(tx) => tx.subscribe(),
            None => {
                // Closed source: hand out a receiver that is already closed
                let (tx, rx) = broadcast::channel(1);
                drop(tx);
                rx
            }
        }
    }

    fn set_current_time(&self, seconds: f64) {
        lock(&self.seeks).push(seconds);
        if self.auto_seek {
            self.emit(MediaEvent::Seeked);
        }
    }

    async fn draw_frame(&self, surface: &mut CaptureSurface) -> Result<(), SourceError> {
        if self.fail_draws.load(Ordering::SeqCst) {
            return Err(SourceError::ToolFailed {
                program: "scripted".to_string(),
                status: "1".to_string(),
                stderr: "draw failure requested".to_string(),
            });
        }

        let n = self.draws.fetch_add(1, Ordering::SeqCst) as u8;
        let shade = n.wrapping_mul(60).wrapping_add(30);
        surface.fill([shade, 255 - shade, 128, 255]);
        Ok(())
    }

    fn set_poster(&self, url: String) {
        *lock(&self.poster) = Some(url);
    }
}

/// Export sink that only records what it was given
#[derive(Default)]
pub struct MemoryExport {
    saved: Mutex<Vec<(String, usize)>>,
}

impl MemoryExport {
    pub fn new() -> Self {
        Self::default()
    }

    /// File names and byte counts saved so far
    pub fn saved(&self) -> Vec<(String, usize)> {
        lock(&self.saved).clone()
    }
}

#[async_trait]
impl ExportSink for MemoryExport {
    async fn save(&self, file_name: &str, image: &ThumbnailImage) -> Result<PathBuf, ExportError> {
        lock(&self.saved).push((file_name.to_string(), image.len()));
        Ok(PathBuf::from(file_name))
    }
}

/// Yield to other tasks until `cond` holds.
///
/// # Panics
///
/// Panics if the condition does not hold after a generous number of yields,
/// so a broken pipeline fails the test instead of hanging it.
pub async fn until(mut cond: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
