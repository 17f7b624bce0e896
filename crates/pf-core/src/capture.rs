//! Thumbnail capture component.
//!
//! `ThumbnailCapture` owns the capture surface, the single current
//! thumbnail and the state of the two user-facing controls. A capture runs
//! as one async pipeline:
//!
//! 1. resize the surface to the video's native size
//! 2. seek to the midpoint and wait for the first `Seeked`
//! 3. wait the settle delay
//! 4. rasterize the frame and encode it as JPEG
//! 5. replace the stored thumbnail, assign the poster, update the controls
//!
//! Each `.await` is a suspension point; dropping or aborting the future at
//! any of them leaves the stored thumbnail untouched. A seek that never
//! completes leaves the pipeline waiting indefinitely.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::CaptureConfig;
use crate::encode::{encode_jpeg, quality_percent};
use crate::errors::{CaptureError, ExportError};
use crate::export::{ExportReceipt, ExportSink};
use crate::source::{wait_for, wait_for_metadata, MediaEvent, ReadyState, VideoSource};
use crate::surface::CaptureSurface;
use crate::thumbnail::ThumbnailImage;

/// Label of the trigger control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TriggerLabel {
    /// No thumbnail captured yet
    #[default]
    Generate,
    /// A thumbnail exists; triggering replaces it
    Regenerate,
}

impl TriggerLabel {
    pub fn text(&self) -> &'static str {
        match self {
            Self::Generate => "Generate Thumbnail",
            Self::Regenerate => "Regenerate Thumbnail",
        }
    }
}

impl std::fmt::Display for TriggerLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

/// State of the trigger and export controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Controls {
    pub trigger_label: TriggerLabel,
    /// Export control is only shown once a thumbnail exists
    pub export_visible: bool,
}

/// Why a capture did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// No video source bound
    NoVideo,
    /// No capture surface bound
    NoSurface,
    /// Duration unknown, zero or unbounded
    UnknownDuration,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoVideo => write!(f, "no video source"),
            Self::NoSurface => write!(f, "no capture surface"),
            Self::UnknownDuration => write!(f, "video duration is unknown or zero"),
        }
    }
}

/// Result of running the pipeline
#[derive(Debug, Clone)]
pub enum CaptureOutcome {
    /// A new thumbnail replaced the previous one
    Captured(Arc<ThumbnailImage>),
    /// Preconditions not met; nothing happened
    Skipped(SkipReason),
    /// The source went away before it announced what we waited for
    Abandoned,
    /// The spawned task was cancelled
    Cancelled,
}

impl CaptureOutcome {
    pub fn image(&self) -> Option<&Arc<ThumbnailImage>> {
        match self {
            Self::Captured(image) => Some(image),
            _ => None,
        }
    }

    pub fn is_captured(&self) -> bool {
        matches!(self, Self::Captured(_))
    }
}

/// Handle to a spawned capture pipeline
pub struct CaptureTask {
    handle: JoinHandle<Result<CaptureOutcome, CaptureError>>,
}

impl CaptureTask {
    fn spawn<F>(fut: F) -> Self
    where
        F: std::future::Future<Output = Result<CaptureOutcome, CaptureError>> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(fut),
        }
    }

    /// Abort the pipeline at its current suspension point
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Handle that can abort the pipeline after `join` has taken the task
    pub fn abort_handle(&self) -> tokio::task::AbortHandle {
        self.handle.abort_handle()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the pipeline to finish
    pub async fn join(self) -> Result<CaptureOutcome, CaptureError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Ok(CaptureOutcome::Cancelled),
            Err(e) => Err(CaptureError::TaskFailed(e.to_string())),
        }
    }
}

/// Midpoint thumbnail capture bound to one video.
pub struct ThumbnailCapture {
    config: CaptureConfig,
    video: Option<Arc<dyn VideoSource>>,
    surface: Option<Mutex<CaptureSurface>>,
    current: RwLock<Option<Arc<ThumbnailImage>>>,
    controls: watch::Sender<Controls>,
}

impl ThumbnailCapture {
    /// Bind to whichever collaborators the host provides. A missing video or
    /// surface turns every capture into a no-op.
    pub fn new(
        config: CaptureConfig,
        video: Option<Arc<dyn VideoSource>>,
        surface: Option<CaptureSurface>,
    ) -> Self {
        let (controls, _) = watch::channel(Controls::default());
        Self {
            config,
            video,
            surface: surface.map(Mutex::new),
            current: RwLock::new(None),
            controls,
        }
    }

    /// Bind to a video with a fresh surface
    pub fn attach(config: CaptureConfig, video: Arc<dyn VideoSource>) -> Self {
        Self::new(config, Some(video), Some(CaptureSurface::new()))
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn video(&self) -> Option<&Arc<dyn VideoSource>> {
        self.video.as_ref()
    }

    /// The stored thumbnail, if any
    pub async fn current(&self) -> Option<Arc<ThumbnailImage>> {
        self.current.read().await.clone()
    }

    /// Current state of the controls
    pub fn controls(&self) -> Controls {
        *self.controls.borrow()
    }

    /// Observe control changes
    pub fn watch_controls(&self) -> watch::Receiver<Controls> {
        self.controls.subscribe()
    }

    /// Run the capture pipeline once.
    pub async fn capture(&self) -> Result<CaptureOutcome, CaptureError> {
        let Some(video) = self.video.as_ref() else {
            debug!("no video bound, skipping capture");
            return Ok(CaptureOutcome::Skipped(SkipReason::NoVideo));
        };
        let Some(surface) = self.surface.as_ref() else {
            debug!("no surface bound, skipping capture");
            return Ok(CaptureOutcome::Skipped(SkipReason::NoSurface));
        };
        let Some(meta) = video.metadata().filter(|m| m.has_known_duration()) else {
            debug!("duration unknown, skipping capture");
            return Ok(CaptureOutcome::Skipped(SkipReason::UnknownDuration));
        };

        surface.lock().await.resize(meta.width, meta.height);

        let seek_to = meta.duration / 2.0;
        let mut events = video.subscribe();
        debug!(seek_to, "seeking to midpoint");
        video.set_current_time(seek_to);

        if !wait_for(&mut events, MediaEvent::Seeked).await {
            debug!("video closed before seek completed");
            return Ok(CaptureOutcome::Abandoned);
        }
        // One Seeked per capture; later ones belong to someone else
        drop(events);

        tokio::time::sleep(self.config.settle_delay()).await;

        let image = {
            let mut surface = surface.lock().await;
            video.draw_frame(&mut surface).await.inspect_err(|e| {
                warn!(error = %e, "failed to rasterize frame");
            })?;
            let bytes = encode_jpeg(&surface, self.config.quality).inspect_err(|e| {
                warn!(error = %e, "failed to encode thumbnail");
            })?;
            ThumbnailImage::new(
                bytes,
                surface.width(),
                surface.height(),
                quality_percent(self.config.quality)?,
                seek_to,
            )
        };
        let image = Arc::new(image);

        self.publish(video.as_ref(), image.clone()).await;
        info!(
            width = image.width(),
            height = image.height(),
            bytes = image.len(),
            "thumbnail generated from middle frame at {:.2} seconds",
            seek_to
        );

        Ok(CaptureOutcome::Captured(image))
    }

    async fn publish(&self, video: &dyn VideoSource, image: Arc<ThumbnailImage>) {
        let replaced = self.current.write().await.replace(image.clone());
        if replaced.is_some() {
            debug!("replaced previous thumbnail");
        }

        video.set_poster(image.data_url());
        self.controls.send_replace(Controls {
            trigger_label: TriggerLabel::Regenerate,
            export_visible: true,
        });
    }

    /// Automatic trigger: once metadata is available, wait the auto delay
    /// and capture if the duration is positive.
    pub async fn auto_capture(&self) -> Result<CaptureOutcome, CaptureError> {
        let Some(video) = self.video.as_ref() else {
            return Ok(CaptureOutcome::Skipped(SkipReason::NoVideo));
        };

        if !wait_for_metadata(video.as_ref()).await {
            return Ok(CaptureOutcome::Abandoned);
        }
        tokio::time::sleep(self.config.auto_delay()).await;

        match video.metadata() {
            Some(meta) if meta.duration > 0.0 => self.capture().await,
            _ => {
                debug!("auto capture skipped, duration not positive");
                Ok(CaptureOutcome::Skipped(SkipReason::UnknownDuration))
            }
        }
    }

    /// Manual trigger: capture now if the video has metadata, otherwise
    /// defer until `LoadedMetadata` and capture exactly once.
    ///
    /// The gate is `HaveMetadata`, not `HaveCurrentData`: a source that stops
    /// at metadata would otherwise wait for an event it already sent.
    pub async fn request_capture(&self) -> Result<CaptureOutcome, CaptureError> {
        let Some(video) = self.video.as_ref() else {
            return Ok(CaptureOutcome::Skipped(SkipReason::NoVideo));
        };

        let mut events = video.subscribe();
        if video.ready_state() < ReadyState::HaveMetadata {
            debug!("video not ready, deferring capture until metadata loads");
            if !wait_for(&mut events, MediaEvent::LoadedMetadata).await {
                return Ok(CaptureOutcome::Abandoned);
            }
        }
        drop(events);

        self.capture().await
    }

    /// Spawn `capture` as a cancellable task
    pub fn spawn_capture(self: &Arc<Self>) -> CaptureTask {
        let this = Arc::clone(self);
        CaptureTask::spawn(async move { this.capture().await })
    }

    /// Spawn `auto_capture` as a cancellable task
    pub fn spawn_auto_capture(self: &Arc<Self>) -> CaptureTask {
        let this = Arc::clone(self);
        CaptureTask::spawn(async move { this.auto_capture().await })
    }

    /// Spawn `request_capture` as a cancellable task
    pub fn spawn_request_capture(self: &Arc<Self>) -> CaptureTask {
        let this = Arc::clone(self);
        CaptureTask::spawn(async move { this.request_capture().await })
    }

    /// Hand the stored thumbnail to `sink` under the configured file name.
    /// Returns `Ok(None)` without touching the sink when nothing is stored.
    pub async fn export(&self, sink: &dyn ExportSink) -> Result<Option<ExportReceipt>, ExportError> {
        let Some(image) = self.current().await else {
            debug!("no thumbnail to export");
            return Ok(None);
        };

        let location = sink.save(&self.config.file_name, &image).await?;
        info!(path = %location.display(), bytes = image.len(), "thumbnail exported");

        Ok(Some(ExportReceipt {
            file_name: self.config.file_name.clone(),
            location,
            bytes: image.len(),
            width: image.width(),
            height: image.height(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::harness::{until, MemoryExport, ScriptedVideo};
    use crate::source::VideoMetadata;

    fn capture_for(video: &Arc<ScriptedVideo>) -> Arc<ThumbnailCapture> {
        Arc::new(ThumbnailCapture::attach(CaptureConfig::default(), video.clone()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_seeks_to_midpoint() {
        let video = Arc::new(ScriptedVideo::loaded(10.0, 32, 18));
        let capture = capture_for(&video);

        let outcome = capture.capture().await.unwrap();

        assert!(outcome.is_captured());
        assert_eq!(video.seek_requests(), vec![5.0]);
        assert_eq!(outcome.image().unwrap().taken_at(), 5.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_duration_does_not_capture() {
        let video = Arc::new(ScriptedVideo::loaded(0.0, 32, 18));
        let capture = capture_for(&video);

        let outcome = capture.capture().await.unwrap();

        assert!(matches!(outcome, CaptureOutcome::Skipped(SkipReason::UnknownDuration)));
        assert!(video.seek_requests().is_empty());
        assert_eq!(video.draw_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nan_duration_does_not_capture() {
        let video = Arc::new(ScriptedVideo::loaded(f64::NAN, 32, 18));
        let capture = capture_for(&video);

        let outcome = capture.capture().await.unwrap();
        assert!(matches!(outcome, CaptureOutcome::Skipped(SkipReason::UnknownDuration)));
    }

    #[tokio::test]
    async fn test_missing_collaborators_are_noops() {
        let capture = ThumbnailCapture::new(CaptureConfig::default(), None, Some(CaptureSurface::new()));
        assert!(matches!(
            capture.capture().await.unwrap(),
            CaptureOutcome::Skipped(SkipReason::NoVideo)
        ));

        let video: Arc<dyn VideoSource> = Arc::new(ScriptedVideo::loaded(4.0, 8, 8));
        let capture = ThumbnailCapture::new(CaptureConfig::default(), Some(video), None);
        assert!(matches!(
            capture.capture().await.unwrap(),
            CaptureOutcome::Skipped(SkipReason::NoSurface)
        ));
        assert!(capture.current().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_delay_precedes_raster() {
        let video = Arc::new(ScriptedVideo::loaded(8.0, 16, 16).manual_seeks());
        let capture = capture_for(&video);

        let task = capture.spawn_capture();
        until(|| !video.seek_requests().is_empty()).await;
        video.complete_seek();

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert_eq!(video.draw_count(), 0);

        let outcome = task.join().await.unwrap();
        assert!(outcome.is_captured());
        assert_eq!(video.draw_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_seeked_notification_is_ignored() {
        let video = Arc::new(ScriptedVideo::loaded(10.0, 16, 16).manual_seeks());
        let capture = capture_for(&video);

        let task = capture.spawn_capture();
        until(|| !video.seek_requests().is_empty()).await;
        video.complete_seek();
        video.complete_seek();

        assert!(task.join().await.unwrap().is_captured());
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(video.draw_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recapture_replaces_image() {
        let video = Arc::new(ScriptedVideo::loaded(10.0, 16, 16));
        let capture = capture_for(&video);

        let first = capture.capture().await.unwrap().image().cloned().unwrap();
        let second = capture.capture().await.unwrap().image().cloned().unwrap();

        let stored = capture.current().await.unwrap();
        assert!(Arc::ptr_eq(&stored, &second));
        assert_ne!(first.bytes(), second.bytes());
        assert_eq!(Arc::strong_count(&first), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_controls_follow_capture() {
        let video = Arc::new(ScriptedVideo::loaded(6.0, 16, 16));
        let capture = capture_for(&video);

        let initial = capture.controls();
        assert_eq!(initial.trigger_label, TriggerLabel::Generate);
        assert!(!initial.export_visible);
        assert_eq!(initial.trigger_label.to_string(), "Generate Thumbnail");

        let mut watcher = capture.watch_controls();
        capture.capture().await.unwrap();

        assert!(watcher.has_changed().unwrap());
        let controls = *watcher.borrow_and_update();
        assert_eq!(controls.trigger_label, TriggerLabel::Regenerate);
        assert!(controls.export_visible);
        assert_eq!(controls.trigger_label.text(), "Regenerate Thumbnail");
    }

    #[tokio::test(start_paused = true)]
    async fn test_poster_is_data_url_of_current() {
        let video = Arc::new(ScriptedVideo::loaded(6.0, 16, 16));
        let capture = capture_for(&video);

        capture.capture().await.unwrap();

        let current = capture.current().await.unwrap();
        assert_eq!(video.poster(), Some(current.data_url()));
        assert!(video.poster().unwrap().starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_capture_defers_until_metadata() {
        let video = Arc::new(ScriptedVideo::unloaded());
        let capture = capture_for(&video);

        let task = capture.spawn_request_capture();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(video.seek_requests().is_empty());
        assert!(!task.is_finished());

        video.load_metadata(VideoMetadata { duration: 12.0, width: 20, height: 10 });
        let outcome = task.join().await.unwrap();
        assert!(outcome.is_captured());

        // A later metadata notification must not trigger again
        video.load_metadata(VideoMetadata { duration: 12.0, width: 20, height: 10 });
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(video.seek_requests(), vec![6.0]);
        assert_eq!(video.draw_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_capture_runs_immediately_when_ready() {
        let video = Arc::new(ScriptedVideo::loaded(3.0, 8, 8));
        let capture = capture_for(&video);

        let outcome = capture.request_capture().await.unwrap();
        assert!(outcome.is_captured());
        assert_eq!(video.seek_requests(), vec![1.5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_capture_waits_auto_delay() {
        let video = Arc::new(ScriptedVideo::unloaded());
        let capture = capture_for(&video);

        let task = capture.spawn_auto_capture();
        until(|| video.subscriber_count() > 0).await;
        video.load_metadata(VideoMetadata { duration: 10.0, width: 16, height: 9 });

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(video.seek_requests().is_empty());

        let outcome = task.join().await.unwrap();
        assert!(outcome.is_captured());
        assert_eq!(video.seek_requests(), vec![5.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_capture_skips_zero_duration() {
        let video = Arc::new(ScriptedVideo::unloaded());
        let capture = capture_for(&video);

        let task = capture.spawn_auto_capture();
        until(|| video.subscriber_count() > 0).await;
        video.load_metadata(VideoMetadata { duration: 0.0, width: 16, height: 9 });

        let outcome = task.join().await.unwrap();
        assert!(matches!(outcome, CaptureOutcome::Skipped(SkipReason::UnknownDuration)));
        assert!(video.seek_requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_source_abandons_capture() {
        let video = Arc::new(ScriptedVideo::loaded(10.0, 16, 16).manual_seeks());
        let capture = capture_for(&video);

        let task = capture.spawn_capture();
        until(|| !video.seek_requests().is_empty()).await;
        video.close();

        assert!(matches!(task.join().await.unwrap(), CaptureOutcome::Abandoned));
        assert!(capture.current().await.is_none());
        assert!(!capture.controls().export_visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_abandoned_when_source_closes_before_metadata() {
        let video = Arc::new(ScriptedVideo::unloaded());
        let capture = capture_for(&video);

        let task = capture.spawn_request_capture();
        until(|| video.subscriber_count() > 0).await;
        video.close();

        assert!(matches!(task.join().await.unwrap(), CaptureOutcome::Abandoned));
        assert!(video.seek_requests().is_empty());
        assert!(capture.current().await.is_none());
        assert_eq!(capture.controls(), Controls::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_abandoned_when_source_closes_before_metadata() {
        let video = Arc::new(ScriptedVideo::unloaded());
        let capture = capture_for(&video);

        let task = capture.spawn_auto_capture();
        until(|| video.subscriber_count() > 0).await;
        video.close();

        assert!(matches!(task.join().await.unwrap(), CaptureOutcome::Abandoned));
        assert!(video.seek_requests().is_empty());
        assert!(capture.current().await.is_none());
        assert_eq!(capture.controls(), Controls::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_capture_leaves_state() {
        let video = Arc::new(ScriptedVideo::loaded(10.0, 16, 16).manual_seeks());
        let capture = capture_for(&video);

        let task = capture.spawn_capture();
        until(|| !video.seek_requests().is_empty()).await;
        task.cancel();

        assert!(matches!(task.join().await.unwrap(), CaptureOutcome::Cancelled));
        video.complete_seek();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(video.draw_count(), 0);
        assert!(capture.current().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_handle_cancels_pending_join() {
        let video = Arc::new(ScriptedVideo::unloaded());
        let capture = capture_for(&video);

        let task = capture.spawn_request_capture();
        let abort = task.abort_handle();
        until(|| video.subscriber_count() > 0).await;

        let join = tokio::spawn(task.join());
        abort.abort();

        assert!(matches!(join.await.unwrap().unwrap(), CaptureOutcome::Cancelled));
        assert!(video.seek_requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_raster_failure_keeps_previous_image() {
        let video = Arc::new(ScriptedVideo::loaded(10.0, 16, 16));
        let capture = capture_for(&video);

        let first = capture.capture().await.unwrap().image().cloned().unwrap();

        video.fail_draws(true);
        let result = capture.capture().await;
        assert!(matches!(result, Err(CaptureError::Source(_))));

        let stored = capture.current().await.unwrap();
        assert!(Arc::ptr_eq(&stored, &first));
    }

    #[tokio::test]
    async fn test_export_without_capture_is_noop() {
        let video = Arc::new(ScriptedVideo::loaded(10.0, 16, 16));
        let capture = capture_for(&video);
        let sink = MemoryExport::new();

        let receipt = capture.export(&sink).await.unwrap();

        assert!(receipt.is_none());
        assert!(sink.saved().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_uses_fixed_file_name() {
        let video = Arc::new(ScriptedVideo::loaded(10.0, 16, 16));
        let capture = capture_for(&video);
        let sink = MemoryExport::new();

        let image = capture.capture().await.unwrap().image().cloned().unwrap();
        let receipt = capture.export(&sink).await.unwrap().unwrap();

        assert_eq!(receipt.file_name, "video-thumbnail.jpg");
        assert_eq!(receipt.bytes, image.len());
        assert_eq!(sink.saved(), vec![("video-thumbnail.jpg".to_string(), image.len())]);
    }
}
