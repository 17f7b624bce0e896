//! `VideoSource` backed by the ffmpeg command-line tools.
//!
//! Metadata comes from `ffprobe -print_format json`. Seeking only records
//! the position and announces `Seeked`; the frame is decoded when it is
//! drawn, by asking `ffmpeg` for one raw RGBA frame at that position scaled
//! to the surface size.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::errors::SourceError;
use crate::source::{MediaEvent, ReadyState, VideoMetadata, VideoSource, EVENT_CHANNEL_CAPACITY};
use crate::surface::CaptureSurface;

/// Locations of the ffmpeg binaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FfmpegTools {
    /// ffmpeg program (name on PATH or full path)
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,

    /// ffprobe program (name on PATH or full path)
    #[serde(default = "default_ffprobe")]
    pub ffprobe: PathBuf,
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe() -> PathBuf {
    PathBuf::from("ffprobe")
}

impl Default for FfmpegTools {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
        }
    }
}

/// A video file decoded through ffmpeg
pub struct FfmpegVideo {
    path: PathBuf,
    tools: FfmpegTools,
    metadata: OnceLock<VideoMetadata>,
    ready: AtomicU8,
    /// Current position as f64 bits
    position: AtomicU64,
    poster: Mutex<Option<String>>,
    events: broadcast::Sender<MediaEvent>,
}

impl FfmpegVideo {
    /// Create an unloaded source; call `load` to probe it
    pub fn new(path: impl AsRef<Path>, tools: FfmpegTools) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            path: path.as_ref().to_path_buf(),
            tools,
            metadata: OnceLock::new(),
            ready: AtomicU8::new(ReadyState::HaveNothing as u8),
            position: AtomicU64::new(0f64.to_bits()),
            poster: Mutex::new(None),
            events,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current playback position in seconds
    pub fn current_time(&self) -> f64 {
        f64::from_bits(self.position.load(Ordering::SeqCst))
    }

    /// Last assigned poster
    pub fn poster(&self) -> Option<String> {
        self.poster
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Probe the file and announce `LoadedMetadata`.
    ///
    /// Probing again returns the metadata from the first successful probe.
    pub async fn load(&self) -> Result<VideoMetadata, SourceError> {
        if let Some(meta) = self.metadata.get() {
            return Ok(*meta);
        }

        let program = self.tools.ffprobe.display().to_string();
        debug!(path = %self.path.display(), "probing video");

        let output = Command::new(&self.tools.ffprobe)
            .args(["-v", "error", "-print_format", "json", "-show_streams", "-show_format"])
            .arg(&self.path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| SourceError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SourceError::ToolFailed {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let meta = parse_probe(&output.stdout, &self.path)?;
        let meta = *self.metadata.get_or_init(|| meta);
        self.ready.store(ReadyState::HaveEnoughData as u8, Ordering::SeqCst);

        info!(
            path = %self.path.display(),
            duration = meta.duration,
            width = meta.width,
            height = meta.height,
            "video metadata loaded"
        );
        // No subscribers is fine
        let _ = self.events.send(MediaEvent::LoadedMetadata);

        Ok(meta)
    }

    /// Open and probe a file in one step
    pub async fn open(path: impl AsRef<Path>, tools: FfmpegTools) -> Result<Self, SourceError> {
        let video = Self::new(path, tools);
        video.load().await?;
        Ok(video)
    }
}

#[async_trait]
impl VideoSource for FfmpegVideo {
    fn metadata(&self) -> Option<VideoMetadata> {
        self.metadata.get().copied()
    }

    fn ready_state(&self) -> ReadyState {
        match self.ready.load(Ordering::SeqCst) {
            0 => ReadyState::HaveNothing,
            1 => ReadyState::HaveMetadata,
            2 => ReadyState::HaveCurrentData,
            3 => ReadyState::HaveFutureData,
            _ => ReadyState::HaveEnoughData,
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<MediaEvent> {
        self.events.subscribe()
    }

    fn set_current_time(&self, seconds: f64) {
        self.position.store(seconds.to_bits(), Ordering::SeqCst);
        let _ = self.events.send(MediaEvent::Seeked);
    }

    async fn draw_frame(&self, surface: &mut CaptureSurface) -> Result<(), SourceError> {
        let (width, height) = surface.dimensions();
        if surface.is_empty() {
            return Err(SourceError::EmptySurface { width, height });
        }

        let seconds = self.current_time().max(0.0);
        let program = self.tools.ffmpeg.display().to_string();
        debug!(seconds, width, height, "decoding frame");

        let output = Command::new(&self.tools.ffmpeg)
            .args(["-hide_banner", "-loglevel", "error"])
            .arg("-ss")
            .arg(format!("{seconds:.3}"))
            .arg("-i")
            .arg(&self.path)
            .args(["-frames:v", "1"])
            .arg("-vf")
            .arg(format!("scale={width}:{height}"))
            .args(["-f", "rawvideo", "-pix_fmt", "rgba", "-"])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| SourceError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SourceError::ToolFailed {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        surface.put_rgba(&output.stdout)
    }

    fn set_poster(&self, url: String) {
        *self.poster.lock().unwrap_or_else(PoisonError::into_inner) = Some(url);
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
    tags: Option<ProbeTags>,
    #[serde(default)]
    side_data_list: Vec<ProbeSideData>,
}

#[derive(Debug, Deserialize)]
struct ProbeTags {
    rotate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeSideData {
    side_data_type: Option<String>,
    /// Number in newer ffprobe builds, string in some older ones
    rotation: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

impl ProbeStream {
    /// Rotation in degrees, normalised to 0, 90, 180 or 270.
    ///
    /// The legacy `rotate` tag wins; the display matrix is consulted when the
    /// tag is absent or zero.
    fn rotation(&self) -> u32 {
        let mut degrees = self
            .tags
            .as_ref()
            .and_then(|t| t.rotate.as_deref())
            .and_then(|r| r.trim().parse::<f64>().ok())
            .unwrap_or(0.0);

        if degrees == 0.0 {
            if let Some(r) = self
                .side_data_list
                .iter()
                .filter(|sd| sd.side_data_type.as_deref() == Some("Display Matrix"))
                .find_map(|sd| match sd.rotation.as_ref()? {
                    serde_json::Value::Number(n) => n.as_f64(),
                    serde_json::Value::String(s) => s.trim().parse().ok(),
                    _ => None,
                })
            {
                degrees = r;
            }
        }

        match (degrees.round() as i64).unsigned_abs() % 360 {
            r if !(45..=315).contains(&r) => 0,
            r if r < 135 => 90,
            r if r < 225 => 180,
            _ => 270,
        }
    }

    /// Display-oriented size: coded size with 90/270 rotation applied
    fn display_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        match self.rotation() {
            90 | 270 => (height, width),
            _ => (width, height),
        }
    }
}

/// Extract duration and display size from ffprobe JSON.
///
/// Stream duration wins over container duration. A missing or unparsable
/// duration yields NaN, which callers treat as "not known yet". The size is
/// the one ffmpeg produces after autorotation, so frames drawn at that size
/// keep their shape.
pub(crate) fn parse_probe(json: &[u8], path: &Path) -> Result<VideoMetadata, SourceError> {
    let probe: ProbeOutput =
        serde_json::from_slice(json).map_err(|e| SourceError::Probe(e.to_string()))?;

    let stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| SourceError::NoVideoStream(path.display().to_string()))?;

    let width = stream.width.unwrap_or(0);
    let height = stream.height.unwrap_or(0);
    if width == 0 || height == 0 {
        return Err(SourceError::Probe(format!(
            "could not determine video dimensions: {width}x{height}"
        )));
    }
    let (width, height) = stream.display_dimensions(width, height);

    let duration = stream
        .duration
        .as_deref()
        .or_else(|| probe.format.as_ref().and_then(|f| f.duration.as_deref()))
        .and_then(|d| d.trim().parse::<f64>().ok())
        .unwrap_or(f64::NAN);

    Ok(VideoMetadata { duration, width, height })
}
