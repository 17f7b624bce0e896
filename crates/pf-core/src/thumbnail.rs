//! The encoded still image produced by a capture.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;

/// MIME type of every thumbnail
pub const JPEG_MIME: &str = "image/jpeg";

/// Encoded JPEG taken from a video frame
#[derive(Clone, PartialEq)]
pub struct ThumbnailImage {
    bytes: Bytes,
    width: u32,
    height: u32,
    /// Encoder quality, 1-100
    quality: u8,
    /// Playback position the frame was taken at, in seconds
    taken_at: f64,
}

impl ThumbnailImage {
    pub fn new(bytes: impl Into<Bytes>, width: u32, height: u32, quality: u8, taken_at: f64) -> Self {
        Self {
            bytes: bytes.into(),
            width,
            height,
            quality,
            taken_at,
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn taken_at(&self) -> f64 {
        self.taken_at
    }

    pub fn mime_type(&self) -> &'static str {
        JPEG_MIME
    }

    /// `data:` URL form, suitable for a poster attribute
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", JPEG_MIME, STANDARD.encode(&self.bytes))
    }
}

impl std::fmt::Debug for ThumbnailImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThumbnailImage")
            .field("len", &self.bytes.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("quality", &self.quality)
            .field("taken_at", &self.taken_at)
            .finish()
    }
}
