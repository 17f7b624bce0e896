//! Capture surface: the transient RGBA raster a frame is drawn onto.

use crate::errors::SourceError;

/// Bytes per RGBA pixel
pub const BYTES_PER_PIXEL: usize = 4;

/// RGBA raster buffer, resized to the video's native dimensions on each
/// capture. Resizing clears the contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl CaptureSurface {
    /// Create an empty 0x0 surface
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cleared surface of the given size
    pub fn with_size(width: u32, height: u32) -> Self {
        let mut surface = Self::new();
        surface.resize(width, height);
        surface
    }

    /// Number of bytes an RGBA buffer of this size needs
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * BYTES_PER_PIXEL
    }

    /// Resize and clear to transparent black
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(Self::byte_len(width, height), 0);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Copy a full RGBA frame into the surface.
    ///
    /// Extra trailing bytes are ignored; a short buffer is rejected and the
    /// surface is left untouched.
    pub fn put_rgba(&mut self, rgba: &[u8]) -> Result<(), SourceError> {
        if self.is_empty() {
            return Err(SourceError::EmptySurface {
                width: self.width,
                height: self.height,
            });
        }

        let expected = self.pixels.len();
        if rgba.len() < expected {
            return Err(SourceError::ShortFrame {
                expected,
                actual: rgba.len(),
            });
        }

        self.pixels.copy_from_slice(&rgba[..expected]);
        Ok(())
    }

    /// Paint every pixel with one colour
    pub fn fill(&mut self, rgba: [u8; 4]) {
        for px in self.pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Drop the alpha channel (JPEG carries none)
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for px in self.pixels.chunks_exact(BYTES_PER_PIXEL) {
            rgb.extend_from_slice(&px[..3]);
        }
        rgb
    }
}
