//! JPEG encoding of the capture surface.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::errors::EncodeError;
use crate::surface::CaptureSurface;

/// Map a (0, 1] quality factor onto the encoder's 1-100 scale.
pub fn quality_percent(quality: f32) -> Result<u8, EncodeError> {
    if !(quality > 0.0 && quality <= 1.0) {
        return Err(EncodeError::InvalidQuality(quality));
    }
    Ok(((quality * 100.0).round() as u8).max(1))
}

/// Encode the surface contents as a JPEG.
pub fn encode_jpeg(surface: &CaptureSurface, quality: f32) -> Result<Vec<u8>, EncodeError> {
    if surface.is_empty() {
        return Err(EncodeError::EmptySurface);
    }
    let quality = quality_percent(quality)?;

    let rgb = surface.to_rgb();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality).encode(
        &rgb,
        surface.width(),
        surface.height(),
        ExtendedColorType::Rgb8,
    )?;

    Ok(out)
}
