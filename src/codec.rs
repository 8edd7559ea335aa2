//! Client-side resize and JPEG re-encode of reference images.
//!
//! Reference images are shrunk to a bounding box before upload so that the
//! image hosts and the generation API receive small payloads.

use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use crate::error::BananaError;

/// Bounding box and quality used when re-encoding a reference image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressLimits {
    /// Maximum output width in pixels.
    pub max_width: u32,
    /// Maximum output height in pixels.
    pub max_height: u32,
    /// JPEG quality, 1 to 100.
    pub quality: u8,
}

impl Default for CompressLimits {
    fn default() -> Self {
        Self { max_width: 1024, max_height: 1024, quality: 80 }
    }
}

/// Compute the output size for a `width` x `height` source.
///
/// The scale factor is `min(1, max_width / width, max_height / height)`, so
/// images already inside the box are left alone and the aspect ratio is kept.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn target_dimensions(width: u32, height: u32, limits: &CompressLimits) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    // A zero box still yields a one-pixel image.
    let (max_width, max_height) = (limits.max_width.max(1), limits.max_height.max(1));
    let scale = (f64::from(max_width) / f64::from(width))
        .min(f64::from(max_height) / f64::from(height))
        .min(1.0);
    if scale >= 1.0 {
        return (width, height);
    }

    // Longer side first; the shorter one follows proportionally.
    if width > height {
        let w = ((f64::from(width) * scale).round() as u32).clamp(1, max_width);
        let h = ((f64::from(height) * f64::from(w) / f64::from(width)).round() as u32)
            .clamp(1, max_height);
        (w, h)
    } else {
        let h = ((f64::from(height) * scale).round() as u32).clamp(1, max_height);
        let w = ((f64::from(width) * f64::from(h) / f64::from(height)).round() as u32)
            .clamp(1, max_width);
        (w, h)
    }
}

/// Decode `data`, shrink it into the bounding box and re-encode it as JPEG.
///
/// Returns the bare JPEG bytes (no data-URI prefix). Alpha is dropped.
///
/// # Errors
///
/// Returns [`BananaError::ImageConversion`] if the source cannot be decoded
/// or the JPEG encoder fails.
pub fn compress_image(data: &[u8], limits: &CompressLimits) -> Result<Vec<u8>, BananaError> {
    let img = image::load_from_memory(data)
        .map_err(|e| BananaError::ImageConversion(format!("Failed to decode image: {e}")))?;

    let (width, height) = target_dimensions(img.width(), img.height(), limits);
    let img = if (width, height) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(width, height, FilterType::Triangle)
    };

    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, limits.quality.clamp(1, 100))
        .encode_image(&rgb)
        .map_err(|e| BananaError::ImageConversion(format!("Failed to encode JPEG: {e}")))?;
    Ok(out)
}

/// Base64-encode image bytes for upload.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Strip a `data:<mime>;base64,` prefix, returning the bare payload.
///
/// Input without a data-URI prefix is returned unchanged.
#[must_use]
pub fn strip_data_uri_prefix(input: &str) -> &str {
    if input.starts_with("data:") {
        input.split_once(',').map_or(input, |(_, rest)| rest)
    } else {
        input
    }
}
