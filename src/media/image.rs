//! Image recompression
//!
//! Decodes the input, scales it down to a bounded resolution (never up),
//! and re-encodes as JPEG at a fixed quality. The re-encode always runs,
//! even when no scaling occurred, so every uploaded image has a canonical
//! format.

use std::io::Cursor;

use bytes::Bytes;
use image::ImageReader;
use image::codecs::jpeg::JpegEncoder;

use crate::error::{AppError, Result};

/// Recompress an image to fit within `max_dimension` on both axes.
///
/// Scale ratio is `min(max/width, max/height)` capped at 1.0.
///
/// # Errors
/// `MediaDecode` if the input cannot be decoded or re-encoded.
pub fn recompress(data: &[u8], max_dimension: u32, quality: u8) -> Result<Bytes> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| AppError::MediaDecode(format!("unrecognized image data: {}", e)))?
        .decode()
        .map_err(|e| AppError::MediaDecode(format!("image decode failed: {}", e)))?;

    let (width, height) = (img.width(), img.height());
    let (target_width, target_height) = scaled_dimensions(width, height, max_dimension);

    let resized = if (target_width, target_height) == (width, height) {
        img
    } else {
        tracing::debug!(
            width,
            height,
            target_width,
            target_height,
            "Scaling image down"
        );
        img.resize_exact(
            target_width,
            target_height,
            image::imageops::FilterType::Lanczos3,
        )
    };

    // JPEG has no alpha channel; flatten before encoding.
    let rgb = resized.to_rgb8();
    let mut buffer = Vec::with_capacity(data.len());
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buffer), quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| AppError::MediaDecode(format!("jpeg encode failed: {}", e)))?;

    Ok(Bytes::from(buffer))
}

/// Target dimensions after applying the bounded-scale ratio.
///
/// Never upscales and never returns a zero dimension.
fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let ratio = f64::min(
        max_dimension as f64 / width as f64,
        max_dimension as f64 / height as f64,
    )
    .min(1.0);

    let target_width = ((width as f64 * ratio).round() as u32).max(1);
    let target_height = ((height as f64 * ratio).round() as u32).max(1);
    (target_width, target_height)
}
