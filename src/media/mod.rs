//! Media transformation
//!
//! Normalizes a raw selected file into upload-ready bytes:
//! - images are recompressed to a bounded resolution at fixed quality
//! - videos pass through untouched, with a still-frame thumbnail derived
//!   via ffmpeg and recompressed through the same image path
//!
//! A decode or seek failure is fatal for the attempt; there is no blank
//! thumbnail fallback.

pub mod image;
pub mod video;

use bytes::Bytes;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::data::models::{MediaAsset, MediaKind};
use crate::error::Result;

pub use video::{FfmpegThumbnailer, Thumbnailer};

/// Upload-ready buffers derived from one media asset.
///
/// The source asset is never mutated; only these derived buffers flow
/// downstream.
#[derive(Debug, Clone)]
pub struct TransformedMedia {
    pub media: Bytes,
    pub kind: MediaKind,
    /// Still-frame thumbnail (video assets only)
    pub thumbnail: Option<Bytes>,
}

/// Media transformer
pub struct MediaTransformer {
    max_dimension: u32,
    jpeg_quality: u8,
    thumbnail_offset_seconds: f64,
    thumbnailer: Arc<dyn Thumbnailer>,
}

impl MediaTransformer {
    pub fn new(config: &AppConfig, thumbnailer: Arc<dyn Thumbnailer>) -> Self {
        Self {
            max_dimension: config.upload.max_dimension,
            jpeg_quality: config.upload.jpeg_quality,
            thumbnail_offset_seconds: config.media.thumbnail_offset_seconds,
            thumbnailer,
        }
    }

    /// Transform a selected asset into upload-ready buffers.
    ///
    /// # Errors
    /// `MediaDecode` if the image cannot be decoded or the video frame
    /// cannot be extracted.
    pub async fn transform(&self, asset: &MediaAsset) -> Result<TransformedMedia> {
        match asset.kind {
            MediaKind::Image => {
                let media =
                    image::recompress(&asset.bytes, self.max_dimension, self.jpeg_quality)?;
                Ok(TransformedMedia {
                    media,
                    kind: MediaKind::Image,
                    thumbnail: None,
                })
            }
            MediaKind::Video => {
                let frame = self
                    .thumbnailer
                    .extract_frame(&asset.bytes, self.thumbnail_offset_seconds)
                    .await?;
                // The captured frame goes through the same re-encode step
                // as a selected image.
                let thumbnail =
                    image::recompress(&frame, self.max_dimension, self.jpeg_quality)?;
                Ok(TransformedMedia {
                    media: asset.bytes.clone(),
                    kind: MediaKind::Video,
                    thumbnail: Some(thumbnail),
                })
            }
        }
    }
}
