//! Video thumbnail extraction
//!
//! Captures a single decoded frame at a fixed offset (clamped to the
//! media duration) by shelling out to ffmpeg/ffprobe through temp files.
//! The primary video bytes are never transcoded.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;

use crate::config::MediaConfig;
use crate::error::{AppError, Result};

/// Still-frame extraction seam.
///
/// The production implementation shells out to ffmpeg; tests substitute
/// doubles so the pipeline can run without the binary installed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Thumbnailer: Send + Sync {
    /// Capture one frame at `offset_seconds` (clamped to the duration)
    /// and return it as an encoded still image.
    async fn extract_frame(&self, video: &[u8], offset_seconds: f64) -> Result<Bytes>;
}

/// ffmpeg-backed thumbnailer
pub struct FfmpegThumbnailer {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl FfmpegThumbnailer {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
        }
    }

    /// Probe the container duration in seconds
    async fn probe_duration(&self, input: &Path) -> Result<f64> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(input)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| AppError::MediaDecode(format!("ffprobe failed to start: {}", e)))?;

        if !output.status.success() {
            return Err(AppError::MediaDecode(format!(
                "ffprobe exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse::<f64>()
            .map_err(|_| AppError::MediaDecode("could not parse video duration".to_string()))
    }
}

#[async_trait]
impl Thumbnailer for FfmpegThumbnailer {
    async fn extract_frame(&self, video: &[u8], offset_seconds: f64) -> Result<Bytes> {
        let input = tempfile::Builder::new()
            .suffix(".mp4")
            .tempfile()
            .map_err(|e| AppError::Internal(e.into()))?;
        tokio::fs::write(input.path(), video)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        let duration = self.probe_duration(input.path()).await?;
        let offset = offset_seconds.min(duration).max(0.0);

        let output_file = tempfile::Builder::new()
            .suffix(".jpg")
            .tempfile()
            .map_err(|e| AppError::Internal(e.into()))?;

        tracing::debug!(offset, duration, "Extracting video thumbnail frame");

        let output = Command::new(&self.ffmpeg_path)
            .args(["-ss", &offset.to_string(), "-i"])
            .arg(input.path())
            .args(["-vframes", "1", "-q:v", "2", "-y"])
            .arg(output_file.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| AppError::MediaDecode(format!("ffmpeg failed to start: {}", e)))?;

        if !output.status.success() {
            return Err(AppError::MediaDecode(format!(
                "frame extraction exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let frame = tokio::fs::read(output_file.path())
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        if frame.is_empty() {
            return Err(AppError::MediaDecode(
                "frame extraction produced no output".to_string(),
            ));
        }

        Ok(Bytes::from(frame))
    }
}
