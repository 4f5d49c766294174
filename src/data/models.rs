//! Data models for the upload pipeline

use bytes::Bytes;

/// Declared MIME category of a selected file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// File extension used when deriving object names
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Video => "mp4",
        }
    }

    /// Content type declared in the resumable-upload start body
    pub fn declared_content_type(&self) -> &'static str {
        match self {
            MediaKind::Image => "image/*",
            MediaKind::Video => "video/mp4",
        }
    }

    /// Content type of the bytes actually transferred
    pub fn transfer_content_type(&self) -> &'static str {
        match self {
            MediaKind::Image => "image/jpeg",
            MediaKind::Video => "application/octet-stream",
        }
    }
}

/// In-memory representation of the user-selected file.
///
/// Created on file selection, consumed by a single upload attempt and
/// discarded afterwards. Never mutated once the transformer has produced
/// its output; only the derived buffer flows downstream.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub bytes: Bytes,
    pub kind: MediaKind,
    pub file_name: String,
}

impl MediaAsset {
    pub fn new(bytes: impl Into<Bytes>, kind: MediaKind, file_name: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            kind,
            file_name: file_name.into(),
        }
    }
}

/// The user's in-progress, not-yet-submitted post state
#[derive(Debug, Clone)]
pub struct Draft {
    pub asset: MediaAsset,
    pub caption: String,
    /// Recipient identifiers; empty means "all friends"
    pub recipients: Vec<String>,
}

/// Finished upload, ready to register as a moment.
///
/// Constructed only after every required storage resolve has yielded a
/// retrieval URL, and consumed exactly once by the registrar.
#[derive(Debug, Clone)]
pub struct UploadDescriptor {
    pub caption: String,
    /// Retrieval URL of the primary media object
    pub media_url: String,
    /// Retrieval URL of the derived thumbnail (video posts only)
    pub thumbnail_url: Option<String>,
    pub recipients: Vec<String>,
    pub kind: MediaKind,
}

impl UploadDescriptor {
    pub fn for_image(caption: String, media_url: String, recipients: Vec<String>) -> Self {
        Self {
            caption,
            media_url,
            thumbnail_url: None,
            recipients,
            kind: MediaKind::Image,
        }
    }

    pub fn for_video(
        caption: String,
        media_url: String,
        thumbnail_url: String,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            caption,
            media_url,
            thumbnail_url: Some(thumbnail_url),
            recipients,
            kind: MediaKind::Video,
        }
    }
}

/// Identifier of a registered moment.
///
/// May be empty when the backend does not echo an id in its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostId(pub String);

/// Stages of one upload attempt, in order.
///
/// `UploadingThumbnail` only occurs on the video path. Terminal stages
/// (`Completed`, `Failed`) are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Processing,
    InitiatingUpload,
    Uploading,
    UploadingThumbnail,
    FetchingDownloadUrl,
    CreatingMoment,
    Completed,
    Failed,
}

impl UploadStage {
    /// Human-readable stage label
    pub fn label(&self, kind: MediaKind) -> &'static str {
        match (self, kind) {
            (UploadStage::Processing, MediaKind::Image) => "Processing image",
            (UploadStage::Processing, MediaKind::Video) => "Processing video",
            (UploadStage::InitiatingUpload, _) => "Initiating upload",
            (UploadStage::Uploading, MediaKind::Image) => "Uploading image",
            (UploadStage::Uploading, MediaKind::Video) => "Uploading video",
            (UploadStage::UploadingThumbnail, _) => "Uploading video thumbnail",
            (UploadStage::FetchingDownloadUrl, _) => "Fetching download URL",
            (UploadStage::CreatingMoment, _) => "Creating moment",
            (UploadStage::Completed, _) => "Upload completed",
            (UploadStage::Failed, _) => "Upload failed",
        }
    }

    /// Fixed progress percentage for this stage.
    ///
    /// Chosen to be monotonically increasing and roughly proportional to
    /// expected wall-clock cost. `Failed` carries no percent of its own;
    /// the orchestrator re-emits the last reached value.
    pub fn percent(&self, kind: MediaKind) -> u8 {
        match kind {
            MediaKind::Image => match self {
                UploadStage::Processing => 0,
                UploadStage::InitiatingUpload => 24,
                UploadStage::Uploading => 42,
                UploadStage::FetchingDownloadUrl => 66,
                UploadStage::CreatingMoment => 80,
                UploadStage::Completed => 100,
                // Image path has no thumbnail stage
                UploadStage::UploadingThumbnail => 42,
                UploadStage::Failed => 100,
            },
            MediaKind::Video => match self {
                UploadStage::Processing => 0,
                UploadStage::InitiatingUpload => 10,
                UploadStage::Uploading => 26,
                UploadStage::UploadingThumbnail => 48,
                UploadStage::FetchingDownloadUrl => 60,
                UploadStage::CreatingMoment => 88,
                UploadStage::Completed => 100,
                UploadStage::Failed => 100,
            },
        }
    }
}

/// Severity of a progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressKind {
    Info,
    Success,
    Error,
}

/// One step of the human-readable progress indicator.
///
/// Percentages form a strictly increasing sequence within an attempt;
/// the only re-emission is the terminal error event on failure.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub stage: UploadStage,
    pub percent: u8,
    pub kind: ProgressKind,
    pub message: String,
}

impl ProgressEvent {
    pub fn stage(stage: UploadStage, kind: MediaKind) -> Self {
        Self {
            stage,
            percent: stage.percent(kind),
            kind: if stage == UploadStage::Completed {
                ProgressKind::Success
            } else {
                ProgressKind::Info
            },
            message: stage.label(kind).to_string(),
        }
    }

    pub fn error(message: impl Into<String>, percent: u8) -> Self {
        Self {
            stage: UploadStage::Failed,
            percent,
            kind: ProgressKind::Error,
            message: message.into(),
        }
    }
}
