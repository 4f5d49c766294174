//! Upload orchestrator
//!
//! Sequences one end-to-end upload attempt:
//!
//! ```text
//! Idle → Processing → InitiatingUpload → Uploading
//!      → [video: UploadingThumbnail] → FetchingDownloadUrl
//!      → CreatingMoment → Completed | Failed
//! ```
//!
//! Each transition emits one progress event before doing its work.
//! Terminal states are absorbing: `Completed` clears the draft, `Failed`
//! preserves it so a retry reuses the user's input. On failure the
//! orchestrator attempts exactly one silent token refresh for the next
//! attempt and never replays the failed call.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::api::MomentRegistrar;
use crate::auth::TokenSource;
use crate::data::draft::DraftSink;
use crate::data::models::{
    Draft, MediaKind, PostId, ProgressEvent, UploadDescriptor, UploadStage,
};
use crate::error::{AppError, Result};
use crate::media::MediaTransformer;
use crate::storage::{ObjectPurpose, ResumableUploadClient, StorageArea, object_name, object_path};

use super::progress::ProgressSink;

/// Upload orchestrator
///
/// Depends only on narrow seams (`TokenSource`, `DraftSink`,
/// `ProgressSink`) supplied by the caller; no ambient state.
pub struct UploadOrchestrator {
    transformer: MediaTransformer,
    storage: ResumableUploadClient,
    registrar: MomentRegistrar,
    tokens: Arc<dyn TokenSource>,
    drafts: Arc<dyn DraftSink>,
    progress: Arc<dyn ProgressSink>,
    /// One attempt at a time. A flag, not a lock: the UI contract
    /// disables submission while an attempt is in flight.
    in_flight: AtomicBool,
}

impl UploadOrchestrator {
    pub fn new(
        transformer: MediaTransformer,
        storage: ResumableUploadClient,
        registrar: MomentRegistrar,
        tokens: Arc<dyn TokenSource>,
        drafts: Arc<dyn DraftSink>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            transformer,
            storage,
            registrar,
            tokens,
            drafts,
            progress,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run one upload attempt for the current draft.
    ///
    /// # Errors
    /// Re-throws the failing stage's error after emitting the terminal
    /// error event; the draft is left untouched on failure.
    pub async fn post_moment(&self) -> Result<PostId> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(AppError::Validation(
                "an upload attempt is already in flight".to_string(),
            ));
        }
        let result = self.run_attempt().await;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn run_attempt(&self) -> Result<PostId> {
        // Entry guard: a draft with media and an authenticated session.
        if !self.tokens.is_authenticated().await {
            self.progress
                .emit(ProgressEvent::error("User not authenticated", 0))
                .await;
            return Err(AppError::Authentication("no active session".to_string()));
        }

        let Some(draft) = self.drafts.current() else {
            self.progress
                .emit(ProgressEvent::error("No media selected", 0))
                .await;
            return Err(AppError::Validation("no draft to post".to_string()));
        };

        let kind = draft.asset.kind;
        let mut last_percent = 0;

        let result = match kind {
            MediaKind::Image => self.attempt_image(&draft, &mut last_percent).await,
            MediaKind::Video => self.attempt_video(&draft, &mut last_percent).await,
        };

        match result {
            Ok(post_id) => {
                // Completed is absorbing: the draft is consumed.
                self.drafts.clear();
                self.emit(UploadStage::Completed, kind, &mut last_percent)
                    .await;
                tracing::info!(post_id = %post_id.0, "Moment posted");
                Ok(post_id)
            }
            Err(error) => {
                if error.refresh_may_help() {
                    // Best-effort silent renewal for the next attempt;
                    // the failed call is not replayed.
                    if let Err(refresh_error) = self.tokens.refresh().await {
                        tracing::warn!(%refresh_error, "Token refresh after failure also failed");
                    }
                }
                self.progress
                    .emit(ProgressEvent::error(
                        format!("Error: {}", error),
                        last_percent,
                    ))
                    .await;
                tracing::error!(%error, "Upload attempt failed");
                Err(error)
            }
        }
    }

    async fn attempt_image(&self, draft: &Draft, last_percent: &mut u8) -> Result<PostId> {
        let kind = MediaKind::Image;

        self.emit(UploadStage::Processing, kind, last_percent).await;
        let transformed = self.transformer.transform(&draft.asset).await?;

        let token = self.tokens.current_token().await?;
        let owner = self.tokens.owner_id().await?;

        let name = object_name(ObjectPurpose::Moment, kind.extension());
        let path = object_path(&owner, StorageArea::Thumbnails, &name);

        self.emit(UploadStage::InitiatingUpload, kind, last_percent)
            .await;
        let session_url = self
            .storage
            .initiate(
                &owner,
                &token,
                transformed.media.len(),
                &path,
                StorageArea::Thumbnails,
                kind.declared_content_type(),
            )
            .await?;

        self.emit(UploadStage::Uploading, kind, last_percent).await;
        // The transformed buffer is moved into the transfer; nothing
        // retains it past this point.
        self.storage
            .send(
                &session_url,
                transformed.media,
                &token,
                kind.transfer_content_type(),
            )
            .await?;

        self.emit(UploadStage::FetchingDownloadUrl, kind, last_percent)
            .await;
        let media_url = self
            .storage
            .resolve(&token, &path, StorageArea::Thumbnails)
            .await?;

        self.emit(UploadStage::CreatingMoment, kind, last_percent)
            .await;
        let descriptor = UploadDescriptor::for_image(
            draft.caption.clone(),
            media_url,
            draft.recipients.clone(),
        );
        self.registrar.register(&descriptor, &token).await
    }

    async fn attempt_video(&self, draft: &Draft, last_percent: &mut u8) -> Result<PostId> {
        let kind = MediaKind::Video;

        self.emit(UploadStage::Processing, kind, last_percent).await;
        let transformed = self.transformer.transform(&draft.asset).await?;
        let thumbnail = transformed.thumbnail.clone().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("video transform produced no thumbnail"))
        })?;

        let token = self.tokens.current_token().await?;
        let owner = self.tokens.owner_id().await?;

        let video_name = object_name(ObjectPurpose::Moment, kind.extension());
        let video_path = object_path(&owner, StorageArea::Videos, &video_name);

        self.emit(UploadStage::InitiatingUpload, kind, last_percent)
            .await;
        let video_session = self
            .storage
            .initiate(
                &owner,
                &token,
                transformed.media.len(),
                &video_path,
                StorageArea::Videos,
                kind.declared_content_type(),
            )
            .await?;

        self.emit(UploadStage::Uploading, kind, last_percent).await;
        self.storage
            .send(
                &video_session,
                transformed.media,
                &token,
                kind.transfer_content_type(),
            )
            .await?;

        // The thumbnail is uploaded second on purpose: its object name is
        // timestamped after the media transfer finished.
        self.emit(UploadStage::UploadingThumbnail, kind, last_percent)
            .await;
        let thumb_name = object_name(ObjectPurpose::Thumbnail, "jpg");
        let thumb_path = object_path(&owner, StorageArea::Thumbnails, &thumb_name);
        let thumb_session = self
            .storage
            .initiate(
                &owner,
                &token,
                thumbnail.len(),
                &thumb_path,
                StorageArea::Thumbnails,
                MediaKind::Image.declared_content_type(),
            )
            .await?;
        self.storage
            .send(
                &thumb_session,
                thumbnail,
                &token,
                MediaKind::Image.transfer_content_type(),
            )
            .await?;

        self.emit(UploadStage::FetchingDownloadUrl, kind, last_percent)
            .await;
        let video_url = self
            .storage
            .resolve(&token, &video_path, StorageArea::Videos)
            .await?;
        let thumbnail_url = self
            .storage
            .resolve(&token, &thumb_path, StorageArea::Thumbnails)
            .await?;

        self.emit(UploadStage::CreatingMoment, kind, last_percent)
            .await;
        let descriptor = UploadDescriptor::for_video(
            draft.caption.clone(),
            video_url,
            thumbnail_url,
            draft.recipients.clone(),
        );
        self.registrar.register(&descriptor, &token).await
    }

    /// Emit the stage's progress event and remember its percent for the
    /// terminal error re-emission.
    async fn emit(&self, stage: UploadStage, kind: MediaKind, last_percent: &mut u8) {
        let event = ProgressEvent::stage(stage, kind);
        *last_percent = event.percent;
        self.progress.emit(event).await;
    }
}
