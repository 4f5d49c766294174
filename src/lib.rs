//! Momentcast - a media upload pipeline for moment posts
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Upload Orchestrator                        │
//! │  - per-attempt state machine, progress events               │
//! │  - single silent token refresh on failure                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Pipeline Components                       │
//! │  - media transformer (image recompress, video thumbnail)    │
//! │  - resumable upload client (start / transfer / resolve)     │
//! │  - moment registrar (postMomentV2)                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 External Collaborators (HTTP)                │
//! │  - identity provider (login, token refresh)                 │
//! │  - object storage (resumable sessions, retrieval tokens)    │
//! │  - moment backend (post registration)                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `service`: upload orchestrator and progress reporting
//! - `media`: image recompression and video thumbnail extraction
//! - `storage`: resumable-upload wire protocol and object naming
//! - `api`: moment backend registration
//! - `auth`: identity client, sessions, token source
//! - `data`: domain models and draft state
//! - `config`: configuration management
//! - `error`: error types

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod media;
pub mod service;
pub mod storage;

use std::sync::Arc;

/// Shared application state
///
/// Owns the configuration, the single HTTP client every component
/// borrows, and the pipeline components themselves.
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Shared HTTP client
    pub http_client: Arc<reqwest::Client>,

    /// Identity provider client
    pub identity: auth::IdentityClient,

    /// Resumable upload client
    pub storage: storage::ResumableUploadClient,

    /// Moment registrar
    pub registrar: api::MomentRegistrar,

    /// The user's in-progress post
    pub drafts: Arc<data::DraftStore>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        let http_client = Arc::new(
            reqwest::Client::builder()
                .user_agent("Momentcast/0.1.0")
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .map_err(|e| error::AppError::Internal(e.into()))?,
        );

        let identity = auth::IdentityClient::new(http_client.clone(), &config.endpoints);
        let storage = storage::ResumableUploadClient::new(http_client.clone(), &config);
        let registrar = api::MomentRegistrar::new(http_client.clone(), &config);

        Ok(Self {
            config: Arc::new(config),
            http_client,
            identity,
            storage,
            registrar,
            drafts: Arc::new(data::DraftStore::new()),
        })
    }

    /// Build an upload orchestrator with the ffmpeg-backed thumbnailer.
    pub fn orchestrator(
        &self,
        tokens: Arc<dyn auth::TokenSource>,
        progress: Arc<dyn service::ProgressSink>,
    ) -> service::UploadOrchestrator {
        let thumbnailer = Arc::new(media::FfmpegThumbnailer::new(&self.config.media));
        self.orchestrator_with_thumbnailer(tokens, progress, thumbnailer)
    }

    /// Build an upload orchestrator with a caller-supplied thumbnailer.
    ///
    /// Lets environments without ffmpeg (and the test suite) substitute
    /// their own frame extraction.
    pub fn orchestrator_with_thumbnailer(
        &self,
        tokens: Arc<dyn auth::TokenSource>,
        progress: Arc<dyn service::ProgressSink>,
        thumbnailer: Arc<dyn media::Thumbnailer>,
    ) -> service::UploadOrchestrator {
        service::UploadOrchestrator::new(
            media::MediaTransformer::new(&self.config, thumbnailer),
            self.storage.clone(),
            self.registrar.clone(),
            tokens,
            self.drafts.clone(),
            progress,
        )
    }
}
