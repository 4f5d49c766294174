//! Error types for Momentcast
//!
//! All errors in the pipeline are converted to `AppError`. The variants
//! mirror the failure taxonomy of the upload pipeline: authentication,
//! media decoding, the resumable-upload wire protocol, and moment
//! registration, plus the usual configuration/transport buckets.

use thiserror::Error;

/// Application-wide error type
///
/// Every stage of the upload pipeline reports failures through this enum.
/// The orchestrator catches it at the attempt boundary, emits a single
/// user-facing error progress event, and re-throws to the caller.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or rejected credentials
    #[error("Authentication required: {0}")]
    Authentication(String),

    /// Media could not be decoded, probed, or seeked (fatal, no retry)
    #[error("Media decode failed: {0}")]
    MediaDecode(String),

    /// Resumable-upload protocol failure at start/transfer/resolve
    #[error("Upload protocol error: {0}")]
    UploadProtocol(String),

    /// Moment backend rejected the finished descriptor
    #[error("Moment registration failed: {0}")]
    Registration(String),

    /// Invalid caller input (missing draft, empty media, bad arguments)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client error (transport-level, before any status handling)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// Whether a silent token refresh may help a later attempt.
    ///
    /// Local decode failures and caller mistakes are not auth-related;
    /// everything that crossed the network might be.
    pub fn refresh_may_help(&self) -> bool {
        matches!(
            self,
            AppError::Authentication(_)
                | AppError::UploadProtocol(_)
                | AppError::Registration(_)
                | AppError::HttpClient(_)
        )
    }
}

/// Extract the deepest available error detail from a backend response.
///
/// Backends in this pipeline answer errors as `{"error": {"message": ...}}`.
/// That message is preferred over a generic HTTP status string when
/// building user-facing failure text.
pub(crate) async fn response_error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<serde_json::Value>().await {
        Ok(body) => body
            .pointer("/error/message")
            .and_then(|m| m.as_str())
            .map(ToString::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status)),
        Err(_) => format!("HTTP {}", status),
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
