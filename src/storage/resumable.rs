//! Resumable upload client
//!
//! Two-phase "create session, then stream bytes" protocol plus a resolve
//! step that turns the stored object into a retrieval URL:
//!
//! 1. **Start** — POST the namespaced object path with
//!    `uploadType=resumable`; the session URL comes back in the
//!    `x-goog-upload-url` response header, not the body.
//! 2. **Transfer** — PUT the full buffer to the session URL in one shot
//!    (`upload, finalize`, offset 0). A partial failure discards the
//!    session; a fresh Start is required.
//! 3. **Resolve** — GET the object metadata; the retrieval URL is the
//!    canonical path plus `?alt=media&token=<downloadTokens>`.
//!
//! Start and Resolve use the identity `Bearer` scheme. Transfer uses the
//! storage-specific `Firebase` scheme; the distinction is part of the
//! wire contract and must not be collapsed.

use std::sync::Arc;

use bytes::Bytes;

use crate::config::AppConfig;
use crate::error::{AppError, Result, response_error_detail};

use super::object::StorageArea;

/// Fixed client-identification headers the storage service expects on
/// session starts. Opaque configuration, sent verbatim.
const STORAGE_CLIENT_HEADERS: &[(&str, &str)] = &[
    ("accept-language", "en-US"),
    ("x-firebase-storage-version", "ios/10.13.0"),
    ("x-firebase-gmpid", "1:641029076083:ios:cc8eb46290d69b234fa609"),
];

/// Resumable upload client
#[derive(Clone)]
pub struct ResumableUploadClient {
    http_client: Arc<reqwest::Client>,
    storage_url: String,
    image_bucket: String,
    video_bucket: String,
}

impl ResumableUploadClient {
    pub fn new(http_client: Arc<reqwest::Client>, config: &AppConfig) -> Self {
        Self {
            http_client,
            storage_url: config.endpoints.storage_url.trim_end_matches('/').to_string(),
            image_bucket: config.upload.image_bucket.clone(),
            video_bucket: config.upload.video_bucket.clone(),
        }
    }

    fn bucket(&self, area: StorageArea) -> &str {
        match area {
            StorageArea::Thumbnails => &self.image_bucket,
            StorageArea::Videos => &self.video_bucket,
        }
    }

    /// Canonical metadata URL for an object path
    fn canonical_url(&self, area: StorageArea, object_path: &str) -> String {
        format!(
            "{}/b/{}/o/{}",
            self.storage_url,
            self.bucket(area),
            urlencoding::encode(object_path)
        )
    }

    /// Start an upload session.
    ///
    /// # Returns
    /// The session URL granted via the `x-goog-upload-url` header.
    ///
    /// # Errors
    /// `UploadProtocol` on any non-2xx status or when the header is
    /// missing. No PUT may be issued without a session URL.
    pub async fn initiate(
        &self,
        owner_id: &str,
        token: &str,
        byte_length: usize,
        object_path: &str,
        area: StorageArea,
        content_type: &str,
    ) -> Result<String> {
        let url = format!(
            "{}?uploadType=resumable&name={}",
            self.canonical_url(area, object_path),
            urlencoding::encode(object_path)
        );

        tracing::debug!(object_path, byte_length, "Starting resumable upload session");

        let mut request = self
            .http_client
            .post(&url)
            .header("authorization", format!("Bearer {}", token))
            .header("x-goog-upload-protocol", "resumable")
            .header("x-goog-upload-command", "start")
            .header("x-goog-upload-content-length", byte_length.to_string())
            .header("accept", "*/*");
        for (name, value) in STORAGE_CLIENT_HEADERS {
            request = request.header(*name, *value);
        }

        let response = request
            .json(&serde_json::json!({
                "name": object_path,
                "contentType": content_type,
                "bucket": "",
                "metadata": { "creator": owner_id, "visibility": "private" },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let detail = response_error_detail(response).await;
            return Err(AppError::UploadProtocol(format!(
                "upload start rejected: {}",
                detail
            )));
        }

        let session_url = response
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
            .ok_or_else(|| {
                AppError::UploadProtocol(
                    "upload start response missing x-goog-upload-url header".to_string(),
                )
            })?;

        Ok(session_url)
    }

    /// Transfer the full buffer to the session URL and finalize.
    ///
    /// Single-shot: offset 0, command `upload, finalize`. There is no
    /// chunked resumption; on failure the caller starts over.
    pub async fn send(
        &self,
        session_url: &str,
        bytes: Bytes,
        token: &str,
        content_type: &str,
    ) -> Result<()> {
        let byte_length = bytes.len();
        tracing::debug!(byte_length, "Transferring upload payload");

        let response = self
            .http_client
            .put(session_url)
            // Transfer authenticates with the storage-specific scheme,
            // not the Bearer scheme used by start/resolve.
            .header("authorization", format!("Firebase {}", token))
            .header("content-type", content_type)
            .header("x-goog-upload-offset", "0")
            .header("x-goog-upload-command", "upload, finalize")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let detail = response_error_detail(response).await;
            return Err(AppError::UploadProtocol(format!(
                "upload transfer rejected: {}",
                detail
            )));
        }

        Ok(())
    }

    /// Resolve the stored object into a retrieval URL.
    pub async fn resolve(
        &self,
        token: &str,
        object_path: &str,
        area: StorageArea,
    ) -> Result<String> {
        let canonical = self.canonical_url(area, object_path);

        let response = self
            .http_client
            .get(&canonical)
            .header("authorization", format!("Bearer {}", token))
            .send()
            .await?;

        if !response.status().is_success() {
            let detail = response_error_detail(response).await;
            return Err(AppError::UploadProtocol(format!(
                "object resolve rejected: {}",
                detail
            )));
        }

        let body: serde_json::Value = response.json().await?;
        let download_token = body
            .get("downloadTokens")
            .and_then(|t| t.as_str())
            .filter(|t| !t.is_empty())
            .map(ToString::to_string)
            .ok_or_else(|| {
                AppError::UploadProtocol("object metadata missing downloadTokens".to_string())
            })?;

        Ok(format!("{}?alt=media&token={}", canonical, download_token))
    }
}
