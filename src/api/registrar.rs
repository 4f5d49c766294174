//! Moment registrar
//!
//! Submits a finished upload descriptor to the moment backend as a new
//! post. One POST, no retries here; any non-2xx is fatal for the attempt.

use std::sync::Arc;

use lazy_static::lazy_static;
use serde_json::{Value, json};

use crate::config::AppConfig;
use crate::data::models::{MediaKind, PostId, UploadDescriptor};
use crate::error::{AppError, Result, response_error_detail};

lazy_static! {
    /// Fixed-shape analytics block the backend schema requires.
    ///
    /// Opaque configuration: it carries no business logic and must be
    /// included verbatim for the call to be accepted. Do not derive
    /// values from it or vary it per request.
    static ref ANALYTICS_PAYLOAD: Value = json!({
        "experiments": {
            "flag_4":  { "@type": "type.googleapis.com/google.protobuf.Int64Value", "value": "43" },
            "flag_10": { "@type": "type.googleapis.com/google.protobuf.Int64Value", "value": "505" },
            "flag_14": { "@type": "type.googleapis.com/google.protobuf.Int64Value", "value": "500" },
            "flag_15": { "@type": "type.googleapis.com/google.protobuf.Int64Value", "value": "501" },
            "flag_16": { "@type": "type.googleapis.com/google.protobuf.Int64Value", "value": "303" },
            "flag_18": { "@type": "type.googleapis.com/google.protobuf.Int64Value", "value": "1203" },
            "flag_19": { "@type": "type.googleapis.com/google.protobuf.Int64Value", "value": "52" },
            "flag_22": { "@type": "type.googleapis.com/google.protobuf.Int64Value", "value": "1203" },
            "flag_23": { "@type": "type.googleapis.com/google.protobuf.Int64Value", "value": "400" },
            "flag_25": { "@type": "type.googleapis.com/google.protobuf.Int64Value", "value": "23" },
        },
        "amplitude": {
            "device_id": "BF5D1FD7-9E4D-4F8B-AB68-B89ED20398A6",
            "session_id": {
                "value": "1722437166613",
                "@type": "type.googleapis.com/google.protobuf.Int64Value",
            },
        },
        "google_analytics": {
            "app_instance_id": "5BDC04DA16FF4B0C9CA14FFB9C502900",
        },
        "platform": "ios",
    });
}

/// Moment registrar
#[derive(Clone)]
pub struct MomentRegistrar {
    http_client: Arc<reqwest::Client>,
    api_url: String,
}

impl MomentRegistrar {
    pub fn new(http_client: Arc<reqwest::Client>, config: &AppConfig) -> Self {
        Self {
            http_client,
            api_url: config.endpoints.api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Register a finished upload as a new moment.
    ///
    /// An empty recipient list means "send to all friends" and is encoded
    /// as the `sent_to_all` flag instead of a recipient array.
    ///
    /// # Errors
    /// `Registration` with the backend's error message on any non-2xx.
    pub async fn register(&self, descriptor: &UploadDescriptor, token: &str) -> Result<PostId> {
        let body = json!({ "data": Self::build_post_data(descriptor) });
        let url = format!("{}/postMomentV2", self.api_url);

        tracing::info!(kind = ?descriptor.kind, "Registering moment");

        let response = self
            .http_client
            .post(&url)
            .header("authorization", format!("Bearer {}", token))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let detail = response_error_detail(response).await;
            return Err(AppError::Registration(detail));
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        let id = body
            .pointer("/result/data/id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(PostId(id))
    }

    /// Assemble the `data` block of the registration payload.
    fn build_post_data(descriptor: &UploadDescriptor) -> Value {
        let mut data = serde_json::Map::new();

        data.insert("caption".to_string(), json!(descriptor.caption));

        match descriptor.kind {
            MediaKind::Image => {
                // Image posts carry their media under thumbnail_url.
                data.insert("thumbnail_url".to_string(), json!(descriptor.media_url));
            }
            MediaKind::Video => {
                data.insert("video_url".to_string(), json!(descriptor.media_url));
                data.insert(
                    "thumbnail_url".to_string(),
                    json!(descriptor.thumbnail_url),
                );
            }
        }

        if descriptor.recipients.is_empty() {
            data.insert("sent_to_all".to_string(), json!(true));
        } else {
            data.insert("recipients".to_string(), json!(descriptor.recipients));
        }

        if !descriptor.caption.is_empty() {
            data.insert(
                "overlays".to_string(),
                json!([caption_overlay(&descriptor.caption)]),
            );
        }

        data.insert("analytics".to_string(), ANALYTICS_PAYLOAD.clone());

        Value::Object(data)
    }
}

/// Standard caption overlay block rendered over the media
fn caption_overlay(caption: &str) -> Value {
    json!({
        "data": {
            "text": caption,
            "text_color": "#FFFFFFE6",
            "type": "standard",
            "max_lines": {
                "@type": "type.googleapis.com/google.protobuf.Int64Value",
                "value": "4",
            },
            "background": { "material_blur": "ultra_thin", "colors": [] },
        },
        "alt_text": caption,
        "overlay_id": "caption:standard",
        "overlay_type": "caption",
    })
}
