//! Momentcast binary entry point
//!
//! Posts a single media file as a moment:
//!
//! ```text
//! momentcast <file> [caption] [recipient-id ...]
//! ```

use std::sync::Arc;

use momentcast::auth::SessionTokenSource;
use momentcast::data::{Draft, MediaAsset, MediaKind};
use momentcast::service::TracingProgressSink;
use momentcast::{AppState, config, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point
///
/// # Steps
/// 1. Initialize tracing/logging
/// 2. Load configuration from file and environment
/// 3. Log in and establish a session
/// 4. Stage the selected file as a draft
/// 5. Run the upload pipeline
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize tracing/logging
    let log_format =
        std::env::var("MOMENTCAST__LOGGING__FORMAT").unwrap_or_else(|_| "pretty".to_string());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "momentcast=info".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "momentcast=info".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    // 2. Load configuration
    let config = config::AppConfig::load()?;

    // 3. Parse arguments
    let mut args = std::env::args().skip(1);
    let Some(file_path) = args.next() else {
        eprintln!("usage: momentcast <file> [caption] [recipient-id ...]");
        std::process::exit(2);
    };
    let caption = args.next().unwrap_or_default();
    let recipients: Vec<String> = args.collect();

    let bytes = tokio::fs::read(&file_path).await?;
    let kind = media_kind_for(&file_path);

    tracing::info!(
        file = %file_path,
        bytes = bytes.len(),
        kind = ?kind,
        "Staging draft"
    );

    // 4. Initialize state and log in
    let state = AppState::new(config)?;

    let session = state
        .identity
        .login(&state.config.account.email, &state.config.account.password)
        .await?;
    let tokens = Arc::new(SessionTokenSource::new(state.identity.clone(), Some(session)));

    let file_name = std::path::Path::new(&file_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_path.clone());

    state.drafts.set(Draft {
        asset: MediaAsset::new(bytes, kind, file_name),
        caption,
        recipients,
    });

    // 5. Run the pipeline
    let orchestrator = state.orchestrator(tokens, Arc::new(TracingProgressSink));
    match orchestrator.post_moment().await {
        Ok(post_id) => {
            if post_id.0.is_empty() {
                tracing::info!("Moment posted");
            } else {
                tracing::info!(post_id = %post_id.0, "Moment posted");
            }
            Ok(())
        }
        Err(error::AppError::Validation(message)) => {
            eprintln!("{}", message);
            std::process::exit(2);
        }
        Err(error) => Err(error.into()),
    }
}

/// Classify the selected file by extension.
///
/// Anything that is not a known video container is treated as an image;
/// the transformer's decode step catches real junk.
fn media_kind_for(path: &str) -> MediaKind {
    let extension = std::path::Path::new(path)
        .extension()
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref().and_then(|e| e.to_str()) {
        Some("mp4") | Some("mov") | Some("webm") | Some("m4v") => MediaKind::Video,
        _ => MediaKind::Image,
    }
}
