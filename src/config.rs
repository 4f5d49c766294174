//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub endpoints: EndpointsConfig,
    pub account: AccountConfig,
    pub upload: UploadConfig,
    pub media: MediaConfig,
    pub logging: LoggingConfig,
}

/// External service endpoints
///
/// The pipeline talks to three collaborators: the identity provider
/// (password login + account info), the secure-token service (refresh
/// exchange), the object storage service (resumable uploads), and the
/// moment backend (post registration).
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointsConfig {
    /// Identity provider base, e.g. "https://www.googleapis.com/identitytoolkit/v3/relyingparty"
    pub identity_url: String,
    /// Token refresh base, e.g. "https://securetoken.googleapis.com/v1"
    pub token_url: String,
    /// Object storage base, e.g. "https://firebasestorage.googleapis.com/v0"
    pub storage_url: String,
    /// Moment backend base, e.g. "https://api.example.com"
    pub api_url: String,
    /// API key appended to identity and token calls
    pub api_key: String,
}

/// Account credentials used by the CLI to establish a session
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AccountConfig {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Upload tuning
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum output dimension for recompressed images (default: 1020)
    pub max_dimension: u32,
    /// JPEG re-encode quality, 1-100 (default: 90)
    pub jpeg_quality: u8,
    /// Storage bucket for images and thumbnails
    pub image_bucket: String,
    /// Storage bucket for video payloads
    pub video_bucket: String,
}

/// Media tool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Path to the ffmpeg binary (default: "ffmpeg")
    pub ffmpeg_path: String,
    /// Path to the ffprobe binary (default: "ffprobe")
    pub ffprobe_path: String,
    /// Video thumbnail capture offset in seconds, clamped to the
    /// media duration (default: 1.0)
    pub thumbnail_offset_seconds: f64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (MOMENTCAST_*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default(
                "endpoints.identity_url",
                "https://www.googleapis.com/identitytoolkit/v3/relyingparty",
            )?
            .set_default("endpoints.token_url", "https://securetoken.googleapis.com/v1")?
            .set_default(
                "endpoints.storage_url",
                "https://firebasestorage.googleapis.com/v0",
            )?
            .set_default("upload.max_dimension", 1020)?
            .set_default("upload.jpeg_quality", 90)?
            .set_default("upload.image_bucket", "moments-img")?
            .set_default("upload.video_bucket", "moments-video")?
            .set_default("media.ffmpeg_path", "ffmpeg")?
            .set_default("media.ffprobe_path", "ffprobe")?
            .set_default("media.thumbnail_offset_seconds", 1.0)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (MOMENTCAST_*)
            .add_source(
                Environment::with_prefix("MOMENTCAST")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        for (name, value) in [
            ("endpoints.identity_url", &self.endpoints.identity_url),
            ("endpoints.token_url", &self.endpoints.token_url),
            ("endpoints.storage_url", &self.endpoints.storage_url),
            ("endpoints.api_url", &self.endpoints.api_url),
        ] {
            url::Url::parse(value).map_err(|e| {
                crate::error::AppError::Config(format!("{} is not a valid URL: {}", name, e))
            })?;
        }

        if self.upload.max_dimension == 0 {
            return Err(crate::error::AppError::Config(
                "upload.max_dimension must be greater than 0".to_string(),
            ));
        }

        if !(1..=100).contains(&self.upload.jpeg_quality) {
            return Err(crate::error::AppError::Config(
                "upload.jpeg_quality must be between 1 and 100".to_string(),
            ));
        }

        if self.media.thumbnail_offset_seconds < 0.0 {
            return Err(crate::error::AppError::Config(
                "media.thumbnail_offset_seconds must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}
