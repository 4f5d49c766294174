//! Token source
//!
//! The orchestrator depends on this narrow contract instead of the full
//! session layer. Policy: tokens are used optimistically; a refresh is
//! requested reactively after a caught failure and never triggers an
//! automatic replay of the failed call.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{AppError, Result};

use super::identity::IdentityClient;
use super::session::Session;

/// Bearer-token supplier for outbound pipeline calls
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Whether a session exists at all (presence check, not expiry)
    async fn is_authenticated(&self) -> bool;

    /// Current bearer token
    async fn current_token(&self) -> Result<String>;

    /// Owner identifier for object paths and metadata
    async fn owner_id(&self) -> Result<String>;

    /// Mint a new token from the refresh credential and store it for the
    /// next attempt. Does not replay any failed call.
    async fn refresh(&self) -> Result<()>;
}

/// Session-backed token source
pub struct SessionTokenSource {
    identity: IdentityClient,
    session: RwLock<Option<Session>>,
}

impl SessionTokenSource {
    pub fn new(identity: IdentityClient, session: Option<Session>) -> Self {
        Self {
            identity,
            session: RwLock::new(session),
        }
    }

    /// Install a session after login
    pub async fn set_session(&self, session: Session) {
        *self.session.write().await = Some(session);
    }

    /// Snapshot of the current session
    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }
}

#[async_trait]
impl TokenSource for SessionTokenSource {
    async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    async fn current_token(&self) -> Result<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.id_token.clone())
            .ok_or_else(|| AppError::Authentication("no active session".to_string()))
    }

    async fn owner_id(&self) -> Result<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.local_id.clone())
            .ok_or_else(|| AppError::Authentication("no active session".to_string()))
    }

    async fn refresh(&self) -> Result<()> {
        let refresh_token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.refresh_token.clone())
            .ok_or_else(|| AppError::Authentication("no active session".to_string()))?;

        let tokens = self.identity.refresh(&refresh_token).await?;

        let expires_in = tokens
            .expires_in
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(3600);

        let mut guard = self.session.write().await;
        if let Some(session) = guard.as_mut() {
            session.id_token = tokens.access_token;
            session.refresh_token = tokens.refresh_token;
            session.expires_at = chrono::Utc::now() + chrono::Duration::seconds(expires_in);
        }

        tracing::info!("Session tokens refreshed");
        Ok(())
    }
}
