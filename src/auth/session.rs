//! Session state
//!
//! A session pairs the short-lived identity token with the long-lived
//! refresh credential. The pipeline borrows it read-only; only a refresh
//! swaps the tokens.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated user session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Short-lived bearer token for outbound calls
    pub id_token: String,
    /// Long-lived credential exchanged for fresh id tokens
    pub refresh_token: String,
    /// Owner identifier assigned by the identity provider
    pub local_id: String,
    /// When the id token expires
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Build a session from a login exchange.
    ///
    /// `expires_in_seconds` comes back from the identity provider as a
    /// string-encoded number of seconds.
    pub fn new(
        id_token: String,
        refresh_token: String,
        local_id: String,
        expires_in_seconds: i64,
    ) -> Self {
        Self {
            id_token,
            refresh_token,
            local_id,
            expires_at: Utc::now() + Duration::seconds(expires_in_seconds),
        }
    }

    /// Check if the id token has expired.
    ///
    /// The orchestrator does not consult this before an attempt; it uses
    /// the current token optimistically and refreshes only after a caught
    /// failure.
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}
