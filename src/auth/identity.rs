//! Identity provider client
//!
//! Speaks the password-login and refresh-token exchanges:
//! - `verifyPassword` with `{email, password, clientType, returnSecureToken}`
//! - secure-token `{grant_type: "refresh_token", refreshToken}`
//! - `getAccountInfo` with the current id token

use std::sync::Arc;

use serde::Deserialize;

use crate::config::EndpointsConfig;
use crate::error::{AppError, Result, response_error_detail};

use super::session::Session;

/// Tokens minted by a refresh exchange
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshedTokens {
    #[serde(rename = "access_token")]
    pub access_token: String,
    #[serde(rename = "refresh_token")]
    pub refresh_token: String,
    /// String-encoded seconds until the new token expires
    #[serde(rename = "expires_in", default)]
    pub expires_in: Option<String>,
}

/// Account metadata returned by the identity provider
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    #[serde(rename = "localId")]
    pub local_id: String,
    #[serde(rename = "email", default)]
    pub email: Option<String>,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(rename = "idToken")]
    id_token: String,
    #[serde(rename = "refreshToken")]
    refresh_token: String,
    #[serde(rename = "localId")]
    local_id: String,
    #[serde(rename = "expiresIn")]
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct AccountInfoResponse {
    users: Vec<AccountInfo>,
}

/// Fixed client-identification headers the identity provider expects on
/// every call. Opaque configuration, sent verbatim.
const IDENTITY_CLIENT_HEADERS: &[(&str, &str)] = &[
    ("accept-language", "en-US"),
    ("x-client-version", "iOS/FirebaseSDK/10.23.1/FirebaseCore-iOS"),
    ("x-firebase-gmpid", "1:641029076083:ios:cc8eb46290d69b234fa606"),
];

/// Identity provider client
#[derive(Clone)]
pub struct IdentityClient {
    http_client: Arc<reqwest::Client>,
    identity_url: String,
    token_url: String,
    api_key: String,
}

impl IdentityClient {
    pub fn new(http_client: Arc<reqwest::Client>, endpoints: &EndpointsConfig) -> Self {
        Self {
            http_client,
            identity_url: endpoints.identity_url.trim_end_matches('/').to_string(),
            token_url: endpoints.token_url.trim_end_matches('/').to_string(),
            api_key: endpoints.api_key.clone(),
        }
    }

    fn post_json(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.http_client.post(url);
        for (name, value) in IDENTITY_CLIENT_HEADERS {
            request = request.header(*name, *value);
        }
        request
    }

    /// Exchange email/password for a session
    ///
    /// # Errors
    /// Returns `Authentication` with the provider's error message on a
    /// rejected login.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let url = format!("{}/verifyPassword?key={}", self.identity_url, self.api_key);

        let response = self
            .post_json(&url)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "clientType": "CLIENT_TYPE_IOS",
                "returnSecureToken": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let detail = response_error_detail(response).await;
            return Err(AppError::Authentication(detail));
        }

        let login: LoginResponse = response.json().await?;
        let expires_in = login.expires_in.parse::<i64>().unwrap_or(3600);

        tracing::info!(local_id = %login.local_id, "Login succeeded");

        Ok(Session::new(
            login.id_token,
            login.refresh_token,
            login.local_id,
            expires_in,
        ))
    }

    /// Mint a new short-lived token from the refresh credential
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens> {
        let url = format!("{}/token?key={}", self.token_url, self.api_key);

        let response = self
            .post_json(&url)
            .json(&serde_json::json!({
                "grant_type": "refresh_token",
                "refreshToken": refresh_token,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let detail = response_error_detail(response).await;
            return Err(AppError::Authentication(detail));
        }

        let tokens: RefreshedTokens = response.json().await?;
        tracing::debug!("Token refresh succeeded");
        Ok(tokens)
    }

    /// Fetch account metadata for the current id token
    pub async fn account_info(&self, id_token: &str) -> Result<AccountInfo> {
        let url = format!("{}/getAccountInfo?key={}", self.identity_url, self.api_key);

        let response = self
            .post_json(&url)
            .json(&serde_json::json!({ "idToken": id_token }))
            .send()
            .await?;

        if !response.status().is_success() {
            let detail = response_error_detail(response).await;
            return Err(AppError::Authentication(detail));
        }

        let info: AccountInfoResponse = response.json().await?;
        info.users
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Authentication("account not found".to_string()))
    }
}
