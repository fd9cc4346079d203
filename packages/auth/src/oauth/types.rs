// ABOUTME: Core type definitions for the OAuth2 authorization-code flow
// ABOUTME: Credentials, authorization codes, token endpoint responses, and the owned token set

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Client credentials registered with the provider.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

/// Short-lived authorization code captured from the redirect callback.
/// Valid for a single exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode(String);

impl AuthorizationCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Raw token endpoint response body.
///
/// `refresh_token` is optional: refresh responses may omit it, in which case
/// the session keeps the refresh token it already holds.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

/// Token material owned by a [`Session`](crate::oauth::session::Session).
///
/// `expires_at` is stamped from local time when the provider response is
/// parsed, not from a provider-issued timestamp. Network latency between
/// issue and parse is absorbed by the session's refresh buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl TokenSet {
    /// Build a token set from a provider response, stamping the expiry now.
    pub fn from_response(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            token_type: response.token_type,
            refresh_token: response.refresh_token,
            scope: response.scope,
            expires_at: Utc::now() + Duration::seconds(response.expires_in),
        }
    }

    /// Check whether the token is within `buffer` of its expiry (or past it).
    pub fn needs_refresh(&self, buffer: Duration) -> bool {
        Utc::now() + buffer >= self.expires_at
    }

    /// Check whether the token is still usable given the refresh buffer.
    pub fn is_valid(&self, buffer: Duration) -> bool {
        !self.needs_refresh(buffer)
    }
}
