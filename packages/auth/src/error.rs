// ABOUTME: Error types for the OAuth2 authorization-code flow
// ABOUTME: One type per flow step so callers can tell bad URLs, port conflicts, and bad credentials apart

use reqwest::StatusCode;
use thiserror::Error;

/// Endpoint configuration was malformed. Raised before any network activity.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {field} URL: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("redirect URI has no host to bind the callback listener on")]
    MissingRedirectHost,
}

/// The local callback listener could not be set up or failed while waiting.
#[derive(Error, Debug)]
pub enum CallbackError {
    #[error("failed to bind callback listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("callback listener I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out waiting for the authorization callback")]
    Timeout,

    #[error("authorization server returned error: {0}")]
    Provider(String),
}

/// A token or refresh exchange against the provider's token endpoint failed.
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("failed to send token request: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("token endpoint returned status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to parse token response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// A silent refresh inside `ensure_valid` failed. The stored token set is
/// left exactly as it was before the call.
#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("token refresh failed: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("no refresh token available")]
    NoRefreshToken,
}

/// An authenticated request failed, either while refreshing the token or on
/// the underlying transport.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error(transparent)]
    Refresh(#[from] RefreshError),

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("access token is not a valid header value: {0}")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),
}

/// First-time login failed. The variant names the step that broke.
#[derive(Error, Debug)]
pub enum LoginError {
    #[error("callback listener failed: {0}")]
    Callback(#[from] CallbackError),

    #[error("token exchange failed: {0}")]
    Exchange(#[from] ExchangeError),
}
