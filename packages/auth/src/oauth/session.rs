// ABOUTME: Authenticated session owning the token set and the credentials that can renew it
// ABOUTME: Silently refreshes near-expiry tokens before every authenticated request

use chrono::{DateTime, Duration, Utc};
use reqwest::{
    header::{HeaderValue, AUTHORIZATION},
    Client, Request, Response,
};
use tracing::{debug, info};
use url::Url;

use crate::{
    error::{RefreshError, RequestError},
    oauth::{
        exchange::TokenExchanger,
        types::{Credentials, TokenSet},
    },
};

/// Safety margin subtracted from the token lifetime, absorbing clock skew
/// and exchange latency.
pub const DEFAULT_REFRESH_BUFFER_SECS: i64 = 5;

/// A logged-in OAuth2 session.
///
/// The session is the sole owner of its [`TokenSet`]; callers only reach the
/// token through [`Session::ensure_valid`] and [`Session::execute`]. The set
/// lives behind a mutex and is replaced wholesale on refresh while the lock
/// is held, so concurrent callers never observe a partial update and a
/// refresh always completes before the token is used.
pub struct Session {
    credentials: Credentials,
    token_url: Url,
    exchanger: TokenExchanger,
    http: Client,
    tokens: tokio::sync::Mutex<TokenSet>,
    refresh_buffer: Duration,
}

impl Session {
    pub fn new(credentials: Credentials, token_url: Url, tokens: TokenSet) -> Self {
        let http = Client::new();
        Self {
            credentials,
            token_url,
            exchanger: TokenExchanger::with_client(http.clone()),
            http,
            tokens: tokio::sync::Mutex::new(tokens),
            refresh_buffer: Duration::seconds(DEFAULT_REFRESH_BUFFER_SECS),
        }
    }

    /// Override the refresh safety margin.
    pub fn with_refresh_buffer(mut self, buffer: Duration) -> Self {
        self.refresh_buffer = buffer;
        self
    }

    /// Make sure the access token outlives the refresh buffer, refreshing it
    /// through the token endpoint when it does not.
    ///
    /// On refresh failure the stored token set is left exactly as it was;
    /// the caller may keep using the soon-to-expire token or give up.
    pub async fn ensure_valid(&self) -> Result<(), RefreshError> {
        self.fresh_access_token().await.map(drop)
    }

    /// Perform `request` with `Authorization: Bearer <token>` attached,
    /// refreshing the token first when needed. The response is returned
    /// untouched.
    pub async fn execute(&self, mut request: Request) -> Result<Response, RequestError> {
        let access_token = self.fresh_access_token().await?;

        let bearer = HeaderValue::from_str(&format!("Bearer {}", access_token))?;
        request.headers_mut().insert(AUTHORIZATION, bearer);

        self.http
            .execute(request)
            .await
            .map_err(RequestError::Transport)
    }

    /// Current access token. May be stale; prefer [`Session::execute`].
    pub async fn access_token(&self) -> String {
        self.tokens.lock().await.access_token.clone()
    }

    /// Refresh token on file, if the provider issued one.
    pub async fn refresh_token(&self) -> Option<String> {
        self.tokens.lock().await.refresh_token.clone()
    }

    /// Instant the current access token expires.
    pub async fn expires_at(&self) -> DateTime<Utc> {
        self.tokens.lock().await.expires_at
    }

    /// Validate-or-refresh under the lock, returning a token guaranteed to
    /// have been valid when it was read.
    async fn fresh_access_token(&self) -> Result<String, RefreshError> {
        let mut tokens = self.tokens.lock().await;

        if tokens.is_valid(self.refresh_buffer) {
            debug!("access token still valid, no refresh needed");
            return Ok(tokens.access_token.clone());
        }

        let refresh_token = tokens
            .refresh_token
            .clone()
            .ok_or(RefreshError::NoRefreshToken)?;

        let mut refreshed = self
            .exchanger
            .exchange_refresh_token(&self.token_url, &refresh_token, &self.credentials)
            .await?;

        // The provider may omit a new refresh token; keep the one we have
        // rather than losing it to an empty value.
        if refreshed.refresh_token.is_none() {
            refreshed.refresh_token = Some(refresh_token);
        }

        info!("access token refreshed, next expiry {}", refreshed.expires_at);
        *tokens = refreshed;
        Ok(tokens.access_token.clone())
    }
}
