// ABOUTME: Immutable OAuth2 endpoint configuration with up-front URL validation
// ABOUTME: Holds authorize/token/redirect URLs plus the requested scope and CSRF state

use rand::{distributions::Alphanumeric, Rng};
use url::Url;

use crate::error::ConfigError;

/// Immutable description of the provider endpoints involved in a login.
///
/// All three URLs are validated at construction; a malformed or relative URL
/// never makes it past [`EndpointConfig::new`].
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    authorize_url: Url,
    token_url: Url,
    redirect_uri: Url,
    scope: String,
    state: String,
}

impl EndpointConfig {
    /// Parse and validate the endpoint URLs.
    ///
    /// `state` is the CSRF nonce round-tripped through the authorize
    /// redirect; use [`generate_state`] unless the provider requires a fixed
    /// value.
    pub fn new(
        redirect_uri: &str,
        scope: &str,
        state: &str,
        authorize_url: &str,
        token_url: &str,
    ) -> Result<Self, ConfigError> {
        let authorize_url = parse_url("authorize", authorize_url)?;
        let token_url = parse_url("token", token_url)?;
        let redirect_uri = parse_url("redirect", redirect_uri)?;

        // The callback listener binds on the redirect host; a host-less URI
        // (e.g. mailto:) would only fail much later, at bind time.
        if redirect_uri.host_str().is_none() {
            return Err(ConfigError::MissingRedirectHost);
        }

        Ok(Self {
            authorize_url,
            token_url,
            redirect_uri,
            scope: scope.to_string(),
            state: state.to_string(),
        })
    }

    pub fn authorize_url(&self) -> &Url {
        &self.authorize_url
    }

    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// `host:port` the callback listener binds on, derived from the redirect
    /// URI. The port falls back to the scheme default when not spelled out.
    pub fn redirect_addr(&self) -> String {
        let host = self.redirect_uri.host_str().unwrap_or_default();
        let port = self.redirect_uri.port_or_known_default().unwrap_or(80);
        format!("{}:{}", host, port)
    }

    /// Path component the provider redirects back to.
    pub fn redirect_path(&self) -> &str {
        self.redirect_uri.path()
    }
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { field, source })
}

/// Generate a random alphanumeric CSRF state nonce.
pub fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}
