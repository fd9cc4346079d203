// ABOUTME: Orchestrator for first-time login: authorize URL, callback wait, code exchange
// ABOUTME: Produces a Session that can refresh itself for the rest of the process lifetime

use std::time::Duration;

use tracing::info;
use url::Url;

use crate::{
    error::LoginError,
    oauth::{
        config::EndpointConfig,
        exchange::TokenExchanger,
        server::CallbackServer,
        session::Session,
        types::Credentials,
    },
};

/// Drives the interactive authorization-code handshake.
///
/// Login is a one-time sequential flow: bind the local listener, hand the
/// authorize URL to the operator, block until the provider redirects back
/// with a state-matching code, exchange it, and wrap the result in a
/// [`Session`]. How the URL reaches the operator is the caller's business;
/// `login` only hands it to the `present` closure.
pub struct OAuthClient {
    config: EndpointConfig,
    exchanger: TokenExchanger,
    login_timeout: Option<Duration>,
}

impl OAuthClient {
    pub fn new(config: EndpointConfig) -> Self {
        Self {
            config,
            exchanger: TokenExchanger::new(),
            login_timeout: None,
        }
    }

    /// Bound the callback wait. By default login blocks until the operator
    /// completes the flow, however long that takes.
    pub fn with_login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = Some(timeout);
        self
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// Authorize URL the operator must visit, with the standard
    /// authorization-code query parameters appended.
    pub fn authorize_url(&self, client_id: &str) -> Url {
        let mut url = self.config.authorize_url().clone();
        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", self.config.redirect_uri().as_str())
            .append_pair("state", self.config.state())
            .append_pair("scope", self.config.scope());
        url
    }

    /// Perform the full interactive login and return a live [`Session`].
    ///
    /// The listener is bound before the URL is presented, so a port conflict
    /// surfaces immediately and an eager browser cannot race the bind. Any
    /// failing sub-step aborts the login with that step's error; no partial
    /// session is ever returned.
    pub async fn login<F>(
        &self,
        credentials: Credentials,
        present: F,
    ) -> Result<Session, LoginError>
    where
        F: FnOnce(&Url),
    {
        let server = CallbackServer::bind(&self.config).await?;

        let authorize_url = self.authorize_url(&credentials.client_id);
        present(&authorize_url);
        info!(
            "waiting for authorization callback on {}",
            self.config.redirect_addr()
        );

        let code = match self.login_timeout {
            Some(timeout) => server.wait_for_code_timeout(timeout).await?,
            None => server.wait_for_code().await?,
        };

        let tokens = self
            .exchanger
            .exchange_code(
                self.config.token_url(),
                &code,
                self.config.redirect_uri(),
                &credentials,
            )
            .await?;

        info!("login complete");
        Ok(Session::new(
            credentials,
            self.config.token_url().clone(),
            tokens,
        ))
    }
}
