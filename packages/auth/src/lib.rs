// ABOUTME: Playlog authentication library: OAuth2 authorization-code login and token sessions
// ABOUTME: Interactive browser handshake, code exchange, and transparent token refresh

pub mod error;
pub mod oauth;

// Re-export main types
pub use error::{
    CallbackError, ConfigError, ExchangeError, LoginError, RefreshError, RequestError,
};
pub use oauth::{
    generate_state, AuthorizationCode, CallbackServer, Credentials, EndpointConfig, OAuthClient,
    Session, TokenExchanger, TokenResponse, TokenSet, DEFAULT_REFRESH_BUFFER_SECS,
};
