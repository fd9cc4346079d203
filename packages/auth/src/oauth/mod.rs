// ABOUTME: OAuth2 authorization-code flow: endpoint config, callback listener, token exchange, session
// ABOUTME: The polling loop and data sink live elsewhere; they only consume Session::execute

pub mod client;
pub mod config;
pub mod exchange;
pub mod server;
pub mod session;
pub mod types;

pub use client::OAuthClient;
pub use config::{generate_state, EndpointConfig};
pub use exchange::TokenExchanger;
pub use server::CallbackServer;
pub use session::{Session, DEFAULT_REFRESH_BUFFER_SECS};
pub use types::{AuthorizationCode, Credentials, TokenResponse, TokenSet};
