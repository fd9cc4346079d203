// ABOUTME: Local HTTP callback listener for the authorization redirect
// ABOUTME: Accepts connections until a state-matching callback delivers the authorization code

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use tracing::{debug, error, info};

use crate::{
    error::CallbackError,
    oauth::{config::EndpointConfig, types::AuthorizationCode},
};

/// Short-lived listener for the provider's redirect back to this machine.
///
/// Bound separately from the wait so the caller can open the listener before
/// presenting the authorize URL; an eager browser can never hit a closed
/// port. The code is delivered as the return value of the wait: the accept
/// loop owns it end to end, so it can only be produced once.
pub struct CallbackServer {
    listener: TcpListener,
    path: String,
    expected_state: String,
}

impl CallbackServer {
    /// Bind on the host:port of the configured redirect URI.
    pub async fn bind(config: &EndpointConfig) -> Result<Self, CallbackError> {
        let addr = config.redirect_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| CallbackError::Bind {
                addr: addr.clone(),
                source,
            })?;

        info!("callback listener bound on {}", addr);

        Ok(Self {
            listener,
            path: config.redirect_path().to_string(),
            expected_state: config.state().to_string(),
        })
    }

    /// Local address the listener is bound on.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Wait until a callback with the expected state delivers a code.
    ///
    /// Requests with the wrong path, a missing or mismatched `state`, or no
    /// `code` are answered and ignored; the wait continues. Only a
    /// state-matching callback terminates it, so a forged or replayed
    /// redirect can never produce a code. Blocks indefinitely when no such
    /// callback arrives; see [`CallbackServer::wait_for_code_timeout`].
    pub async fn wait_for_code(self) -> Result<AuthorizationCode, CallbackError> {
        self.run().await
    }

    /// Like [`CallbackServer::wait_for_code`], but gives up after `timeout`
    /// with [`CallbackError::Timeout`].
    pub async fn wait_for_code_timeout(
        self,
        timeout: Duration,
    ) -> Result<AuthorizationCode, CallbackError> {
        match tokio::time::timeout(timeout, self.run()).await {
            Ok(result) => result,
            Err(_) => Err(CallbackError::Timeout),
        }
    }

    async fn run(self) -> Result<AuthorizationCode, CallbackError> {
        loop {
            // Only accept() failures are fatal: a broken individual
            // connection (reset, truncated request) is dropped and the wait
            // goes on, exactly like a forged callback.
            let (mut stream, peer_addr) = self.listener.accept().await?;
            debug!("received connection from {}", peer_addr);

            let request = match Self::read_request_head(&mut stream).await {
                Ok(request) => request,
                Err(e) => {
                    debug!("dropping connection from {}: {}", peer_addr, e);
                    continue;
                }
            };

            let Some(target) = Self::request_target(&request) else {
                let _ = stream
                    .write_all(Self::plain_response(400, "Bad Request").as_bytes())
                    .await;
                continue;
            };

            let (path, query) = match target.split_once('?') {
                Some((path, query)) => (path, query),
                None => (target, ""),
            };

            if path != self.path {
                debug!("ignoring request for unexpected path {}", path);
                let _ = stream
                    .write_all(Self::plain_response(404, "Not Found").as_bytes())
                    .await;
                continue;
            }

            let params = Self::parse_query(query);

            // CSRF guard: anything without the expected state is answered
            // and forgotten, whether it is a forged request, a browser
            // prefetch, or a replayed old callback.
            if params.get("state").map(String::as_str) != Some(self.expected_state.as_str()) {
                debug!("ignoring callback with missing or mismatched state");
                let _ = stream
                    .write_all(Self::plain_response(403, "Forbidden").as_bytes())
                    .await;
                continue;
            }

            if let Some(provider_error) = params.get("error") {
                let _ = stream
                    .write_all(Self::error_response(provider_error).as_bytes())
                    .await;
                return Err(CallbackError::Provider(provider_error.clone()));
            }

            if let Some(code) = params.get("code") {
                if let Err(e) = stream.write_all(Self::success_response().as_bytes()).await {
                    error!("failed to send success response: {}", e);
                }
                info!("received authorization code, shutting down callback listener");
                return Ok(AuthorizationCode::new(code.clone()));
            }

            debug!("state matched but no code present, still waiting");
            let _ = stream
                .write_all(Self::plain_response(400, "Bad Request").as_bytes())
                .await;
        }
    }

    /// Read until the request line is fully buffered (or the cap is hit).
    ///
    /// Browsers may deliver a long callback URL across several segments; a
    /// single read could truncate the query mid-state.
    async fn read_request_head(stream: &mut tokio::net::TcpStream) -> std::io::Result<String> {
        let mut head = Vec::with_capacity(2048);
        let mut chunk = [0u8; 1024];

        while !head.windows(2).any(|w| w == b"\r\n") && head.len() < MAX_REQUEST_HEAD {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            head.extend_from_slice(&chunk[..n]);
        }

        Ok(String::from_utf8_lossy(&head).into_owned())
    }

    /// Extract the request target from the head of a GET request.
    fn request_target(request: &str) -> Option<&str> {
        let first_line = request.lines().next()?;
        let mut parts = first_line.split_whitespace();
        let method = parts.next()?;
        let target = parts.next()?;
        if method != "GET" {
            return None;
        }
        Some(target)
    }

    /// Parse a query string into percent-decoded key/value pairs.
    fn parse_query(query: &str) -> HashMap<String, String> {
        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .filter_map(|pair| {
                let (key, value) = pair.split_once('=')?;
                let key = urlencoding::decode(key).ok()?;
                let value = urlencoding::decode(value).ok()?;
                Some((key.into_owned(), value.into_owned()))
            })
            .collect()
    }

    fn success_response() -> String {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n{}",
            SUCCESS_HTML.len(),
            SUCCESS_HTML
        )
    }

    fn error_response(error_msg: &str) -> String {
        let html = format!(
            "<html><body><h1>Authentication failed</h1><p>{}</p><p>You can close this tab and return to your terminal.</p></body></html>",
            error_msg
        );
        format!(
            "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n{}",
            html.len(),
            html
        )
    }

    fn plain_response(status: u16, reason: &str) -> String {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
            status,
            reason,
            reason.len(),
            reason
        )
    }
}

/// Upper bound on how much of a request head we buffer before parsing.
const MAX_REQUEST_HEAD: usize = 8192;

const SUCCESS_HTML: &str = r#"<html>
<head>
    <title>Authentication Successful</title>
    <style>
        body { font-family: system-ui, -apple-system, sans-serif; max-width: 600px; margin: 100px auto; text-align: center; }
        h1 { color: #22c55e; }
        p { color: #64748b; }
    </style>
</head>
<body>
    <h1>Authentication successful</h1>
    <p>You can now close this tab and return to your terminal.</p>
</body>
</html>"#;
