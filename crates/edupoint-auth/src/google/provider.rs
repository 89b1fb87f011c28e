//! Google sign-in flow implementation.
//!
//! # Flow Overview
//!
//! 1. Generate a PKCE verifier and its SHA-256 challenge
//! 2. Start a local HTTP server on a port from the configured range
//! 3. Open the user's browser to Google's consent page
//! 4. Wait (bounded) for the redirect with the authorization code
//! 5. Exchange the code (with verifier) for an access token and ID token
//! 6. Decode display claims from the ID token payload
//!
//! The consent page is the analog of the popup sign-in: dismissing it (or
//! letting it time out) surfaces as a cancellation, distinct from provider
//! failures, so callers can keep prior auth state untouched.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, mpsc};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::error::{AuthError, AuthResult};
use crate::provider::{BoxFuture, IdentityProvider, SignInBundle};

use super::claims::IdClaims;
use super::config::GoogleAuthConfig;
use super::pkce::PkceFlow;

/// Google's token endpoint.
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Google's token revocation endpoint.
const GOOGLE_REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

/// Interactive Google sign-in via OAuth 2.0 PKCE with a loopback redirect.
///
/// Remembers the most recently issued access token as the "local provider
/// session" so [`sign_out`](IdentityProvider::sign_out) can revoke it.
#[derive(Debug)]
pub struct GoogleIdentityProvider {
    config: GoogleAuthConfig,
    http_client: reqwest::Client,
    issued_token: RwLock<Option<String>>,
}

impl GoogleIdentityProvider {
    /// Creates a new provider with the given configuration.
    pub fn new(config: GoogleAuthConfig) -> AuthResult<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AuthError::internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            issued_token: RwLock::new(None),
        })
    }

    async fn sign_in_impl(&self) -> AuthResult<SignInBundle> {
        let pkce = PkceFlow::new();

        // Find an available port and start the callback server
        let (listener, port) = Self::bind_loopback_server(self.config.loopback_port_range)?;
        let redirect_uri = format!("http://127.0.0.1:{}/callback", port);

        let auth_url = pkce.build_auth_url(
            &self.config.credentials.client_id,
            &redirect_uri,
            &self.config.scopes,
        );

        info!("starting Google sign-in, opening browser...");
        debug!("authorization URL: {}", auth_url);

        if let Err(e) = open::that(&auth_url) {
            warn!("failed to open browser: {}", e);
            // Print URL for manual copy
            eprintln!("\nPlease open this URL in your browser:\n\n{}\n", auth_url);
        }

        // Wait for the callback off the async runtime; the wait is bounded
        // by the configured callback timeout.
        let callback_timeout = self.config.callback_timeout;
        let (code, received_state) =
            tokio::task::spawn_blocking(move || Self::wait_for_callback(listener, callback_timeout))
                .await
                .map_err(|e| AuthError::internal(format!("callback task failed: {}", e)))??;

        if received_state != pkce.state {
            return Err(AuthError::provider(
                "OAuth state mismatch - possible CSRF attack",
            ));
        }

        info!("received authorization code, exchanging for tokens...");

        let tokens = self
            .exchange_code(&code, &pkce.verifier, &redirect_uri)
            .await?;

        let identity_assertion = tokens.id_token.ok_or_else(|| {
            AuthError::invalid_response("token response is missing an ID token")
        })?;

        // Display claims are a fallback only; decode failures must not
        // abort a sign-in the backend can still verify.
        let claims = match IdClaims::decode(&identity_assertion) {
            Ok(claims) => claims,
            Err(e) => {
                debug!("could not decode ID token claims: {}", e);
                IdClaims::default()
            }
        };

        *self.issued_token.write().unwrap() = Some(tokens.access_token.clone());

        let mut bundle = SignInBundle::new(tokens.access_token, identity_assertion);
        bundle.display_name = claims.name;
        bundle.picture_url = claims.picture;
        Ok(bundle)
    }

    async fn sign_out_impl(&self) -> AuthResult<()> {
        let token = self.issued_token.write().unwrap().take();

        let Some(token) = token else {
            debug!("no provider session to sign out of");
            return Ok(());
        };

        // Best-effort revocation; a failure still counts as signed out
        // locally.
        let response = self
            .http_client
            .post(GOOGLE_REVOKE_URL)
            .form(&[("token", token.as_str())])
            .send()
            .await;

        match response {
            Ok(r) if r.status().is_success() => info!("revoked Google access token"),
            Ok(r) => debug!("token revocation returned {}", r.status()),
            Err(e) => debug!("token revocation request failed: {}", e),
        }

        Ok(())
    }

    /// Exchanges an authorization code for tokens.
    async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> AuthResult<TokenExchangeResponse> {
        let params = [
            ("client_id", self.config.credentials.client_id.as_str()),
            ("client_secret", self.config.credentials.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .http_client
            .post(GOOGLE_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::network(format!("token exchange request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::network(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(AuthError::provider(format!(
                "token exchange failed ({}): {}",
                status, body
            )));
        }

        let tokens: TokenExchangeResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::invalid_response(format!("invalid token response: {}", e)))?;

        debug!("access token expires in {:?} seconds", tokens.expires_in);
        Ok(tokens)
    }

    /// Tries to bind a TCP listener on an available port in the given range.
    fn bind_loopback_server(port_range: (u16, u16)) -> AuthResult<(TcpListener, u16)> {
        for port in port_range.0..=port_range.1 {
            match TcpListener::bind(format!("127.0.0.1:{}", port)) {
                Ok(listener) => {
                    debug!("bound loopback server on port {}", port);
                    return Ok((listener, port));
                }
                Err(_) => continue,
            }
        }
        Err(AuthError::configuration(format!(
            "no available port in range {}-{}",
            port_range.0, port_range.1
        )))
    }

    /// Waits for the OAuth callback and extracts the authorization code.
    ///
    /// A timeout is treated as the user having walked away from the consent
    /// page, i.e. a cancellation rather than a provider failure.
    fn wait_for_callback(
        listener: TcpListener,
        timeout: Duration,
    ) -> AuthResult<(String, String)> {
        listener
            .set_nonblocking(false)
            .map_err(|e| AuthError::internal(format!("failed to set blocking: {}", e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| AuthError::internal(format!("failed to read listener address: {}", e)))?;

        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        // Handle the callback in a separate thread to allow timeout
        let handle = thread::spawn(move || {
            for stream in listener.incoming() {
                if thread_stop.load(Ordering::SeqCst) {
                    return;
                }
                match stream {
                    Ok(stream) => {
                        if let Some(result) = Self::handle_callback(stream) {
                            let _ = tx.send(result);
                            return;
                        }
                    }
                    Err(e) => {
                        error!("failed to accept connection: {}", e);
                    }
                }
            }
        });

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // Unblock the accept loop so the thread exits and the port
                // is released for the next attempt.
                stop.store(true, Ordering::SeqCst);
                let _ = TcpStream::connect(local_addr);
                let _ = handle.join();
                Err(AuthError::cancelled("sign-in window timed out"))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(AuthError::internal("callback channel disconnected"))
            }
        }
    }

    /// Handles an incoming HTTP request on the callback server.
    fn handle_callback(mut stream: TcpStream) -> Option<AuthResult<(String, String)>> {
        let mut reader = BufReader::new(&stream);
        let mut request_line = String::new();

        if reader.read_line(&mut request_line).is_err() {
            return None;
        }

        // Parse the request line: GET /callback?code=...&state=... HTTP/1.1
        let parts: Vec<&str> = request_line.split_whitespace().collect();
        if parts.len() < 2 || parts[0] != "GET" {
            return None;
        }

        let path = parts[1];
        if !path.starts_with("/callback") {
            return None;
        }

        let query_start = path.find('?').map(|i| i + 1).unwrap_or(path.len());
        let query = &path[query_start..];

        let mut code = None;
        let mut state = None;
        let mut error = None;

        for param in query.split('&') {
            let mut kv = param.splitn(2, '=');
            if let (Some(key), Some(value)) = (kv.next(), kv.next()) {
                match key {
                    "code" => {
                        code = Some(urlencoding::decode(value).unwrap_or_default().into_owned())
                    }
                    "state" => {
                        state = Some(urlencoding::decode(value).unwrap_or_default().into_owned())
                    }
                    "error" => {
                        error = Some(urlencoding::decode(value).unwrap_or_default().into_owned())
                    }
                    _ => {}
                }
            }
        }

        // Send response to browser
        let response = if error.is_some() || code.is_none() {
            "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\n\r\n\
            <html><body><h1>Sign-in Failed</h1>\
            <p>You can close this window.</p></body></html>"
        } else {
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
            <html><body><h1>Sign-in Successful</h1>\
            <p>You can close this window and return to the application.</p></body></html>"
        };

        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();

        if let Some(error) = error {
            // A declined consent page is the user's choice, not a failure.
            if error == "access_denied" {
                return Some(Err(AuthError::cancelled("sign-in denied by user")));
            }
            return Some(Err(AuthError::provider(format!(
                "authorization failed: {}",
                error
            ))));
        }

        match (code, state) {
            (Some(c), Some(s)) => Some(Ok((c, s))),
            (Some(c), None) => Some(Ok((c, String::new()))),
            _ => Some(Err(AuthError::provider(
                "missing authorization code in callback",
            ))),
        }
    }
}

impl IdentityProvider for GoogleIdentityProvider {
    fn sign_in(&self) -> BoxFuture<'_, AuthResult<SignInBundle>> {
        Box::pin(async move { self.sign_in_impl().await })
    }

    fn sign_out(&self) -> BoxFuture<'_, AuthResult<()>> {
        Box::pin(async move { self.sign_out_impl().await })
    }
}

/// Response from Google's token endpoint.
#[derive(Debug, serde::Deserialize)]
struct TokenExchangeResponse {
    access_token: String,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}
