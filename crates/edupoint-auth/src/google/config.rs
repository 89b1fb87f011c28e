//! Google identity provider configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AuthError, AuthResult};

/// OAuth 2.0 credentials for Google API access.
///
/// Users must provide their own OAuth client ID and secret, as Google
/// requires registered applications for API access.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    /// The OAuth 2.0 client ID from Google Cloud Console.
    pub client_id: String,
    /// The OAuth 2.0 client secret from Google Cloud Console.
    pub client_secret: String,
}

/// Structure of Google's OAuth credentials JSON file.
///
/// Supports multiple formats:
/// 1. Google Cloud Console format with "installed" or "web" section
/// 2. Flat format with client_id and client_secret at root level
#[derive(Debug, Deserialize)]
struct GoogleCredentialsFile {
    installed: Option<NestedCredentials>,
    web: Option<NestedCredentials>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

/// OAuth credentials within a nested section of the credentials JSON file.
#[derive(Debug, Deserialize)]
struct NestedCredentials {
    client_id: String,
    client_secret: String,
}

impl OAuthCredentials {
    /// Creates new OAuth credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Loads OAuth credentials from a Google Cloud Console JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> AuthResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AuthError::configuration(format!("failed to read credentials file: {}", e))
        })?;
        Self::from_json(&content)
    }

    /// Parses OAuth credentials from a Google credentials JSON string.
    ///
    /// Accepts either the Google Cloud Console format (an `installed` or
    /// `web` section) or a flat object with `client_id`/`client_secret` at
    /// the root.
    pub fn from_json(json: &str) -> AuthResult<Self> {
        let file: GoogleCredentialsFile = serde_json::from_str(json).map_err(|e| {
            AuthError::configuration(format!("failed to parse credentials JSON: {}", e))
        })?;

        if let Some(creds) = file.installed.or(file.web) {
            return Ok(Self::new(creds.client_id, creds.client_secret));
        }

        if let (Some(client_id), Some(client_secret)) = (file.client_id, file.client_secret) {
            return Ok(Self::new(client_id, client_secret));
        }

        Err(AuthError::configuration(
            "credentials file must contain 'installed'/'web' section or \
             'client_id'/'client_secret' at root level",
        ))
    }

    /// Validates that the credentials appear to be correctly formatted.
    pub fn validate(&self) -> AuthResult<()> {
        if self.client_id.is_empty() {
            return Err(AuthError::configuration("client_id is required"));
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err(AuthError::configuration(
                "client_id should end with .apps.googleusercontent.com",
            ));
        }
        if self.client_secret.is_empty() {
            return Err(AuthError::configuration("client_secret is required"));
        }
        Ok(())
    }
}

/// Configuration for the Google identity provider.
#[derive(Debug, Clone)]
pub struct GoogleAuthConfig {
    /// OAuth credentials for the registered application.
    pub credentials: OAuthCredentials,

    /// OAuth scopes to request.
    ///
    /// Defaults to basic identity scopes plus read-only calendar access.
    /// If the user declines the calendar scope, sign-in still succeeds but
    /// downstream calendar calls will fail.
    pub scopes: Vec<String>,

    /// Timeout for token-endpoint HTTP requests.
    pub timeout: Duration,

    /// How long to wait for the user to complete the consent flow before
    /// treating the sign-in as dismissed.
    pub callback_timeout: Duration,

    /// Port range for the loopback redirect server.
    pub loopback_port_range: (u16, u16),
}

impl GoogleAuthConfig {
    /// Default HTTP timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Default consent-flow timeout in seconds.
    pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 300;

    /// OAuth scope for read-only calendar access.
    pub const CALENDAR_SCOPE: &'static str = "https://www.googleapis.com/auth/calendar.readonly";

    /// Creates a new configuration with the given credentials and default
    /// scopes.
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            credentials,
            scopes: vec![
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
                Self::CALENDAR_SCOPE.to_string(),
            ],
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            callback_timeout: Duration::from_secs(Self::DEFAULT_CALLBACK_TIMEOUT_SECS),
            loopback_port_range: (8080, 8090),
        }
    }

    /// Sets the OAuth scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Sets the HTTP request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the consent-flow timeout.
    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    /// Sets the loopback port range.
    pub fn with_loopback_port_range(mut self, start: u16, end: u16) -> Self {
        self.loopback_port_range = (start, end);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> AuthResult<()> {
        self.credentials.validate()?;

        if !self.scopes.iter().any(|s| s == "openid") {
            // Without openid no identity assertion is issued, and the
            // backend session exchange has nothing to verify.
            return Err(AuthError::configuration(
                "the 'openid' scope is required to obtain an identity assertion",
            ));
        }

        if self.loopback_port_range.0 > self.loopback_port_range.1 {
            return Err(AuthError::configuration("invalid loopback port range"));
        }

        Ok(())
    }
}
