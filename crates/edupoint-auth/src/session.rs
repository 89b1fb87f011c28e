//! Backend session exchange.
//!
//! After a provider sign-in, the identity assertion is posted to the backend,
//! which verifies it and establishes a cookie session. The exchange surface
//! is deliberately forgiving: every operation returns an `Option` (or unit)
//! and absorbs transport and decoding failures, so callers treat "no profile"
//! uniformly whether the backend rejected the assertion, the network was
//! down, or the response was malformed. Failures are logged, never raised.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use edupoint_core::Profile;

use crate::error::{AuthError, AuthResult};
use crate::provider::BoxFuture;

/// Default HTTP timeout for backend requests, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Abstraction over the backend session endpoints.
///
/// All methods are infallible by contract: a `None` profile covers every
/// failure mode, and sign-out is fire-and-forget.
pub trait SessionExchange: Send + Sync {
    /// Posts an identity assertion to establish a backend session.
    ///
    /// Returns the verified profile, or `None` if the backend rejected the
    /// assertion or could not be reached.
    fn exchange<'a>(&'a self, identity_assertion: &'a str) -> BoxFuture<'a, Option<Profile>>;

    /// Fetches the profile for the current backend session, if any.
    fn fetch_profile(&self) -> BoxFuture<'_, Option<Profile>>;

    /// Tears down the backend session. Best effort.
    fn sign_out(&self) -> BoxFuture<'_, ()>;
}

/// Request body for the session-establishment endpoint.
#[derive(Debug, Serialize)]
struct ExchangeRequest<'a> {
    #[serde(rename = "idToken")]
    id_token: &'a str,
}

/// Profile payload returned by the backend.
///
/// A response without a name does not identify a user and is treated the
/// same as no session.
#[derive(Debug, Deserialize)]
struct ProfileResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl ProfileResponse {
    fn into_profile(self) -> Option<Profile> {
        let name = self.name.filter(|n| !n.is_empty())?;
        Some(Profile::new(name).with_picture_opt(self.picture))
    }
}

/// [`SessionExchange`] over HTTP with a cookie-based backend session.
///
/// The session cookie set by the backend lives in the client's cookie jar
/// and is sent automatically on subsequent requests.
#[derive(Debug)]
pub struct HttpSessionExchange {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpSessionExchange {
    /// Creates a new exchange client for the given backend base URL.
    pub fn new(base_url: impl Into<String>) -> AuthResult<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new exchange client with a custom request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> AuthResult<Self> {
        let http_client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into(),
            http_client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn exchange_impl(&self, identity_assertion: &str) -> Option<Profile> {
        let url = self.endpoint("auth/google");
        let body = ExchangeRequest {
            id_token: identity_assertion,
        };

        let response = match self.http_client.post(&url).json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("session exchange request failed: {}", e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("session exchange rejected ({})", status);
            return None;
        }

        match response.json::<ProfileResponse>().await {
            Ok(payload) => payload.into_profile(),
            Err(e) => {
                warn!("could not decode session exchange response: {}", e);
                None
            }
        }
    }

    async fn fetch_profile_impl(&self) -> Option<Profile> {
        let url = self.endpoint("auth/profile");

        let response = match self.http_client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!("profile request failed: {}", e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!("no backend session ({})", status);
            return None;
        }

        match response.json::<ProfileResponse>().await {
            Ok(payload) => payload.into_profile(),
            Err(e) => {
                warn!("could not decode profile response: {}", e);
                None
            }
        }
    }

    async fn sign_out_impl(&self) {
        let url = self.endpoint("auth/signout");

        match self.http_client.post(&url).send().await {
            Ok(r) if r.status().is_success() => debug!("backend session closed"),
            Ok(r) => debug!("backend sign-out returned {}", r.status()),
            Err(e) => debug!("backend sign-out request failed: {}", e),
        }
    }
}

impl SessionExchange for HttpSessionExchange {
    fn exchange<'a>(&'a self, identity_assertion: &'a str) -> BoxFuture<'a, Option<Profile>> {
        Box::pin(async move { self.exchange_impl(identity_assertion).await })
    }

    fn fetch_profile(&self) -> BoxFuture<'_, Option<Profile>> {
        Box::pin(async move { self.fetch_profile_impl().await })
    }

    fn sign_out(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move { self.sign_out_impl().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let exchange = HttpSessionExchange::new("http://localhost:8000/").unwrap();
        assert_eq!(
            exchange.endpoint("auth/google"),
            "http://localhost:8000/auth/google"
        );

        let exchange = HttpSessionExchange::new("http://localhost:8000").unwrap();
        assert_eq!(
            exchange.endpoint("auth/profile"),
            "http://localhost:8000/auth/profile"
        );
    }

    #[test]
    fn profile_response_requires_name() {
        let payload: ProfileResponse =
            serde_json::from_str(r#"{"picture": "http://x/a.png"}"#).unwrap();
        assert!(payload.into_profile().is_none());

        let payload: ProfileResponse = serde_json::from_str(r#"{"name": ""}"#).unwrap();
        assert!(payload.into_profile().is_none());

        let payload: ProfileResponse =
            serde_json::from_str(r#"{"name": "Ada", "picture": "http://x/a.png"}"#).unwrap();
        let profile = payload.into_profile().unwrap();
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.picture.as_deref(), Some("http://x/a.png"));
    }

    #[test]
    fn exchange_request_wire_format() {
        let body = ExchangeRequest { id_token: "jwt" };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"idToken":"jwt"}"#);
    }
}
