//! Display claims from the Google ID token.
//!
//! The ID token is a JWT whose payload carries the user's display name and
//! avatar URL. The payload is decoded here for display fallback only; the
//! signature is verified by the backend session exchange, never locally.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

use crate::error::{AuthError, AuthResult};

/// Display-relevant claims from an ID token payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdClaims {
    /// The user's full display name.
    pub name: Option<String>,
    /// URL of the user's avatar image.
    pub picture: Option<String>,
    /// The user's email address.
    pub email: Option<String>,
}

impl IdClaims {
    /// Decodes the payload segment of a JWT without verifying it.
    ///
    /// # Errors
    ///
    /// Returns an invalid-response error when the token is not a JWT or the
    /// payload is not valid base64url JSON.
    pub fn decode(id_token: &str) -> AuthResult<Self> {
        let payload = id_token
            .split('.')
            .nth(1)
            .ok_or_else(|| AuthError::invalid_response("ID token is not a JWT"))?;

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| AuthError::invalid_response(format!("invalid ID token payload: {}", e)))?;

        serde_json::from_slice(&bytes).map_err(|e| {
            AuthError::invalid_response(format!("failed to parse ID token claims: {}", e))
        })
    }
}
