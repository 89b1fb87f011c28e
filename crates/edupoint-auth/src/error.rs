//! Error types for the sign-in flow.
//!
//! Nothing in this flow is fatal at the UI level: every failure degrades to
//! "treat the user as signed out". The error type still categorizes what
//! went wrong so callers can show the right notice: a dismissed sign-in
//! window gets a different, non-alarming message from a provider outage.

use std::fmt;
use thiserror::Error;

/// The category of an auth error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorCode {
    /// The user dismissed or denied the sign-in flow. Recoverable; prior
    /// auth state is left untouched.
    Cancelled,
    /// The identity provider failed (consent page error, token exchange
    /// rejection, revocation failure).
    ProviderFailed,
    /// Network error - connection failed, timeout, DNS resolution, etc.
    NetworkError,
    /// Invalid response from a server - parse error, unexpected format.
    InvalidResponse,
    /// Configuration error - missing or invalid config.
    ConfigurationError,
    /// Token store read/write failure.
    StorageError,
    /// A sign-in is already pending; the second call was rejected rather
    /// than allowed to race.
    InProgress,
    /// Internal error - unexpected state, bug.
    InternalError,
}

impl AuthErrorCode {
    /// Returns a stable machine-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::ProviderFailed => "provider_failed",
            Self::NetworkError => "network_error",
            Self::InvalidResponse => "invalid_response",
            Self::ConfigurationError => "configuration_error",
            Self::StorageError => "storage_error",
            Self::InProgress => "in_progress",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred in the sign-in flow.
#[derive(Debug, Error)]
pub struct AuthError {
    /// The error code categorizing this error.
    code: AuthErrorCode,
    /// A human-readable message describing the error.
    message: String,
    /// The underlying cause of this error, if any.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AuthError {
    /// Creates a new auth error with the given code and message.
    pub fn new(code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a cancellation error (sign-in dismissed or denied).
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::Cancelled, message)
    }

    /// Creates an identity-provider error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::ProviderFailed, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::NetworkError, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::InvalidResponse, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::ConfigurationError, message)
    }

    /// Creates a token store error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::StorageError, message)
    }

    /// Creates an operation-pending error.
    pub fn in_progress(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::InProgress, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::InternalError, message)
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> AuthErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if this error is a user cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.code == AuthErrorCode::Cancelled
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_names() {
        assert_eq!(AuthErrorCode::Cancelled.as_str(), "cancelled");
        assert_eq!(AuthErrorCode::NetworkError.as_str(), "network_error");
        assert_eq!(AuthErrorCode::InProgress.as_str(), "in_progress");
    }

    #[test]
    fn auth_error_creation() {
        let err = AuthError::provider("consent page returned an error");
        assert_eq!(err.code(), AuthErrorCode::ProviderFailed);
        assert_eq!(err.message(), "consent page returned an error");
        assert!(!err.is_cancelled());
    }

    #[test]
    fn cancelled_is_distinguished() {
        let err = AuthError::cancelled("sign-in window dismissed");
        assert!(err.is_cancelled());
        assert_eq!(err.code(), AuthErrorCode::Cancelled);
    }

    #[test]
    fn auth_error_display() {
        let err = AuthError::network("connection timeout");
        let display = format!("{}", err);
        assert!(display.contains("network_error"));
        assert!(display.contains("connection timeout"));
    }

    #[test]
    fn auth_error_with_source() {
        use std::error::Error;
        let io_err = std::io::Error::other("disk full");
        let err = AuthError::storage("failed to persist token").with_source(io_err);
        assert!(err.source().is_some());
    }
}
