//! IdentityProvider trait definition.
//!
//! This module defines the [`IdentityProvider`] trait, the abstraction over
//! the third-party interactive sign-in flow (Google's popup/consent page).
//!
//! Providers are responsible for:
//! - Presenting the interactive sign-in flow and suspending the caller
//!   until the user completes or dismisses it
//! - Returning an access token scoped for calendar read access together
//!   with an identity assertion for the backend session exchange
//! - Distinguishing user cancellation from provider failures

use std::future::Future;
use std::pin::Pin;

use crate::error::{AuthError, AuthResult};

/// The result of a completed interactive sign-in.
#[derive(Debug, Clone)]
pub struct SignInBundle {
    /// Bearer credential for downstream API calls (calendar read access).
    pub access_token: String,

    /// Short-lived signed token proving the user's identity. Forwarded once
    /// to the backend session exchange, then discarded; never persisted.
    pub identity_assertion: String,

    /// Display name from the provider's own user record, used as a profile
    /// fallback when the backend exchange fails.
    pub display_name: Option<String>,

    /// Avatar URL from the provider's own user record.
    pub picture_url: Option<String>,
}

impl SignInBundle {
    /// Creates a bundle with tokens only.
    pub fn new(
        access_token: impl Into<String>,
        identity_assertion: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            identity_assertion: identity_assertion.into(),
            display_name: None,
            picture_url: None,
        }
    }

    /// Builder method to set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Builder method to set the picture URL.
    pub fn with_picture_url(mut self, url: impl Into<String>) -> Self {
        self.picture_url = Some(url.into());
        self
    }
}

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object-safe so the auth context can hold
/// any provider behind dynamic dispatch.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The abstraction over the interactive identity-provider sign-in flow.
///
/// # Implementation Notes
///
/// - `sign_in` must suspend until the user completes or dismisses the flow,
///   and must resolve within a bounded time (implementations carry their
///   own timeout) so a hung network never wedges the caller.
/// - User cancellation must surface as [`AuthError::cancelled`] so callers
///   can show a non-alarming notice and preserve prior state.
/// - `sign_out` must complete before the caller clears its own state, so
///   the UI never reports "signed out" while the provider still considers
///   the session live.
pub trait IdentityProvider: Send + Sync {
    /// Runs the interactive sign-in flow.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::cancelled`] when the user dismisses or denies
    /// the flow, and provider/network errors otherwise.
    fn sign_in(&self) -> BoxFuture<'_, AuthResult<SignInBundle>>;

    /// Invalidates the local provider session, best-effort.
    fn sign_out(&self) -> BoxFuture<'_, AuthResult<()>>;
}

/// A provider that always fails with a configuration error.
///
/// Useful as a placeholder when no identity provider is configured, so the
/// rest of the flow degrades to signed-out instead of panicking.
#[derive(Debug)]
pub struct UnconfiguredProvider {
    message: String,
}

impl UnconfiguredProvider {
    /// Creates a placeholder provider with the given explanation.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IdentityProvider for UnconfiguredProvider {
    fn sign_in(&self) -> BoxFuture<'_, AuthResult<SignInBundle>> {
        let error = AuthError::configuration(self.message.clone());
        Box::pin(async move { Err(error) })
    }

    fn sign_out(&self) -> BoxFuture<'_, AuthResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
