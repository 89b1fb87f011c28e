//! Google identity provider.
//!
//! Implements [`IdentityProvider`](crate::provider::IdentityProvider) with
//! Google's OAuth 2.0 authorization-code flow (PKCE, loopback redirect),
//! the desktop analog of the browser popup sign-in.

mod claims;
mod config;
mod pkce;
mod provider;

pub use claims::IdClaims;
pub use config::{GoogleAuthConfig, OAuthCredentials};
pub use pkce::PkceFlow;
pub use provider::GoogleIdentityProvider;
