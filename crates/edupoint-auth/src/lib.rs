//! Authentication and session restoration for EduPoint clients.
//!
//! This crate implements the full sign-in lifecycle:
//!
//! - [`TokenStore`]: durable single-token storage with a change broadcast
//! - [`IdentityProvider`]: the interactive provider sign-in abstraction,
//!   with [`google::GoogleIdentityProvider`] as the Google implementation
//! - [`SessionExchange`]: the backend cookie-session endpoints
//! - [`AuthContext`]: the state machine coordinating bootstrap, sign-in,
//!   and sign-out, published as an [`AuthSnapshot`] watch channel
//! - [`NoticeCenter`]: transient user-facing notices
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use edupoint_auth::google::{GoogleAuthConfig, GoogleIdentityProvider, OAuthCredentials};
//! use edupoint_auth::{AuthContext, HttpSessionExchange, TokenStore};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = OAuthCredentials::from_file("credentials.json")?;
//! let provider = GoogleIdentityProvider::new(GoogleAuthConfig::new(credentials))?;
//! let exchange = HttpSessionExchange::new("http://localhost:8000")?;
//! let store = TokenStore::new("/tmp/edupoint-token.json");
//!
//! let context = AuthContext::new(Arc::new(provider), Arc::new(exchange), Arc::new(store));
//! context.bootstrap().await;
//! context.sign_in().await?;
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod error;
pub mod google;
pub mod notice;
pub mod provider;
pub mod session;
pub mod store;

pub use context::AuthContext;
pub use error::{AuthError, AuthErrorCode, AuthResult};
pub use notice::{Notice, NoticeCenter, NoticeKind};
pub use provider::{BoxFuture, IdentityProvider, SignInBundle, UnconfiguredProvider};
pub use session::{HttpSessionExchange, SessionExchange};
pub use store::{StoredToken, TokenStore};

pub use edupoint_core::{AuthSnapshot, AuthStage, Profile};
