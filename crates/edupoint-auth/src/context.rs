//! The authentication context.
//!
//! [`AuthContext`] ties the pieces together: the identity provider, the
//! backend session exchange, the token store, and the notice center. It owns
//! the published [`AuthSnapshot`] and is the only writer to it, so observers
//! always see a consistent token/profile pair.
//!
//! # Lifecycle
//!
//! - [`bootstrap`](AuthContext::bootstrap) runs once at startup: it restores
//!   the persisted token optimistically, then reconciles against the backend
//!   session. The snapshot's `loading` flag transitions from `true` to
//!   `false` exactly once, at the end of bootstrap.
//! - [`sign_in`](AuthContext::sign_in) runs the interactive provider flow
//!   and establishes a backend session. Concurrent invocations are rejected.
//! - [`sign_out_user`](AuthContext::sign_out_user) tears everything down in
//!   order: provider session first, then local state, then (asynchronously)
//!   the backend session.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use edupoint_core::{AuthSnapshot, AuthStage, Profile};

use crate::error::{AuthError, AuthResult};
use crate::notice::{Notice, NoticeCenter};
use crate::provider::IdentityProvider;
use crate::session::SessionExchange;
use crate::store::TokenStore;

/// Coordinates sign-in, sign-out, and session restoration.
pub struct AuthContext {
    provider: Arc<dyn IdentityProvider>,
    exchange: Arc<dyn SessionExchange>,
    store: Arc<TokenStore>,
    notices: NoticeCenter,
    state: watch::Sender<AuthSnapshot>,
    // Serializes sign-in/sign-out; sign_in rejects instead of queueing.
    op_lock: Mutex<()>,
}

impl AuthContext {
    /// Creates a new context. The initial snapshot is bootstrapping.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        exchange: Arc<dyn SessionExchange>,
        store: Arc<TokenStore>,
    ) -> Self {
        let (state, _) = watch::channel(AuthSnapshot::bootstrapping());
        Self {
            provider,
            exchange,
            store,
            notices: NoticeCenter::new(),
            state,
            op_lock: Mutex::new(()),
        }
    }

    /// Replaces the notice center, e.g. to shorten the display window.
    pub fn with_notices(mut self, notices: NoticeCenter) -> Self {
        self.notices = notices;
        self
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> AuthSnapshot {
        self.state.borrow().clone()
    }

    /// Returns the current auth stage.
    pub fn stage(&self) -> AuthStage {
        self.state.borrow().stage()
    }

    /// Subscribes to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    /// Returns the notice center for subscription.
    pub fn notices(&self) -> &NoticeCenter {
        &self.notices
    }

    /// Returns the token store.
    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Restores the session at startup.
    ///
    /// The persisted token is published immediately so dependent features
    /// can start issuing API calls while the backend session is verified in
    /// parallel with user perception. If the backend cannot vouch for a
    /// profile, the token is presumed stale and everything is invalidated:
    /// backend session, persisted token, published state.
    ///
    /// Never raises; failures degrade to the signed-out state.
    pub async fn bootstrap(&self) {
        let _guard = self.op_lock.lock().await;

        if let Err(e) = self.store.load() {
            warn!("could not restore persisted token: {}", e);
        }

        let restored = self.store.get();
        if let Some(token) = restored.clone() {
            debug!("restored token, verifying backend session");
            self.state.send_modify(|s| s.access_token = Some(token));
        }

        match self.exchange.fetch_profile().await {
            Some(profile) => {
                info!("backend session restored for {}", profile.name);
                self.state.send_modify(|s| {
                    s.profile = Some(profile);
                    s.loading = false;
                });
            }
            None => {
                // No usable server session: tell the backend to drop
                // whatever it may still hold, and invalidate any restored
                // token so no layer keeps a credential the backend no
                // longer honors.
                debug!("no backend session, invalidating");
                self.exchange.sign_out().await;
                if restored.is_some()
                    && let Err(e) = self.store.clear()
                {
                    warn!("could not clear stale token: {}", e);
                }
                self.state.send_modify(|s| {
                    s.access_token = None;
                    s.profile = None;
                    s.loading = false;
                });
            }
        }
    }

    /// Runs the interactive sign-in flow.
    ///
    /// # Errors
    ///
    /// - [`AuthError::in_progress`] when another sign-in or sign-out is
    ///   already running; state is untouched.
    /// - [`AuthError::cancelled`] when the user dismisses the flow; prior
    ///   state is untouched, only a notice is published.
    /// - Other provider errors clear the token and profile before
    ///   propagating, so no half-established session lingers.
    pub async fn sign_in(&self) -> AuthResult<()> {
        let _guard = self
            .op_lock
            .try_lock()
            .map_err(|_| AuthError::in_progress("a sign-in or sign-out is already running"))?;

        let bundle = match self.provider.sign_in().await {
            Ok(bundle) => bundle,
            Err(e) if e.is_cancelled() => {
                info!("sign-in cancelled by user");
                self.notices.publish(Notice::info("Sign-in cancelled"));
                return Err(e);
            }
            Err(e) => {
                warn!("sign-in failed: {}", e);
                if let Err(se) = self.store.clear() {
                    warn!("could not clear token after failed sign-in: {}", se);
                }
                self.state.send_modify(|s| {
                    s.access_token = None;
                    s.profile = None;
                    s.loading = false;
                });
                self.notices.publish(Notice::warning("Sign-in failed"));
                return Err(e);
            }
        };

        if let Err(e) = self.store.set(bundle.access_token.clone()) {
            // The in-memory token is still set; only persistence failed, so
            // the session works for this run but will not survive restart.
            warn!("could not persist access token: {}", e);
        }
        self.state.send_modify(|s| {
            s.access_token = Some(bundle.access_token.clone());
            s.loading = false;
        });

        let profile = match self.exchange.exchange(&bundle.identity_assertion).await {
            Some(profile) => profile,
            None => {
                debug!("backend exchange yielded no profile, using provider claims");
                Profile::new(bundle.display_name.clone().unwrap_or_default())
                    .with_picture_opt(bundle.picture_url.clone())
            }
        };

        let greeting = if profile.name.is_empty() {
            "Signed in".to_string()
        } else {
            format!("Signed in as {}", profile.name)
        };
        info!("{}", greeting);

        self.state.send_modify(|s| s.profile = Some(profile));
        self.notices.publish(Notice::info(greeting));
        Ok(())
    }

    /// Signs the user out everywhere.
    ///
    /// The provider session is invalidated first and awaited, so observers
    /// never see a signed-out snapshot while the provider still considers
    /// the session live. The backend sign-out request is fire-and-forget.
    pub async fn sign_out_user(&self) {
        let _guard = self.op_lock.lock().await;

        if let Err(e) = self.provider.sign_out().await {
            warn!("provider sign-out failed: {}", e);
        }

        if let Err(e) = self.store.clear() {
            warn!("could not clear persisted token: {}", e);
        }

        self.state.send_modify(|s| {
            s.access_token = None;
            s.profile = None;
            s.loading = false;
        });

        let exchange = Arc::clone(&self.exchange);
        tokio::spawn(async move {
            exchange.sign_out().await;
        });

        info!("signed out");
        self.notices.publish(Notice::info("Signed out"));
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}
