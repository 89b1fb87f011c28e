//! Published authentication state.
//!
//! The auth context publishes its state as a single [`AuthSnapshot`] value:
//! the current access token, the current profile, and whether the initial
//! bootstrap reconciliation is still running. Consumers derive the coarse
//! [`AuthStage`] from the snapshot and must branch on `loading` first so a
//! "not signed in" view is never rendered before bootstrap has settled.

use serde::{Deserialize, Serialize};

use crate::profile::Profile;

/// Coarse authentication stage derived from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStage {
    /// Initial reconciliation of the stored token and the server session is
    /// still in flight. Transient; resolves to one of the other stages.
    Bootstrapping,
    /// No profile is published.
    SignedOut,
    /// A profile is published.
    SignedIn,
}

/// A point-in-time view of the authentication state.
///
/// The triple is kept consistent by the auth context: when the server-side
/// session turns out to be invalid, the access token is cleared as well, so
/// the UI never shows a stale profile with no way to authenticate calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSnapshot {
    /// The OAuth access token for downstream API calls, if signed in.
    pub access_token: Option<String>,

    /// The signed-in user's display projection, if signed in.
    pub profile: Option<Profile>,

    /// True until the initial bootstrap has completed. Starts true and
    /// becomes false exactly once per bootstrap run, on both the success
    /// and failure paths.
    pub loading: bool,
}

impl AuthSnapshot {
    /// The snapshot before bootstrap has run: nothing published, loading.
    pub fn bootstrapping() -> Self {
        Self {
            access_token: None,
            profile: None,
            loading: true,
        }
    }

    /// Derives the coarse stage from this snapshot.
    ///
    /// `loading` wins over everything else; an optimistically published
    /// access token does not count as signed in until a profile exists.
    pub fn stage(&self) -> AuthStage {
        if self.loading {
            AuthStage::Bootstrapping
        } else if self.profile.is_some() {
            AuthStage::SignedIn
        } else {
            AuthStage::SignedOut
        }
    }
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self::bootstrapping()
    }
}
