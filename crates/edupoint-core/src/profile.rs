//! Display-only identity projection.
//!
//! A [`Profile`] is what the UI shows next to the signed-in indicator: a
//! display name and an optional picture URL. It is never persisted on its
//! own; it is recomputed from the backend session or from the identity
//! provider's own user record on every page load or sign-in.

use serde::{Deserialize, Serialize};

/// The signed-in user's display projection.
///
/// Presence of a profile is what "signed in" means at the UI level: the
/// auth context reports `SignedIn` exactly when a profile is published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Display name shown in the UI.
    pub name: String,

    /// URL of the user's avatar image, if the provider supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl Profile {
    /// Creates a profile with the given display name and no picture.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            picture: None,
        }
    }

    /// Builder method to set the picture URL.
    pub fn with_picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }

    /// Builder method to set an optional picture URL.
    pub fn with_picture_opt(mut self, picture: Option<String>) -> Self {
        self.picture = picture;
        self
    }
}
