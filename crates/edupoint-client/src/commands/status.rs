//! Session status command.

use std::sync::Arc;

use serde::Serialize;

use edupoint_auth::{AuthStage, Profile, UnconfiguredProvider};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Machine-readable session status.
///
/// The access token itself is deliberately not included; only its presence.
#[derive(Debug, Serialize)]
struct StatusReport {
    stage: AuthStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile: Option<Profile>,
    has_token: bool,
}

/// Show the current session.
pub async fn status(json: bool, config: &ClientConfig) -> ClientResult<()> {
    // Status never needs the interactive flow, only restoration.
    let provider = Arc::new(UnconfiguredProvider::new("status is read-only"));
    let context = super::auth::build_context(config, provider)?;

    context.bootstrap().await;
    let snapshot = context.snapshot();

    if json {
        let report = StatusReport {
            stage: snapshot.stage(),
            profile: snapshot.profile,
            has_token: snapshot.access_token.is_some(),
        };
        let output = serde_json::to_string_pretty(&report)
            .map_err(|e| ClientError::Config(format!("failed to serialize status: {}", e)))?;
        println!("{}", output);
        return Ok(());
    }

    match snapshot.stage() {
        AuthStage::SignedIn => {
            let profile = snapshot.profile.unwrap_or_else(|| Profile::new(""));
            println!("Signed in as {}.", profile.name);
            if let Some(picture) = profile.picture {
                println!("  picture: {}", picture);
            }
        }
        AuthStage::SignedOut => {
            println!("Not signed in.");
            println!("Run 'edupoint signin' to sign in with Google.");
        }
        AuthStage::Bootstrapping => {
            // Not reachable once bootstrap has returned.
            println!("Session restoration still in progress.");
        }
    }

    Ok(())
}
