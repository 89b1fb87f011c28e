//! Sign-in and sign-out commands.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use edupoint_auth::google::{GoogleAuthConfig, GoogleIdentityProvider, OAuthCredentials};
use edupoint_auth::{
    AuthContext, AuthStage, HttpSessionExchange, IdentityProvider, NoticeKind, TokenStore,
    UnconfiguredProvider,
};

use crate::config::{ClientConfig, GoogleSettings};
use crate::error::{ClientError, ClientResult};

/// Builds an auth context from the client configuration.
pub(crate) fn build_context(
    config: &ClientConfig,
    provider: Arc<dyn IdentityProvider>,
) -> ClientResult<AuthContext> {
    let exchange =
        HttpSessionExchange::with_timeout(config.backend.base_url.clone(), config.backend.timeout())
            .map_err(ClientError::Auth)?;
    let store = TokenStore::new(config.auth.token_path());

    Ok(AuthContext::new(provider, Arc::new(exchange), Arc::new(store)))
}

/// Run the Google sign-in flow.
///
/// Resolves credentials from CLI flags, a `--credentials-file`, or
/// `config.toml`, then runs the interactive consent flow and establishes a
/// backend session.
///
/// When credentials are provided via CLI or `--credentials-file`, they are
/// persisted to `config.toml` for later runs.
pub async fn signin(
    client_id: Option<String>,
    client_secret: Option<String>,
    credentials_file: Option<PathBuf>,
    force: bool,
    config: &ClientConfig,
) -> ClientResult<()> {
    let (final_client_id, final_client_secret, source) = resolve_google_credentials(
        client_id,
        client_secret,
        credentials_file,
        config.google.as_ref(),
    )?;

    let credentials = OAuthCredentials::new(&final_client_id, &final_client_secret);
    credentials.validate().map_err(|e| {
        ClientError::Config(format!("invalid Google credentials: {}", e))
    })?;

    let mut google_config = GoogleAuthConfig::new(credentials);
    if let Some(ref google) = config.google
        && !google.scopes.is_empty()
    {
        google_config = google_config.with_scopes(google.scopes.clone());
    }

    let provider = GoogleIdentityProvider::new(google_config).map_err(ClientError::Auth)?;
    let context = build_context(config, Arc::new(provider))?;

    // Restore any existing session first
    context.bootstrap().await;

    if context.stage() == AuthStage::SignedIn && !force {
        save_credentials_to_config(&final_client_id, &final_client_secret, &source);
        let snapshot = context.snapshot();
        let name = snapshot.profile.map(|p| p.name).unwrap_or_default();
        println!("Already signed in as {}.", name);
        println!("Use --force to sign in again.");
        return Ok(());
    }

    println!("Starting Google sign-in...");
    println!();
    println!("A browser window will open for you to authorize access.");
    println!("If the browser doesn't open, check the terminal for a URL to copy.");
    println!();

    match context.sign_in().await {
        Ok(()) => {}
        Err(e) if e.is_cancelled() => {
            println!("Sign-in cancelled.");
            toast(config, &context);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    save_credentials_to_config(&final_client_id, &final_client_secret, &source);
    toast(config, &context);

    let snapshot = context.snapshot();
    let name = snapshot.profile.map(|p| p.name).unwrap_or_default();
    info!("sign-in successful");
    println!();
    println!("Signed in as {}.", name);
    println!("Your session has been saved.");

    Ok(())
}

/// Sign out of the provider, the backend, and this machine.
pub async fn signout(config: &ClientConfig) -> ClientResult<()> {
    // A provider is only needed to revoke the provider-side session; without
    // configured credentials the local and backend teardown still run.
    let provider: Arc<dyn IdentityProvider> = match config
        .google
        .as_ref()
        .map(GoogleSettings::to_provider_config)
    {
        Some(Ok(google_config)) => match GoogleIdentityProvider::new(google_config) {
            Ok(provider) => Arc::new(provider),
            Err(e) => {
                debug!("could not build Google provider: {}", e);
                Arc::new(UnconfiguredProvider::new("Google provider not configured"))
            }
        },
        _ => Arc::new(UnconfiguredProvider::new("Google provider not configured")),
    };

    let context = build_context(config, provider)?;
    context.bootstrap().await;
    context.sign_out_user().await;

    // The backend sign-out request is spawned; give it a moment to go out
    // before the process exits.
    tokio::time::sleep(Duration::from_millis(200)).await;

    toast(config, &context);
    println!("Signed out.");
    Ok(())
}

/// Shows the current notice as a desktop notification, if enabled.
fn toast(config: &ClientConfig, context: &AuthContext) {
    if !config.notifications.desktop {
        return;
    }
    let Some(notice) = context.notices().current() else {
        return;
    };

    let summary = match notice.kind {
        NoticeKind::Info => "EduPoint",
        NoticeKind::Warning => "EduPoint - warning",
    };

    if let Err(e) = notify_rust::Notification::new()
        .appname("edupoint")
        .summary(summary)
        .body(&notice.message)
        .show()
    {
        debug!("could not show desktop notification: {}", e);
    }
}

/// Where the credentials were resolved from.
#[derive(Debug, PartialEq)]
enum CredentialSource {
    /// From CLI flags (--client-id/--client-secret or --credentials-file)
    Cli,
    /// From config.toml (already persisted)
    Config,
}

/// Saves credentials to `config.toml` under `[google]`.
///
/// Only saves if the credentials came from a transient source (CLI flags or
/// `--credentials-file`). If they're already in config.toml, this is a no-op.
fn save_credentials_to_config(client_id: &str, client_secret: &str, source: &CredentialSource) {
    if *source == CredentialSource::Config {
        return;
    }

    let config_path = ClientConfig::default_path();

    // Read existing config or start fresh
    let content = if config_path.exists() {
        std::fs::read_to_string(&config_path).unwrap_or_default()
    } else {
        String::new()
    };

    let mut doc = match content.parse::<toml_edit::DocumentMut>() {
        Ok(d) => d,
        Err(e) => {
            info!("could not parse config.toml for writing: {}", e);
            return;
        }
    };

    // Ensure [google] table exists
    if !doc.contains_key("google") {
        doc["google"] = toml_edit::Item::Table(toml_edit::Table::new());
    }

    if let Some(google) = doc["google"].as_table_mut() {
        google["client_id"] = toml_edit::value(client_id);
        google["client_secret"] = toml_edit::value(client_secret);
    }

    // Ensure parent directory exists
    if let Some(parent) = config_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            info!(
                "could not create config directory {}: {}",
                parent.display(),
                e
            );
            return;
        }
    }

    match std::fs::write(&config_path, doc.to_string()) {
        Ok(()) => {
            info!("credentials saved to {}", config_path.display());
            println!("Credentials saved to {}", config_path.display());
        }
        Err(e) => {
            info!(
                "could not save credentials to {}: {}",
                config_path.display(),
                e
            );
        }
    }
}

/// Resolves Google credentials from multiple sources.
///
/// Priority (highest to lowest):
/// 1. CLI `--client-id` + `--client-secret`
/// 2. CLI `--credentials-file` (Google Cloud Console JSON)
/// 3. `config.toml` `[google]` section (client_id + client_secret, with secret resolution)
fn resolve_google_credentials(
    cli_client_id: Option<String>,
    cli_client_secret: Option<String>,
    cli_credentials_file: Option<PathBuf>,
    config_google: Option<&GoogleSettings>,
) -> ClientResult<(String, String, CredentialSource)> {
    // Priority 1: CLI client_id + client_secret
    if let (Some(id), Some(secret)) = (&cli_client_id, &cli_client_secret) {
        return Ok((id.clone(), secret.clone(), CredentialSource::Cli));
    }

    // Priority 2: CLI credentials file
    if let Some(ref path) = cli_credentials_file {
        let creds = OAuthCredentials::from_file(path).map_err(|e| {
            ClientError::Config(format!(
                "failed to load credentials from {}: {}",
                path.display(),
                e
            ))
        })?;
        return Ok((creds.client_id, creds.client_secret, CredentialSource::Cli));
    }

    // Priority 3: config.toml [google] section
    if let Some(google) = config_google
        && google.client_id.is_some()
        && google.client_secret.is_some()
    {
        let creds = google.resolve_credentials().map_err(|e| {
            ClientError::Config(format!(
                "failed to resolve Google credentials from config: {}",
                e
            ))
        })?;
        return Ok((creds.client_id, creds.client_secret, CredentialSource::Config));
    }

    // Handle partial CLI args (only id or only secret provided)
    if cli_client_id.is_some() || cli_client_secret.is_some() {
        return Err(ClientError::Config(
            "both --client-id and --client-secret are required when providing credentials directly"
                .to_string(),
        ));
    }

    let config_path = ClientConfig::default_path();
    Err(ClientError::Config(format!(
        "Google credentials are required. Provide via:\n  \
         - client_id + client_secret in {}\n  \
         - --client-id and --client-secret flags\n  \
         - --credentials-file flag (path to Google Cloud Console JSON)\n  \
         - GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET env vars",
        config_path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_credentials_from_cli() {
        let result = resolve_google_credentials(
            Some("cli-id.apps.googleusercontent.com".to_string()),
            Some("cli-secret".to_string()),
            None,
            None,
        );
        let (id, secret, source) = result.unwrap();
        assert_eq!(id, "cli-id.apps.googleusercontent.com");
        assert_eq!(secret, "cli-secret");
        assert_eq!(source, CredentialSource::Cli);
    }

    #[test]
    fn resolve_credentials_from_config() {
        let settings = GoogleSettings {
            client_id: Some("config-id.apps.googleusercontent.com".to_string()),
            client_secret: Some("config-secret".to_string()),
            ..Default::default()
        };
        let result = resolve_google_credentials(None, None, None, Some(&settings));
        let (id, secret, source) = result.unwrap();
        assert_eq!(id, "config-id.apps.googleusercontent.com");
        assert_eq!(secret, "config-secret");
        assert_eq!(source, CredentialSource::Config);
    }

    #[test]
    fn resolve_credentials_cli_overrides_config() {
        let settings = GoogleSettings {
            client_id: Some("config-id.apps.googleusercontent.com".to_string()),
            client_secret: Some("config-secret".to_string()),
            ..Default::default()
        };
        let result = resolve_google_credentials(
            Some("cli-id.apps.googleusercontent.com".to_string()),
            Some("cli-secret".to_string()),
            None,
            Some(&settings),
        );
        let (id, _, source) = result.unwrap();
        assert_eq!(id, "cli-id.apps.googleusercontent.com");
        assert_eq!(source, CredentialSource::Cli);
    }

    #[test]
    fn resolve_credentials_partial_cli_fails() {
        // Only client_id without client_secret should fail
        let result = resolve_google_credentials(
            Some("id.apps.googleusercontent.com".to_string()),
            None,
            None,
            None,
        );
        assert!(result.is_err());

        // Only client_secret without client_id should fail
        let result = resolve_google_credentials(None, Some("secret".to_string()), None, None);
        assert!(result.is_err());
    }

    #[test]
    fn resolve_credentials_no_credentials_fails() {
        let result = resolve_google_credentials(None, None, None, None);
        assert!(result.is_err());
    }

    #[test]
    fn resolve_credentials_from_cli_credentials_file() {
        let tmp = tempfile::tempdir().unwrap();
        let creds_path = tmp.path().join("creds.json");
        std::fs::write(
            &creds_path,
            r#"{
                "installed": {
                    "client_id": "file-id.apps.googleusercontent.com",
                    "client_secret": "file-secret"
                }
            }"#,
        )
        .unwrap();

        let result = resolve_google_credentials(None, None, Some(creds_path), None);
        let (id, secret, source) = result.unwrap();
        assert_eq!(id, "file-id.apps.googleusercontent.com");
        assert_eq!(secret, "file-secret");
        assert_eq!(source, CredentialSource::Cli);
    }

    #[test]
    fn save_credentials_skips_when_source_is_config() {
        // Verifies the no-op path doesn't panic or write anything
        save_credentials_to_config("id", "secret", &CredentialSource::Config);
    }
}
