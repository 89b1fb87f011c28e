//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/edupoint/config.toml` by default.
//!
//! Credential values (`client_id`, `client_secret`) support secret references:
//! - `pass::path/in/store` resolved via `pass show`
//! - `env::VAR_NAME` resolved from the environment
//! - plain text, used as-is

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use edupoint_auth::google::{GoogleAuthConfig, OAuthCredentials};

/// Configuration for the edupoint client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Google identity provider settings.
    pub google: Option<GoogleSettings>,

    /// Debug mode.
    pub debug: bool,

    /// Backend (session exchange) settings.
    #[serde(default)]
    pub backend: BackendSettings,

    /// Local auth storage settings.
    #[serde(default)]
    pub auth: AuthSettings,

    /// Notification settings.
    #[serde(default)]
    pub notifications: NotificationSettings,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Base URL of the EduPoint backend.
    pub base_url: String,

    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout: 15,
        }
    }
}

impl BackendSettings {
    /// Returns the request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Local auth storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Path to the persisted access token.
    pub token_path: Option<PathBuf>,
}

impl AuthSettings {
    /// Returns the token path, defaulting to the data directory.
    pub fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| ClientConfig::default_data_dir().join("token.json"))
    }
}

/// Notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Show desktop notifications for sign-in and sign-out outcomes.
    pub desktop: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self { desktop: true }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| format!("failed to read config: {}", e))?;
            toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &PathBuf) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("edupoint")
    }

    /// Returns the default data directory path.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("edupoint")
    }
}

/// Google identity provider settings.
///
/// Credentials (`client_id`, `client_secret`) are stored inline and support
/// secret references (`pass::…`, `env::…`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GoogleSettings {
    /// OAuth client ID (supports `pass::` and `env::` prefixes).
    pub client_id: Option<String>,

    /// OAuth client secret (supports `pass::` and `env::` prefixes).
    pub client_secret: Option<String>,

    /// OAuth scopes to request. Empty means the provider defaults.
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl GoogleSettings {
    /// Converts to provider configuration.
    ///
    /// Resolves credentials (expanding `pass::` / `env::` references) and
    /// builds a [`GoogleAuthConfig`] suitable for the provider.
    pub fn to_provider_config(&self) -> Result<GoogleAuthConfig, String> {
        let credentials = self.resolve_credentials()?;
        credentials.validate().map_err(|e| e.to_string())?;

        let mut config = GoogleAuthConfig::new(credentials);

        if !self.scopes.is_empty() {
            config = config.with_scopes(self.scopes.clone());
        }

        Ok(config)
    }

    /// Resolves Google OAuth credentials from inline fields.
    ///
    /// Both `client_id` and `client_secret` must be set. Each value is passed
    /// through `secret::resolve()` to expand `pass::` and `env::` references.
    pub(crate) fn resolve_credentials(&self) -> Result<OAuthCredentials, String> {
        let raw_id = self.client_id.as_deref().ok_or_else(|| {
            format!(
                "Google credentials not found. Add to {}:\n  \
                 [google]\n  \
                 client_id = \"YOUR_ID.apps.googleusercontent.com\"\n  \
                 client_secret = \"YOUR_SECRET\"\n\n  \
                 Or run: edupoint signin --credentials-file <path>",
                ClientConfig::default_path().display()
            )
        })?;

        let raw_secret = self.client_secret.as_deref().ok_or_else(|| {
            "client_secret is missing from [google] section in config.toml".to_string()
        })?;

        let resolved_id = crate::secret::resolve(raw_id)
            .map_err(|e| format!("failed to resolve client_id: {}", e))?;
        let resolved_secret = crate::secret::resolve(raw_secret)
            .map_err(|e| format!("failed to resolve client_secret: {}", e))?;

        Ok(OAuthCredentials::new(resolved_id, resolved_secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert!(config.google.is_none());
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.backend.timeout(), Duration::from_secs(15));
        assert!(config.notifications.desktop);
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
            debug = true

            [google]
            client_id = "test-id.apps.googleusercontent.com"
            client_secret = "test-secret"

            [backend]
            base_url = "https://api.edupoint.example"
            timeout = 30

            [auth]
            token_path = "/tmp/edupoint-token.json"

            [notifications]
            desktop = false
        "#;

        let config: ClientConfig = toml::from_str(toml_str).unwrap();
        assert!(config.debug);
        assert_eq!(config.backend.base_url, "https://api.edupoint.example");
        assert_eq!(config.backend.timeout, 30);
        assert_eq!(
            config.auth.token_path(),
            PathBuf::from("/tmp/edupoint-token.json")
        );
        assert!(!config.notifications.desktop);

        let google = config.google.unwrap();
        assert_eq!(
            google.client_id,
            Some("test-id.apps.googleusercontent.com".to_string())
        );
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: ClientConfig = toml::from_str("[backend]\ntimeout = 5\n").unwrap();
        assert_eq!(config.backend.timeout, 5);
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert!(config.auth.token_path.is_none());
    }

    #[test]
    fn resolve_credentials_plain_text() {
        let settings = GoogleSettings {
            client_id: Some("test-id.apps.googleusercontent.com".to_string()),
            client_secret: Some("test-secret".to_string()),
            ..Default::default()
        };
        let creds = settings.resolve_credentials().unwrap();
        assert_eq!(creds.client_id, "test-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "test-secret");
    }

    #[test]
    fn resolve_credentials_missing_fields() {
        let settings = GoogleSettings::default();
        assert!(settings.resolve_credentials().is_err());
    }

    #[test]
    fn provider_config_from_settings() {
        let settings = GoogleSettings {
            client_id: Some("test-id.apps.googleusercontent.com".to_string()),
            client_secret: Some("test-secret".to_string()),
            scopes: vec!["openid".to_string(), "email".to_string()],
        };
        let config = settings.to_provider_config().unwrap();
        assert_eq!(config.scopes, vec!["openid", "email"]);
    }

    #[test]
    fn load_from_missing_file_errors() {
        let result = ClientConfig::load_from(&PathBuf::from("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backend]\nbase_url = \"http://10.0.0.1:9000\"\n").unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.backend.base_url, "http://10.0.0.1:9000");
    }
}
