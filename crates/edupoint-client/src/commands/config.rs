//! Configuration commands.

use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Dump the current configuration to stdout.
pub fn dump(config: &ClientConfig) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config).map_err(|e| {
        crate::error::ClientError::Config(format!("failed to serialize config: {}", e))
    })?;
    println!("# config.toml ({})", ClientConfig::default_path().display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    if config.backend.base_url.is_empty() {
        return Err(crate::error::ClientError::Config(
            "backend base_url must not be empty".to_string(),
        ));
    }
    if !config.backend.base_url.starts_with("http://")
        && !config.backend.base_url.starts_with("https://")
    {
        return Err(crate::error::ClientError::Config(format!(
            "backend base_url must be an http(s) URL, got: {}",
            config.backend.base_url
        )));
    }

    // Validate Google settings if credentials are present
    if let Some(ref google) = config.google
        && (google.client_id.is_some() || google.client_secret.is_some())
    {
        let provider_config = google.to_provider_config().map_err(|e| {
            crate::error::ClientError::Config(format!("invalid Google settings: {}", e))
        })?;
        provider_config.validate().map_err(|e| {
            crate::error::ClientError::Config(format!("invalid Google settings: {}", e))
        })?;
        println!("Google credentials are valid.");
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path() -> ClientResult<()> {
    let config_path = ClientConfig::default_path();
    println!("config: {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config() {
        assert!(validate(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let config: ClientConfig =
            toml::from_str("[backend]\nbase_url = \"ftp://example\"\n").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn validate_rejects_partial_credentials() {
        let config: ClientConfig = toml::from_str(
            "[google]\nclient_id = \"id.apps.googleusercontent.com\"\n",
        )
        .unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn dump_round_trips() {
        assert!(dump(&ClientConfig::default()).is_ok());
    }
}
