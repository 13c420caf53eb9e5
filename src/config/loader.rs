//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::LinkConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `service.base_url`.
pub const ENV_BASE_URL: &str = "TABLELINK_URL";
/// Environment variable overriding `credentials.username`.
pub const ENV_USERNAME: &str = "TABLELINK_USERNAME";
/// Environment variable overriding `credentials.token`.
pub const ENV_TOKEN: &str = "TABLELINK_TOKEN";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply environment
/// overrides, then validate.
///
/// Without a file, defaults are used and the environment must supply at
/// least the username.
pub fn load_config(path: Option<&Path>) -> Result<LinkConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => LinkConfig::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::debug!(
        base_url = %config.service.base_url,
        username = %config.credentials.username,
        "Configuration loaded"
    );
    Ok(config)
}

/// Overlay values from `lookup` (normally the process environment).
///
/// Empty values are ignored.
pub fn apply_overrides<F>(config: &mut LinkConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(ENV_BASE_URL) {
        config.service.base_url = url;
    }
    if let Some(username) = get(ENV_USERNAME) {
        config.credentials.username = username;
    }
    if let Some(token) = get(ENV_TOKEN) {
        config.credentials.token = token;
    }
}
