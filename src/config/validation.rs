//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics and returns every
//! problem found, not just the first.

use thiserror::Error;

use crate::config::schema::LinkConfig;
use crate::net::Endpoint;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

/// Validate a loaded configuration.
pub fn validate_config(config: &LinkConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = Endpoint::from_base_url(&config.service.base_url) {
        errors.push(ValidationError {
            field: "service.base_url",
            message: e.to_string(),
        });
    }

    if config.credentials.username.trim().is_empty() {
        errors.push(ValidationError {
            field: "credentials.username",
            message: "must not be empty".to_string(),
        });
    }

    let timeouts = [
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.resolve_secs", config.timeouts.resolve_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ];
    for (field, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError {
                field,
                message: "must be greater than zero".to_string(),
            });
        }
    }

    if !matches!(config.compute.language.as_str(), "python" | "groovy") {
        errors.push(ValidationError {
            field: "compute.language",
            message: format!(
                "unsupported language '{}'; expected python or groovy",
                config.compute.language
            ),
        });
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError {
            field: "observability.metrics_address",
            message: format!("'{}' is not a socket address", config.observability.metrics_address),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> LinkConfig {
        let mut config = LinkConfig::default();
        config.credentials.username = "alice".into();
        config.credentials.token = "t0k".into();
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid_config();
        config.service.base_url = "ftp://example.com".into();
        config.credentials.username = " ".into();
        config.timeouts.resolve_secs = 0;
        config.compute.language = "cobol".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "service.base_url",
                "credentials.username",
                "timeouts.resolve_secs",
                "compute.language",
            ]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = valid_config();
        config.observability.metrics_address = "nonsense".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "observability.metrics_address");
    }
}
