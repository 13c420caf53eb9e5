//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LinkConfig {
    /// Remote service location.
    pub service: ServiceConfig,

    /// Credentials submitted once per connection.
    pub credentials: CredentialsConfig,

    /// Deadlines for connect, resolution and individual requests.
    pub timeouts: TimeoutConfig,

    /// Compute session settings for the create-ephemeral path.
    pub compute: ComputeSettings,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Remote service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the service (e.g., "https://host:8123").
    pub base_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8123".to_string(),
        }
    }
}

/// Credentials as read from configuration.
#[derive(Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CredentialsConfig {
    pub username: String,
    pub token: String,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for the transport's "connected" signal in seconds.
    pub connect_secs: u64,

    /// Deadline for locating an announced group in seconds.
    pub resolve_secs: u64,

    /// Deadline for a single request/response round trip in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 60,
            resolve_secs: 10,
            request_secs: 30,
        }
    }
}

/// Compute session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ComputeSettings {
    /// Script language of the compute session ("python" or "groovy").
    pub language: String,

    /// Optional heap limit for the session in megabytes.
    pub heap_mb: Option<u32>,

    /// Optional server-side session timeout in seconds.
    pub session_timeout_secs: Option<u64>,
}

impl Default for ComputeSettings {
    fn default() -> Self {
        Self {
            language: "python".to_string(),
            heap_mb: None,
            session_timeout_secs: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
