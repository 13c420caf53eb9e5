//! Transport endpoint derivation.
//!
//! The session endpoint is derived from the configured base URL: the scheme
//! is mapped to its WebSocket counterpart and the path is replaced by the
//! fixed session path. Query and fragment are dropped.

use url::Url;

use crate::error::LinkError;

/// Fixed path of the session socket on the remote service.
pub const SESSION_PATH: &str = "/socket";

/// WebSocket URL of the remote session. Immutable once derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(Url);

impl Endpoint {
    /// Derive the endpoint from a base service URL.
    pub fn from_base_url(base_url: &str) -> Result<Self, LinkError> {
        let mut url = Url::parse(base_url.trim()).map_err(|e| {
            LinkError::Config(format!("Invalid base URL '{}': {}", base_url, e))
        })?;

        if url.host_str().is_none() {
            return Err(LinkError::Config(format!(
                "Base URL '{}' must include a host",
                base_url
            )));
        }

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(LinkError::Config(format!(
                    "Unsupported scheme '{}'; expected http(s) or ws(s)",
                    other
                )));
            }
        };

        url.set_scheme(scheme)
            .map_err(|_| LinkError::Config("Failed to set WebSocket URL scheme".to_string()))?;
        url.set_path(SESSION_PATH);
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self(url))
    }

    /// The endpoint as a URL string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether the endpoint uses TLS.
    pub fn is_secure(&self) -> bool {
        self.0.scheme() == "wss"
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}
