//! Credentials submitted once per connection.

use serde::Serialize;

use crate::config::CredentialsConfig;

/// Authentication scheme tag. Only password-style auth is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    Password,
}

/// Username and token, passed through to the server without interpretation.
///
/// Serializes as `{ "username", "token", "type": "password" }`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub token: String,
    #[serde(rename = "type")]
    pub scheme: AuthScheme,
}

impl Credentials {
    pub fn password(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
            scheme: AuthScheme::Password,
        }
    }
}

impl From<&CredentialsConfig> for Credentials {
    fn from(config: &CredentialsConfig) -> Self {
        Self::password(config.username.clone(), config.token.clone())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .field("scheme", &self.scheme)
            .finish()
    }
}
