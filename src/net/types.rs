//! Resource types exchanged with the remote service.

use serde::{Deserialize, Serialize};

/// A named server-side collection of tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub name: String,
    #[serde(default)]
    pub tables: Vec<String>,
}

impl ResourceGroup {
    pub fn new(name: impl Into<String>, tables: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            tables: tables.into_iter().map(Into::into).collect(),
        }
    }
}

/// Column metadata of a resolved table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

/// A resolved table. Opaque to the resolver; handed to the model adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHandle {
    /// Server-side identifier used to address the table.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
    /// Row count, when the server knows it.
    #[serde(default)]
    pub size: Option<u64>,
    /// Whether the table keeps updating after it was fetched.
    #[serde(default)]
    pub refreshing: bool,
}

/// Identifier of a compute session on the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Options for starting a compute session. Unset limits use server defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeConfig {
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heap_mb: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            language: "python".to_string(),
            heap_mb: None,
            timeout_secs: None,
        }
    }
}

impl From<&crate::config::ComputeSettings> for ComputeConfig {
    fn from(settings: &crate::config::ComputeSettings) -> Self {
        Self {
            language: settings.language.clone(),
            heap_mb: settings.heap_mb,
            timeout_secs: settings.session_timeout_secs,
        }
    }
}

/// A variable created, updated or removed by running code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl VariableDefinition {
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: "Table".to_string(),
        }
    }
}

/// Variable changes reported by a code execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableChanges {
    #[serde(default)]
    pub created: Vec<VariableDefinition>,
    #[serde(default)]
    pub updated: Vec<VariableDefinition>,
    #[serde(default)]
    pub removed: Vec<VariableDefinition>,
}

/// Outcome of running code on a compute session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(default)]
    pub changes: VariableChanges,
    /// Error message when the code raised.
    #[serde(default)]
    pub error: Option<String>,
}
