//! Create-ephemeral: ask the server to compute a table on a scratch session.

use crate::error::{LinkError, LinkResult, TransportFault};
use crate::net::{ComputeConfig, ResourceHandle, Transport};
use crate::session::Connection;

const PYTHON_TIME_TABLE: &str = "from deephaven import time_table\n\
t = time_table(\"PT1S\").update([\"x = i\"])\n";

const GROOVY_TIME_TABLE: &str = "t = timeTable(\"PT1S\").update(\"x = i\")\n";

/// A work unit to run on a fresh compute session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeRequest {
    pub config: ComputeConfig,
    pub code: String,
}

impl ComputeRequest {
    /// The default work unit: a table `t` ticking once per second, with a
    /// timestamp column and a row index `x`.
    pub fn time_table(config: ComputeConfig) -> Self {
        let code = match config.language.as_str() {
            "groovy" => GROOVY_TIME_TABLE,
            _ => PYTHON_TIME_TABLE,
        };
        Self {
            config,
            code: code.to_string(),
        }
    }

    /// Run caller-supplied code instead of the default work unit.
    pub fn with_code(config: ComputeConfig, code: impl Into<String>) -> Self {
        Self {
            config,
            code: code.into(),
        }
    }
}

impl Default for ComputeRequest {
    fn default() -> Self {
        Self::time_table(ComputeConfig::default())
    }
}

/// Start a session, run `request.code`, and fetch the first variable it
/// created. Every failure is a `Compute` error.
///
/// The session stays open for as long as the connection lives; teardown
/// closes it.
pub async fn create_ephemeral<T: Transport>(
    connection: &Connection<T>,
    request: &ComputeRequest,
) -> LinkResult<ResourceHandle> {
    let session = connection
        .start_session(&request.config)
        .await
        .map_err(|fault| compute("start session", fault))?;

    tracing::debug!(
        connection_id = %connection.id(),
        session = %session,
        language = %request.config.language,
        "Running work unit"
    );

    let result = connection
        .run_code(&session, &request.code)
        .await
        .map_err(|fault| compute("run code", fault))?;

    if let Some(error) = result.error {
        return Err(LinkError::Compute(format!("Execution failed: {}", error)));
    }

    let created = result
        .changes
        .created
        .first()
        .ok_or_else(|| LinkError::Compute("Execution created no variables".to_string()))?;

    let handle = connection
        .fetch_variable(&session, created)
        .await
        .map_err(|fault| compute("fetch variable", fault))?;

    tracing::info!(
        connection_id = %connection.id(),
        session = %session,
        table = %handle.name,
        "Ephemeral table created"
    );
    Ok(handle)
}

fn compute(stage: &str, fault: TransportFault) -> LinkError {
    LinkError::Compute(format!("Failed to {}: {}", stage, fault))
}
