//! Resource resolution subsystem.
//!
//! # Data Flow
//! ```text
//! query string
//!     → selection.rs (queryName + tableName → Locate, else CreateEphemeral)
//!     → locate.rs
//!         → pending.rs (listener registered before the snapshot read)
//!         → snapshot scan, then announcement batches, under the locate deadline
//!     → ephemeral.rs (start session → run code → fetch first created variable)
//!     → ResourceHandle
//! ```
//!
//! # Design Decisions
//! - Listener registration happens before the snapshot is read
//! - First matching group wins
//! - The listener is released on every exit path, including drop

pub mod ephemeral;
pub mod locate;
pub mod pending;
pub mod selection;

use std::time::Duration;

use crate::error::LinkResult;
use crate::net::{ResourceHandle, Transport};
use crate::observability::metrics;
use crate::session::Connection;

pub use ephemeral::{create_ephemeral, ComputeRequest};
pub use locate::{locate, DEFAULT_RESOLVE_TIMEOUT};
pub use pending::PendingResolution;
pub use selection::Selection;

/// Per-strategy settings for [`resolve`].
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Deadline for the group to be announced.
    pub locate_timeout: Duration,
    /// Work unit for the create-ephemeral strategy.
    pub compute: ComputeRequest,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            locate_timeout: DEFAULT_RESOLVE_TIMEOUT,
            compute: ComputeRequest::default(),
        }
    }
}

/// Run the strategy `selection` names on an authenticated connection.
pub async fn resolve<T: Transport>(
    connection: &Connection<T>,
    selection: &Selection,
    options: &ResolveOptions,
) -> LinkResult<ResourceHandle> {
    tracing::info!(
        connection_id = %connection.id(),
        strategy = selection.strategy(),
        target = %selection,
        "Resolving table"
    );

    let result = match selection {
        Selection::Locate { group, table } => {
            locate(connection, group, table, options.locate_timeout).await
        }
        Selection::CreateEphemeral => create_ephemeral(connection, &options.compute).await,
    };

    let outcome = match &result {
        Ok(_) => "resolved",
        Err(e) => e.kind(),
    };
    metrics::record_resolution(selection.strategy(), outcome);
    result
}
