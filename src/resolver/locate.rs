//! Locate-existing: find a table inside a server-announced group.

use std::time::{Duration, Instant};

use crate::error::{LinkError, LinkResult, TransportFault};
use crate::net::{ResourceGroup, ResourceHandle, Transport};
use crate::resilience::with_deadline;
use crate::resolver::pending::PendingResolution;
use crate::session::Connection;

/// How long to wait for the group to be announced.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolve `table_name` from the group named `group_name`.
///
/// 1. register a group listener,
/// 2. scan the server's snapshot of known groups,
/// 3. otherwise scan each announced batch as it arrives,
/// 4. give up with `ResourceNotFound(group_name)` when `deadline` elapses.
///
/// The listener is disposed before the table is requested, on every path.
pub async fn locate<T: Transport>(
    connection: &Connection<T>,
    group_name: &str,
    table_name: &str,
    deadline: Duration,
) -> LinkResult<ResourceHandle> {
    let started = Instant::now();
    // Registration must precede the snapshot read.
    let mut pending = PendingResolution::register(connection, group_name);

    let found = with_deadline("locate", deadline, find_group(connection, &mut pending)).await;
    pending.dispose();

    let group = match found {
        Ok(result) => result?,
        Err(_) => {
            tracing::warn!(
                connection_id = %connection.id(),
                listener = %pending.listener_id(),
                group = group_name,
                deadline_secs = deadline.as_secs(),
                "Group not announced before deadline"
            );
            return Err(LinkError::ResourceNotFound(group_name.to_string()));
        }
    };

    tracing::debug!(
        connection_id = %connection.id(),
        group = %group.name,
        table = table_name,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Group located"
    );

    match connection.fetch_table(&group.name, table_name).await {
        Ok(handle) => Ok(handle),
        Err(TransportFault::NotFound(_)) => Err(LinkError::ResourceNotFound(table_name.to_string())),
        Err(fault) => Err(fault.into()),
    }
}

async fn find_group<T: Transport>(
    connection: &Connection<T>,
    pending: &mut PendingResolution,
) -> LinkResult<ResourceGroup> {
    let snapshot = connection.known_groups().await?;
    if let Some(group) = pending.first_match(&snapshot) {
        tracing::trace!(group = %group.name, "Matched in snapshot");
        return Ok(group);
    }

    while let Some(batch) = pending.next_batch().await {
        if let Some(group) = pending.first_match(&batch) {
            tracing::trace!(group = %group.name, "Matched in announcement");
            return Ok(group);
        }
    }

    Err(LinkError::Transport(format!(
        "Connection closed while waiting for group '{}'",
        pending.group_name()
    )))
}
