//! In-flight state of one locate attempt.

use crate::net::{ResourceGroup, Transport};
use crate::session::{Connection, GroupListener, ListenerId};

/// Correlates a desired group name with the listener watching for it.
///
/// The listener is registered on construction, which must happen before the
/// snapshot of known groups is read: anything announced after registration
/// is queued for this resolution even if the snapshot missed it.
/// Disposal is idempotent and also runs on drop, so every exit path
/// (match, deadline, transport failure, caller cancellation) releases it.
#[derive(Debug)]
pub struct PendingResolution {
    group_name: String,
    listener: GroupListener,
}

impl PendingResolution {
    /// Register the listener for `group_name` on `connection`.
    pub fn register<T: Transport>(connection: &Connection<T>, group_name: &str) -> Self {
        let listener = connection.listen_groups();
        tracing::debug!(
            connection_id = %connection.id(),
            listener = %listener.id(),
            group = group_name,
            "Resolution pending"
        );
        Self {
            group_name: group_name.to_string(),
            listener,
        }
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    pub fn listener_id(&self) -> ListenerId {
        self.listener.id()
    }

    /// First group in `groups` whose name matches, in iteration order.
    pub fn first_match(&self, groups: &[ResourceGroup]) -> Option<ResourceGroup> {
        groups.iter().find(|g| g.name == self.group_name).cloned()
    }

    /// Wait for the next announcement batch. `None` once disposed or the
    /// connection's feed closed.
    pub async fn next_batch(&mut self) -> Option<Vec<ResourceGroup>> {
        self.listener.next_batch().await
    }

    /// Release the listener. Returns whether this call did the release.
    pub fn dispose(&mut self) -> bool {
        self.listener.dispose()
    }

    pub fn is_disposed(&self) -> bool {
        self.listener.is_disposed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::stub::{StubConnector, StubServer};
    use crate::net::Endpoint;
    use crate::session::{ConnectionManager, DEFAULT_CONNECT_TIMEOUT};

    #[tokio::test(start_paused = true)]
    async fn test_register_dispose_lifecycle() {
        let server = StubServer::new();
        let manager = ConnectionManager::new(StubConnector::new(server), DEFAULT_CONNECT_TIMEOUT);
        let conn = manager
            .connect(&Endpoint::from_base_url("http://stub").unwrap())
            .await
            .unwrap();

        let mut pending = PendingResolution::register(&conn, "Q1");
        let other = PendingResolution::register(&conn, "Q1");
        assert_ne!(pending.listener_id(), other.listener_id());
        drop(other);
        assert_eq!(conn.feed().listener_count(), 1);
        assert_eq!(pending.group_name(), "Q1");

        assert!(pending.dispose());
        assert!(!pending.dispose());
        assert!(pending.is_disposed());
        assert_eq!(conn.feed().listener_count(), 0);

        assert_eq!(conn.feed().announce(vec![ResourceGroup::new("Q1", ["T1"])]), 0);
        assert!(pending.next_batch().await.is_none());

        drop(pending);
        assert_eq!(conn.feed().listener_count(), 0);
        conn.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_match_wins() {
        let server = StubServer::new();
        let manager = ConnectionManager::new(StubConnector::new(server), DEFAULT_CONNECT_TIMEOUT);
        let conn = manager
            .connect(&Endpoint::from_base_url("http://stub").unwrap())
            .await
            .unwrap();

        let pending = PendingResolution::register(&conn, "Q1");
        let groups = vec![
            ResourceGroup::new("Q0", ["T1"]),
            ResourceGroup::new("Q1", ["first"]),
            ResourceGroup::new("Q1", ["second"]),
        ];
        let found = pending.first_match(&groups).unwrap();
        assert_eq!(found.tables, vec!["first".to_string()]);
        assert!(pending.first_match(&groups[..1]).is_none());

        drop(pending);
        conn.teardown().await;
    }
}
