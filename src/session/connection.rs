//! Connection state machine and lifecycle.
//!
//! # Responsibilities
//! - Track connection state (Disconnected → Connecting → Connected → Disconnected)
//! - Generate unique connection IDs for tracing
//! - Pump session events into the group feed
//! - Release everything the session owns on teardown, exactly once

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::TransportFault;
use crate::net::{
    ComputeConfig, Endpoint, ExecutionResult, ResourceGroup, ResourceHandle, SessionEvent,
    SessionEvents, SessionId, Transport, VariableDefinition,
};
use crate::observability::metrics;
use crate::resilience::with_deadline;
use crate::session::feed::{GroupFeed, GroupListener};

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// How long teardown waits for the server to acknowledge each session close.
pub const SESSION_CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Connection state for lifecycle tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session, or the previous one was torn down.
    Disconnected,
    /// A session is being opened.
    Connecting,
    /// The session is established.
    Connected,
}

/// One established transport session.
///
/// Created by [`ConnectionManager::connect`](crate::session::ConnectionManager::connect).
/// The owner must call [`teardown`](Self::teardown) when done; dropping
/// without teardown only stops the event pump.
pub struct Connection<T: Transport> {
    id: ConnectionId,
    endpoint: Endpoint,
    transport: Arc<T>,
    feed: Arc<GroupFeed>,
    pump: Mutex<Option<JoinHandle<()>>>,
    sessions: Mutex<Vec<SessionId>>,
    torn_down: AtomicBool,
    alive: Arc<AtomicBool>,
    state: Arc<watch::Sender<ConnectionState>>,
}

impl<T: Transport> Connection<T> {
    pub(crate) fn start(
        id: ConnectionId,
        endpoint: Endpoint,
        transport: T,
        events: SessionEvents,
        state: Arc<watch::Sender<ConnectionState>>,
    ) -> Self {
        let feed = GroupFeed::new();
        let alive = Arc::new(AtomicBool::new(true));
        let pump = tokio::spawn(pump_events(id, events, feed.clone(), alive.clone()));
        state.send_replace(ConnectionState::Connected);

        Self {
            id,
            endpoint,
            transport: Arc::new(transport),
            feed,
            pump: Mutex::new(Some(pump)),
            sessions: Mutex::new(Vec::new()),
            torn_down: AtomicBool::new(false),
            alive,
            state,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn feed(&self) -> &Arc<GroupFeed> {
        &self.feed
    }

    /// Whether teardown has not run yet and the transport is still up.
    pub fn is_connected(&self) -> bool {
        !self.torn_down.load(Ordering::SeqCst) && self.alive.load(Ordering::SeqCst)
    }

    /// Register a listener for group announcements.
    pub fn listen_groups(&self) -> GroupListener {
        self.feed.listen()
    }

    /// Query the server's current snapshot of known groups.
    pub async fn known_groups(&self) -> Result<Vec<ResourceGroup>, TransportFault> {
        self.transport.list_groups().await
    }

    pub async fn fetch_table(&self, group: &str, table: &str) -> Result<ResourceHandle, TransportFault> {
        self.transport.fetch_table(group, table).await
    }

    /// Start a compute session scoped to this connection. It is closed on teardown.
    pub async fn start_session(&self, config: &ComputeConfig) -> Result<SessionId, TransportFault> {
        let session = self.transport.start_session(config).await?;
        lock(&self.sessions).push(session.clone());
        tracing::debug!(connection_id = %self.id, session = %session, "Compute session started");
        Ok(session)
    }

    pub async fn run_code(&self, session: &SessionId, code: &str) -> Result<ExecutionResult, TransportFault> {
        self.transport.run_code(session, code).await
    }

    pub async fn fetch_variable(
        &self,
        session: &SessionId,
        variable: &VariableDefinition,
    ) -> Result<ResourceHandle, TransportFault> {
        self.transport.fetch_variable(session, variable).await
    }

    /// Close the session and release everything it owns. Idempotent.
    pub async fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            tracing::trace!(connection_id = %self.id, "Teardown already done");
            return;
        }

        if let Some(pump) = lock(&self.pump).take() {
            pump.abort();
        }
        self.feed.close();

        let sessions = std::mem::take(&mut *lock(&self.sessions));
        let transport_alive = self.alive.load(Ordering::SeqCst);
        for session in sessions {
            if !transport_alive {
                tracing::debug!(connection_id = %self.id, session = %session, "Session lost with transport");
                continue;
            }
            let closed = with_deadline(
                "close_session",
                SESSION_CLOSE_GRACE,
                self.transport.close_session(&session),
            )
            .await;
            match closed {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::debug!(
                    connection_id = %self.id,
                    session = %session,
                    error = %e,
                    "Failed to close compute session"
                ),
                Err(_) => tracing::warn!(
                    connection_id = %self.id,
                    session = %session,
                    "Compute session close unanswered, abandoning"
                ),
            }
        }

        self.transport.close().await;
        self.state.send_replace(ConnectionState::Disconnected);
        metrics::record_teardown();
        tracing::info!(connection_id = %self.id, "Connection torn down");
    }
}

impl<T: Transport> Drop for Connection<T> {
    fn drop(&mut self) {
        if !self.torn_down.load(Ordering::SeqCst) {
            tracing::warn!(connection_id = %self.id, "Connection dropped without teardown");
            if let Some(pump) = lock(&self.pump).take() {
                pump.abort();
            }
            self.feed.close();
            self.state.send_replace(ConnectionState::Disconnected);
        }
    }
}

impl<T: Transport> std::fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint.as_str())
            .field("torn_down", &self.torn_down.load(Ordering::SeqCst))
            .finish()
    }
}

fn lock<V>(mutex: &Mutex<V>) -> std::sync::MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn pump_events(
    id: ConnectionId,
    mut events: SessionEvents,
    feed: Arc<GroupFeed>,
    alive: Arc<AtomicBool>,
) {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::GroupsAnnounced(groups) => {
                feed.announce(groups);
            }
            SessionEvent::Closed | SessionEvent::Failed(_) => {
                tracing::warn!(connection_id = %id, "Session ended by transport");
                break;
            }
            SessionEvent::Connected => {}
        }
    }
    alive.store(false, Ordering::SeqCst);
    feed.close();
}
