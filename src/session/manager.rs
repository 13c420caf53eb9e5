//! Connection manager: bounded-time connect, authenticate, teardown.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::error::{LinkError, LinkResult, TransportFault};
use crate::net::{Connector, Endpoint, SessionEvent, SessionEvents, Transport};
use crate::observability::metrics;
use crate::resilience::with_deadline;
use crate::session::connection::{Connection, ConnectionId, ConnectionState};
use crate::session::credentials::Credentials;

/// Deadline for the transport's connected signal.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

/// Owns the connector and the single active connection slot.
pub struct ConnectionManager<C: Connector> {
    connector: C,
    connect_timeout: Duration,
    state: Arc<watch::Sender<ConnectionState>>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C, connect_timeout: Duration) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            connector,
            connect_timeout,
            state: Arc::new(state),
        }
    }

    /// Current state of the connection slot.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Subscribe to state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Open a session and wait for its connected signal under the connect deadline.
    ///
    /// On failure the half-open transport is closed and discarded.
    pub async fn connect(&self, endpoint: &Endpoint) -> LinkResult<Connection<C::Transport>> {
        let claimed = self.state.send_if_modified(|state| {
            if *state == ConnectionState::Disconnected {
                *state = ConnectionState::Connecting;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(LinkError::Transport("A connection is already active".to_string()));
        }
        let mut claim = SlotClaim {
            state: &self.state,
            held: true,
        };

        let id = ConnectionId::new();
        let started = Instant::now();
        tracing::info!(
            connection_id = %id,
            endpoint = %endpoint,
            secure = endpoint.is_secure(),
            "Connecting"
        );

        let (transport, mut events) = match self.connector.open(endpoint) {
            Ok(opened) => opened,
            Err(fault) => {
                metrics::record_connect("transport_error", started.elapsed());
                return Err(LinkError::Transport(fault.to_string()));
            }
        };

        let signal = with_deadline("connect", self.connect_timeout, wait_for_connected(&mut events)).await;
        let failure = match signal {
            Ok(Ok(())) => None,
            Ok(Err(fault)) => Some(LinkError::Transport(fault.to_string())),
            Err(_) => Some(LinkError::ConnectTimeout(self.connect_timeout)),
        };

        if let Some(err) = failure {
            // Nothing is read from `events` after this point.
            drop(events);
            transport.close().await;
            metrics::record_connect(err.kind(), started.elapsed());
            tracing::warn!(connection_id = %id, endpoint = %endpoint, error = %err, "Connect failed");
            return Err(err);
        }

        claim.held = false;
        let connection = Connection::start(id, endpoint.clone(), transport, events, self.state.clone());
        metrics::record_connect("connected", started.elapsed());
        tracing::info!(
            connection_id = %id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Connected"
        );
        Ok(connection)
    }

    /// Submit credentials over an established connection. No retry.
    pub async fn authenticate(
        &self,
        connection: &Connection<C::Transport>,
        credentials: &Credentials,
    ) -> LinkResult<()> {
        match connection.transport().authenticate(credentials).await {
            Ok(()) => {
                tracing::info!(
                    connection_id = %connection.id(),
                    username = %credentials.username,
                    "Authenticated"
                );
                Ok(())
            }
            Err(TransportFault::Unauthorized(message)) => {
                tracing::warn!(connection_id = %connection.id(), "Credentials rejected");
                Err(LinkError::Auth(message))
            }
            Err(fault) => Err(LinkError::Transport(fault.to_string())),
        }
    }

    /// Tear the connection down. Idempotent.
    pub async fn teardown(&self, connection: &Connection<C::Transport>) {
        connection.teardown().await;
    }
}

/// Returns the slot to `Disconnected` on drop unless handed over to a
/// `Connection`. Covers error returns and a caller dropping `connect`.
struct SlotClaim<'a> {
    state: &'a watch::Sender<ConnectionState>,
    held: bool,
}

impl Drop for SlotClaim<'_> {
    fn drop(&mut self) {
        if self.held {
            self.state.send_replace(ConnectionState::Disconnected);
        }
    }
}

/// Wait for `Connected`. Announcements seen earlier are covered by the
/// snapshot query a resolver makes later, so they are skipped here.
async fn wait_for_connected(events: &mut SessionEvents) -> Result<(), TransportFault> {
    loop {
        match events.recv().await {
            Some(SessionEvent::Connected) => return Ok(()),
            Some(SessionEvent::Failed(reason)) => return Err(TransportFault::Io(reason)),
            Some(SessionEvent::Closed) | None => return Err(TransportFault::Closed),
            Some(SessionEvent::GroupsAnnounced(groups)) => {
                tracing::trace!(count = groups.len(), "Announcement before connected signal");
            }
        }
    }
}
