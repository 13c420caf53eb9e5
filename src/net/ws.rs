//! WebSocket transport.
//!
//! # Responsibilities
//! - Perform the WebSocket handshake in the background and report it as
//!   `Connected` / `Failed` on the event stream
//! - Correlate request frames with responses by id
//! - Forward server-pushed group announcements as session events
//! - Fail every in-flight request when the socket ends
//!
//! # Data Flow
//! ```text
//! WsTransport::request ──▶ outbound queue ──▶ socket task ──▶ server
//!        ▲                                        │
//!        └──── pending map (id → oneshot) ◀───────┤ responses
//!                                                 └──▶ SessionEvents (announcements)
//! ```

use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;

use crate::error::TransportFault;
use crate::net::endpoint::Endpoint;
use crate::net::protocol::{
    FetchTableParams, FetchVariableParams, Incoming, Request, RunCodeParams, ServerEvent,
    SessionParams, METHOD_AUTHENTICATE, METHOD_CLOSE_SESSION, METHOD_FETCH_TABLE,
    METHOD_FETCH_VARIABLE, METHOD_LIST_GROUPS, METHOD_RUN_CODE, METHOD_START_SESSION,
};
use crate::net::transport::{Connector, SessionEvent, SessionEvents, Transport};
use crate::net::types::{
    ComputeConfig, ExecutionResult, ResourceGroup, ResourceHandle, SessionId, VariableDefinition,
};
use crate::session::Credentials;

/// How long `close` waits for the socket task to flush the close frame.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

type PendingMap = DashMap<u64, oneshot::Sender<Result<Value, TransportFault>>>;

/// Opens [`WsTransport`] sessions.
#[derive(Debug, Clone)]
pub struct WsConnector {
    request_timeout: Duration,
}

impl WsConnector {
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }
}

impl Connector for WsConnector {
    type Transport = WsTransport;

    fn open(&self, endpoint: &Endpoint) -> Result<(WsTransport, SessionEvents), TransportFault> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let pending: Arc<PendingMap> = Arc::new(DashMap::new());
        let closed = Arc::new(AtomicBool::new(false));

        let task = tokio::spawn(socket_task(
            endpoint.as_str().to_string(),
            outbound_rx,
            pending.clone(),
            events_tx,
            closed.clone(),
        ));

        let transport = WsTransport {
            outbound: outbound_tx,
            pending,
            next_id: AtomicU64::new(1),
            request_timeout: self.request_timeout,
            closed,
            task: Mutex::new(Some(task)),
        };
        Ok((transport, events_rx))
    }
}

/// A JSON-over-WebSocket session.
pub struct WsTransport {
    outbound: mpsc::UnboundedSender<Message>,
    pending: Arc<PendingMap>,
    next_id: AtomicU64,
    request_timeout: Duration,
    closed: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl WsTransport {
    async fn request<P, R>(&self, method: &'static str, params: P) -> Result<R, TransportFault>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportFault::Closed);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = serde_json::to_string(&Request { id, method, params })
            .map_err(|e| TransportFault::Protocol(format!("Failed to encode '{}': {}", method, e)))?;

        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        // The socket task drains the map after setting `closed`; re-check so
        // a request registered after the drain does not wait for its deadline.
        if self.closed.load(Ordering::SeqCst)
            || self.outbound.send(Message::Text(payload.into())).is_err()
        {
            self.pending.remove(&id);
            return Err(TransportFault::Closed);
        }

        tracing::trace!(request_id = id, method, "Request sent");

        let value = match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(result)) => result?,
            Ok(Err(_)) => return Err(TransportFault::Closed),
            Err(_) => {
                self.pending.remove(&id);
                tracing::warn!(request_id = id, method, "Request timed out");
                return Err(TransportFault::Timeout(self.request_timeout));
            }
        };

        serde_json::from_value(value)
            .map_err(|e| TransportFault::Protocol(format!("Invalid '{}' result: {}", method, e)))
    }
}

impl Transport for WsTransport {
    async fn authenticate(&self, credentials: &Credentials) -> Result<(), TransportFault> {
        let _: Value = self.request(METHOD_AUTHENTICATE, credentials).await?;
        Ok(())
    }

    async fn list_groups(&self) -> Result<Vec<ResourceGroup>, TransportFault> {
        self.request(METHOD_LIST_GROUPS, serde_json::json!({})).await
    }

    async fn fetch_table(&self, group: &str, table: &str) -> Result<ResourceHandle, TransportFault> {
        self.request(METHOD_FETCH_TABLE, FetchTableParams { group, table }).await
    }

    async fn start_session(&self, config: &ComputeConfig) -> Result<SessionId, TransportFault> {
        self.request(METHOD_START_SESSION, config).await
    }

    async fn run_code(&self, session: &SessionId, code: &str) -> Result<ExecutionResult, TransportFault> {
        self.request(
            METHOD_RUN_CODE,
            RunCodeParams {
                session_id: session,
                code,
            },
        )
        .await
    }

    async fn fetch_variable(
        &self,
        session: &SessionId,
        variable: &VariableDefinition,
    ) -> Result<ResourceHandle, TransportFault> {
        self.request(
            METHOD_FETCH_VARIABLE,
            FetchVariableParams {
                session_id: session,
                name: &variable.name,
                kind: &variable.kind,
            },
        )
        .await
    }

    async fn close_session(&self, session: &SessionId) -> Result<(), TransportFault> {
        let _: Value = self
            .request(METHOD_CLOSE_SESSION, SessionParams { session_id: session })
            .await?;
        Ok(())
    }

    async fn close(&self) {
        let task = match self.task.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(mut task) = task else {
            return;
        };

        let _ = self.outbound.send(Message::Close(None));
        if tokio::time::timeout(CLOSE_GRACE, &mut task).await.is_err() {
            tracing::debug!("Socket task did not finish after close frame, aborting");
            task.abort();
        }
        self.closed.store(true, Ordering::SeqCst);
        fail_pending(&self.pending);
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.task.lock() {
            if let Some(task) = guard.take() {
                task.abort();
            }
        }
    }
}

/// Fail every in-flight request with `Closed`.
fn fail_pending(pending: &PendingMap) {
    let ids: Vec<u64> = pending.iter().map(|entry| *entry.key()).collect();
    for id in ids {
        if let Some((_, tx)) = pending.remove(&id) {
            let _ = tx.send(Err(TransportFault::Closed));
        }
    }
}

async fn socket_task(
    url: String,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    pending: Arc<PendingMap>,
    events: mpsc::UnboundedSender<SessionEvent>,
    closed: Arc<AtomicBool>,
) {
    let ws = match connect_async(url.as_str()).await {
        Ok((ws, _response)) => ws,
        Err(e) => {
            tracing::warn!(endpoint = %url, error = %e, "WebSocket handshake failed");
            closed.store(true, Ordering::SeqCst);
            fail_pending(&pending);
            let _ = events.send(SessionEvent::Failed(e.to_string()));
            return;
        }
    };

    tracing::debug!(endpoint = %url, "WebSocket connected");
    let _ = events.send(SessionEvent::Connected);

    let (mut sink, mut stream) = ws.split();
    loop {
        tokio::select! {
            out = outbound.recv() => match out {
                Some(message) => {
                    let is_close = matches!(message, Message::Close(_));
                    if let Err(e) = sink.send(message).await {
                        tracing::warn!(error = %e, "WebSocket send failed");
                        break;
                    }
                    if is_close {
                        break;
                    }
                }
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => dispatch(text.as_str(), &pending, &events),
                Some(Ok(Message::Close(_))) | None => {
                    tracing::debug!(endpoint = %url, "WebSocket closed by peer");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "WebSocket read failed");
                    break;
                }
            },
        }
    }

    closed.store(true, Ordering::SeqCst);
    fail_pending(&pending);
    let _ = events.send(SessionEvent::Closed);
}

fn dispatch(text: &str, pending: &PendingMap, events: &mpsc::UnboundedSender<SessionEvent>) {
    match serde_json::from_str::<Incoming>(text) {
        Ok(Incoming::Response(response)) => match pending.remove(&response.id) {
            Some((_, tx)) => {
                let _ = tx.send(response.into_result());
            }
            None => tracing::debug!(request_id = response.id, "Response for unknown request"),
        },
        Ok(Incoming::Event(ServerEvent::GroupsAnnounced { groups })) => {
            tracing::debug!(count = groups.len(), "Groups announced");
            let _ = events.send(SessionEvent::GroupsAnnounced(groups));
        }
        Err(e) => tracing::warn!(error = %e, "Ignoring undecodable frame"),
    }
}
