//! Transport seam between the connection manager and the wire.
//!
//! A [`Connector`] opens a session and returns the [`Transport`] handle
//! together with the stream of [`SessionEvent`]s the server pushes. Opening
//! never blocks on the handshake: its outcome is reported on the event
//! stream as `Connected` or `Failed`, which is what the connection manager
//! waits for under its deadline.

use std::future::Future;
use tokio::sync::mpsc;

use crate::error::TransportFault;
use crate::net::endpoint::Endpoint;
use crate::net::types::{
    ComputeConfig, ExecutionResult, ResourceGroup, ResourceHandle, SessionId, VariableDefinition,
};
use crate::session::Credentials;

/// Signals pushed by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session is established. Fired at most once.
    Connected,
    /// The session could not be established.
    Failed(String),
    /// One or more groups became visible.
    GroupsAnnounced(Vec<ResourceGroup>),
    /// The session ended.
    Closed,
}

/// Receiving half of a session's event stream.
pub type SessionEvents = mpsc::UnboundedReceiver<SessionEvent>;

/// Opens transport sessions.
pub trait Connector: Send + Sync + 'static {
    type Transport: Transport;

    /// Begin opening a session to `endpoint`.
    ///
    /// Must be called from within a Tokio runtime.
    fn open(&self, endpoint: &Endpoint) -> Result<(Self::Transport, SessionEvents), TransportFault>;
}

/// Request/response operations on an open session.
pub trait Transport: Send + Sync + 'static {
    /// Submit credentials. `Unauthorized` when rejected.
    fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<(), TransportFault>> + Send;

    /// Snapshot of the groups currently known to the server.
    fn list_groups(&self) -> impl Future<Output = Result<Vec<ResourceGroup>, TransportFault>> + Send;

    /// Fetch a table that belongs to an announced group.
    fn fetch_table(
        &self,
        group: &str,
        table: &str,
    ) -> impl Future<Output = Result<ResourceHandle, TransportFault>> + Send;

    /// Start an interactive compute session.
    fn start_session(
        &self,
        config: &ComputeConfig,
    ) -> impl Future<Output = Result<SessionId, TransportFault>> + Send;

    /// Run code on a compute session.
    fn run_code(
        &self,
        session: &SessionId,
        code: &str,
    ) -> impl Future<Output = Result<ExecutionResult, TransportFault>> + Send;

    /// Fetch a variable created on a compute session.
    fn fetch_variable(
        &self,
        session: &SessionId,
        variable: &VariableDefinition,
    ) -> impl Future<Output = Result<ResourceHandle, TransportFault>> + Send;

    /// Release a compute session.
    fn close_session(
        &self,
        session: &SessionId,
    ) -> impl Future<Output = Result<(), TransportFault>> + Send;

    /// Close the session. Safe to call more than once.
    fn close(&self) -> impl Future<Output = ()> + Send;
}
