//! Scriptable in-process transport for unit tests.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::TransportFault;
use crate::net::endpoint::Endpoint;
use crate::net::transport::{Connector, SessionEvent, SessionEvents, Transport};
use crate::net::types::{
    ComputeConfig, ExecutionResult, ResourceGroup, ResourceHandle, SessionId, VariableChanges,
    VariableDefinition,
};
use crate::session::Credentials;

#[derive(Debug, Clone)]
enum ConnectPlan {
    After(Duration),
    FailAfter(Duration, String),
}

#[derive(Debug)]
struct StubState {
    connect: ConnectPlan,
    auth_rejection: Option<String>,
    auth_payloads: Vec<Credentials>,
    snapshot: Vec<ResourceGroup>,
    inject_on_snapshot: Vec<ResourceGroup>,
    announced: Vec<ResourceGroup>,
    created: Vec<VariableDefinition>,
    execution_error: Option<String>,
    start_error: Option<String>,
    hang_run_code: bool,
    hang_close_session: bool,
    code_runs: Vec<String>,
    sessions_started: Vec<SessionId>,
    sessions_closed: Vec<SessionId>,
    fetched_tables: Vec<(String, String)>,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
    open_count: usize,
    close_count: usize,
    list_calls: usize,
    signal_delivered: bool,
}

/// The fake server side shared by a [`StubConnector`] and its transports.
#[derive(Debug)]
pub(crate) struct StubServer {
    state: Mutex<StubState>,
}

impl StubServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(StubState {
                connect: ConnectPlan::After(Duration::ZERO),
                auth_rejection: None,
                auth_payloads: Vec::new(),
                snapshot: Vec::new(),
                inject_on_snapshot: Vec::new(),
                announced: Vec::new(),
                created: vec![VariableDefinition::table("t")],
                execution_error: None,
                start_error: None,
                hang_run_code: false,
                hang_close_session: false,
                code_runs: Vec::new(),
                sessions_started: Vec::new(),
                sessions_closed: Vec::new(),
                fetched_tables: Vec::new(),
                events: None,
                open_count: 0,
                close_count: 0,
                list_calls: 0,
                signal_delivered: false,
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn connect_after(&self, delay: Duration) {
        self.state().connect = ConnectPlan::After(delay);
    }

    pub fn fail_connect_after(&self, delay: Duration, reason: &str) {
        self.state().connect = ConnectPlan::FailAfter(delay, reason.to_string());
    }

    pub fn reject_auth(&self, message: &str) {
        self.state().auth_rejection = Some(message.to_string());
    }

    pub fn set_snapshot(&self, groups: Vec<ResourceGroup>) {
        self.state().snapshot = groups;
    }

    /// Announce `groups` while the next snapshot query is in flight, and
    /// leave them out of that snapshot.
    pub fn inject_during_snapshot(&self, groups: Vec<ResourceGroup>) {
        self.state().inject_on_snapshot = groups;
    }

    pub fn set_created(&self, created: Vec<VariableDefinition>) {
        self.state().created = created;
    }

    pub fn fail_execution(&self, message: &str) {
        self.state().execution_error = Some(message.to_string());
    }

    pub fn fail_start_session(&self, message: &str) {
        self.state().start_error = Some(message.to_string());
    }

    /// Leave every `run_code` call unanswered.
    pub fn hang_run_code(&self) {
        self.state().hang_run_code = true;
    }

    /// Leave every `close_session` call unanswered.
    pub fn hang_close_session(&self) {
        self.state().hang_close_session = true;
    }

    /// Push an announcement on the open session. Returns whether it was sent.
    pub fn announce(&self, groups: Vec<ResourceGroup>) -> bool {
        let mut state = self.state();
        state.announced.extend(groups.iter().cloned());
        match &state.events {
            Some(tx) => tx.send(SessionEvent::GroupsAnnounced(groups)).is_ok(),
            None => false,
        }
    }

    /// Push an announcement after `delay`.
    pub fn announce_after(self: &Arc<Self>, delay: Duration, groups: Vec<ResourceGroup>) {
        let server = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            server.announce(groups);
        });
    }

    pub fn close_from_server(&self) {
        if let Some(tx) = self.state().events.take() {
            let _ = tx.send(SessionEvent::Closed);
        }
    }

    pub fn open_count(&self) -> usize {
        self.state().open_count
    }

    pub fn close_count(&self) -> usize {
        self.state().close_count
    }

    pub fn list_calls(&self) -> usize {
        self.state().list_calls
    }

    pub fn signal_delivered(&self) -> bool {
        self.state().signal_delivered
    }

    pub fn auth_payloads(&self) -> Vec<Credentials> {
        self.state().auth_payloads.clone()
    }

    pub fn code_runs(&self) -> Vec<String> {
        self.state().code_runs.clone()
    }

    pub fn sessions_started(&self) -> Vec<SessionId> {
        self.state().sessions_started.clone()
    }

    pub fn sessions_closed(&self) -> Vec<SessionId> {
        self.state().sessions_closed.clone()
    }

    pub fn fetched_tables(&self) -> Vec<(String, String)> {
        self.state().fetched_tables.clone()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct StubConnector {
    server: Arc<StubServer>,
}

impl StubConnector {
    pub fn new(server: Arc<StubServer>) -> Self {
        Self { server }
    }
}

impl Connector for StubConnector {
    type Transport = StubTransport;

    fn open(&self, _endpoint: &Endpoint) -> Result<(StubTransport, SessionEvents), TransportFault> {
        let (tx, rx) = mpsc::unbounded_channel();
        let plan = {
            let mut state = self.server.state();
            state.open_count += 1;
            state.signal_delivered = false;
            state.events = Some(tx.clone());
            state.connect.clone()
        };

        let server = Arc::clone(&self.server);
        tokio::spawn(async move {
            let (delay, event) = match plan {
                ConnectPlan::After(delay) => (delay, SessionEvent::Connected),
                ConnectPlan::FailAfter(delay, reason) => (delay, SessionEvent::Failed(reason)),
            };
            tokio::time::sleep(delay).await;
            let delivered = tx.send(event).is_ok();
            server.state().signal_delivered = delivered;
        });

        Ok((
            StubTransport {
                server: Arc::clone(&self.server),
            },
            rx,
        ))
    }
}

#[derive(Debug)]
pub(crate) struct StubTransport {
    server: Arc<StubServer>,
}

impl Transport for StubTransport {
    async fn authenticate(&self, credentials: &Credentials) -> Result<(), TransportFault> {
        let mut state = self.server.state();
        state.auth_payloads.push(credentials.clone());
        match &state.auth_rejection {
            Some(message) => Err(TransportFault::Unauthorized(message.clone())),
            None => Ok(()),
        }
    }

    async fn list_groups(&self) -> Result<Vec<ResourceGroup>, TransportFault> {
        let (snapshot, injected) = {
            let mut state = self.server.state();
            state.list_calls += 1;
            (state.snapshot.clone(), std::mem::take(&mut state.inject_on_snapshot))
        };
        if !injected.is_empty() {
            self.server.announce(injected);
            tokio::task::yield_now().await;
        }
        Ok(snapshot)
    }

    async fn fetch_table(&self, group: &str, table: &str) -> Result<ResourceHandle, TransportFault> {
        let mut state = self.server.state();
        state.fetched_tables.push((group.to_string(), table.to_string()));
        let exists = state
            .snapshot
            .iter()
            .chain(state.announced.iter())
            .any(|g| g.name == group && g.tables.iter().any(|t| t == table));
        if !exists {
            return Err(TransportFault::NotFound(format!("{}/{}", group, table)));
        }
        Ok(ResourceHandle {
            id: format!("{}/{}", group, table),
            name: table.to_string(),
            columns: Vec::new(),
            size: Some(0),
            refreshing: false,
        })
    }

    async fn start_session(&self, _config: &ComputeConfig) -> Result<SessionId, TransportFault> {
        let mut state = self.server.state();
        if let Some(message) = &state.start_error {
            return Err(TransportFault::Remote {
                code: "session_failed".into(),
                message: message.clone(),
            });
        }
        let session = SessionId(format!("session-{}", state.sessions_started.len() + 1));
        state.sessions_started.push(session.clone());
        Ok(session)
    }

    async fn run_code(&self, _session: &SessionId, code: &str) -> Result<ExecutionResult, TransportFault> {
        let (hang, result) = {
            let mut state = self.server.state();
            state.code_runs.push(code.to_string());
            let result = ExecutionResult {
                changes: VariableChanges {
                    created: state.created.clone(),
                    ..VariableChanges::default()
                },
                error: state.execution_error.clone(),
            };
            (state.hang_run_code, result)
        };
        if hang {
            std::future::pending::<()>().await;
        }
        Ok(result)
    }

    async fn fetch_variable(
        &self,
        session: &SessionId,
        variable: &VariableDefinition,
    ) -> Result<ResourceHandle, TransportFault> {
        Ok(ResourceHandle {
            id: format!("{}/{}", session, variable.name),
            name: variable.name.clone(),
            columns: Vec::new(),
            size: None,
            refreshing: true,
        })
    }

    async fn close_session(&self, session: &SessionId) -> Result<(), TransportFault> {
        let hang = self.server.state().hang_close_session;
        if hang {
            std::future::pending::<()>().await;
        }
        self.server.state().sessions_closed.push(session.clone());
        Ok(())
    }

    async fn close(&self) {
        let mut state = self.server.state();
        state.close_count += 1;
        state.events = None;
    }
}
