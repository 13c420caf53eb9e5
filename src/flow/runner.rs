//! One resolution attempt from connect to teardown.

use std::time::{Duration, Instant};
use tokio::sync::broadcast;

use crate::config::LinkConfig;
use crate::error::{LinkError, LinkResult};
use crate::flow::adapter::ModelAdapter;
use crate::lifecycle::cancelled;
use crate::net::{ComputeConfig, Connector, Endpoint};
use crate::resolver::{self, ComputeRequest, ResolveOptions, Selection};
use crate::session::{Connection, ConnectionManager, Credentials};

/// Connect → authenticate → resolve → adapt, then always tear down.
pub struct ResolutionFlow<C: Connector> {
    manager: ConnectionManager<C>,
    endpoint: Endpoint,
    credentials: Credentials,
    options: ResolveOptions,
}

impl<C: Connector> ResolutionFlow<C> {
    pub fn new(
        manager: ConnectionManager<C>,
        endpoint: Endpoint,
        credentials: Credentials,
        options: ResolveOptions,
    ) -> Self {
        Self {
            manager,
            endpoint,
            credentials,
            options,
        }
    }

    /// Build a flow from a validated config.
    pub fn from_config(connector: C, config: &LinkConfig) -> LinkResult<Self> {
        let endpoint = Endpoint::from_base_url(&config.service.base_url)?;
        let manager = ConnectionManager::new(connector, Duration::from_secs(config.timeouts.connect_secs));
        let options = ResolveOptions {
            locate_timeout: Duration::from_secs(config.timeouts.resolve_secs),
            compute: ComputeRequest::time_table(ComputeConfig::from(&config.compute)),
        };
        Ok(Self::new(
            manager,
            endpoint,
            Credentials::from(&config.credentials),
            options,
        ))
    }

    pub fn manager(&self) -> &ConnectionManager<C> {
        &self.manager
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Run one attempt. Firing `cancel` stops it with `Cancelled`.
    ///
    /// Once connected, the connection is torn down before returning on every
    /// path. Dropping the returned future instead releases the listener and
    /// aborts the connection's background task through `Drop`.
    pub async fn run<A: ModelAdapter>(
        &self,
        selection: &Selection,
        adapter: &A,
        mut cancel: broadcast::Receiver<()>,
    ) -> LinkResult<A::Model> {
        let started = Instant::now();

        let connection = tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => {
                tracing::info!(endpoint = %self.endpoint, "Cancelled while connecting");
                return Err(LinkError::Cancelled);
            }
            result = self.manager.connect(&self.endpoint) => result?,
        };

        let outcome = tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => Err(LinkError::Cancelled),
            result = self.resolve_and_adapt(&connection, selection, adapter) => result,
        };

        self.manager.teardown(&connection).await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(_) => tracing::info!(target_table = %selection, elapsed_ms, "Table ready"),
            Err(e) => tracing::warn!(
                target_table = %selection,
                elapsed_ms,
                kind = e.kind(),
                error = %e,
                "Resolution failed"
            ),
        }
        outcome
    }

    async fn resolve_and_adapt<A: ModelAdapter>(
        &self,
        connection: &Connection<C::Transport>,
        selection: &Selection,
        adapter: &A,
    ) -> LinkResult<A::Model> {
        self.manager.authenticate(connection, &self.credentials).await?;
        let handle = resolver::resolve(connection, selection, &self.options).await?;
        adapter
            .make_model(handle)
            .await
            .map_err(|fault| LinkError::Adapter(fault.to_string()))
    }
}
