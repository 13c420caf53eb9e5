//! Network subsystem.
//!
//! # Data Flow
//! ```text
//! base URL (config)
//!     → endpoint.rs (scheme mapping, fixed session path)
//!     → transport.rs (Connector::open → Transport + SessionEvents)
//!         → ws.rs (tokio-tungstenite socket task)
//!         → protocol.rs (JSON request/response/event frames)
//! ```
//!
//! # Design Decisions
//! - The connection manager only sees the `Connector`/`Transport` traits
//! - Opening is non-blocking; the handshake result arrives as an event
//! - Every request has a deadline; a dead socket fails all in-flight requests

pub mod endpoint;
pub mod protocol;
pub mod transport;
pub mod types;
pub mod ws;

#[cfg(test)]
pub(crate) mod stub;

pub use endpoint::{Endpoint, SESSION_PATH};
pub use transport::{Connector, SessionEvent, SessionEvents, Transport};
pub use types::{
    ColumnDef, ComputeConfig, ExecutionResult, ResourceGroup, ResourceHandle, SessionId,
    VariableChanges, VariableDefinition,
};
pub use ws::{WsConnector, WsTransport};
