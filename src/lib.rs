//! Thin client for tables hosted on a remote computation service.
//!
//! Connects over a WebSocket session, authenticates, and resolves a named
//! table either by locating it in a server-announced group or by asking the
//! server to compute one on a scratch session.

pub mod config;
pub mod error;
pub mod flow;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod resolver;
pub mod session;

pub use config::schema::LinkConfig;
pub use error::{LinkError, LinkResult};
pub use flow::{ModelAdapter, ResolutionFlow, ViewState};
pub use lifecycle::Shutdown;
pub use resolver::Selection;
