//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! Endpoint
//!     → manager.rs (open via Connector, await "connected" under deadline)
//!     → connection.rs (Connection: event pump, scoped compute sessions)
//!         → feed.rs (announcements fanned out to listeners)
//!     → manager.rs (authenticate with Credentials)
//!     ...
//!     → connection.rs (teardown: listeners, sessions, transport)
//! ```
//!
//! # Design Decisions
//! - At most one active connection per manager
//! - Failed connects discard the transport; callers build a new one to retry
//! - Teardown is idempotent and is the single cleanup boundary

pub mod connection;
pub mod credentials;
pub mod feed;
pub mod manager;

pub use connection::{Connection, ConnectionId, ConnectionState, SESSION_CLOSE_GRACE};
pub use credentials::{AuthScheme, Credentials};
pub use feed::{GroupFeed, GroupListener, ListenerId};
pub use manager::{ConnectionManager, DEFAULT_CONNECT_TIMEOUT};
