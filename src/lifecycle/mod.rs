//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     broadcast → ResolutionFlow stops → connection torn down → exit
//! ```
//!
//! # Design Decisions
//! - One broadcast channel is the only cancellation source besides dropping
//!   the flow future
//! - Cancellation always ends in teardown

pub mod shutdown;
pub mod signals;

pub use shutdown::{cancelled, Shutdown};
pub use signals::spawn_signal_handler;
