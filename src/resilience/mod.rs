//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Awaiting a remote signal:
//!     → timeouts.rs (race the wait against a deadline)
//!     → winner's output returned, loser dropped
//! ```
//!
//! # Design Decisions
//! - Every wait on the remote side has a deadline
//! - No automatic retries; each failure is terminal for the attempt
//! - Timeout errors are distinct from other errors

pub mod timeouts;

pub use timeouts::{with_deadline, Elapsed};
