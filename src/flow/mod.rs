//! Resolution flow subsystem.
//!
//! # Data Flow
//! ```text
//! Selection + ModelAdapter + shutdown receiver
//!     → runner.rs (connect → authenticate → resolve → adapt)
//!     → adapter.rs (ResourceHandle → Model)
//!     → teardown (every path once connected)
//!     → view.rs (Loading / Ready / Failed)
//! ```
//!
//! # Design Decisions
//! - The flow owns the connection for the whole attempt
//! - Errors are surfaced once, after cleanup
//! - Cancellation is a shutdown broadcast or dropping the future

pub mod adapter;
pub mod runner;
pub mod view;

pub use adapter::{AdapterFault, ModelAdapter, SummaryAdapter, TableSummary};
pub use runner::ResolutionFlow;
pub use view::ViewState;
