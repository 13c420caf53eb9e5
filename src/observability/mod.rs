//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! session / resolver / flow produce:
//!     → logging.rs (structured log events with connection ids)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields (`connection_id`, `group`, `table`) on every event
//! - Credentials never appear in logs (tokens are redacted in Debug output)

pub mod logging;
pub mod metrics;
