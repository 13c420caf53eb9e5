//! Timeout enforcement.
//!
//! # Responsibilities
//! - Race an in-flight operation against a deadline
//! - Drop the timer when the operation finishes first
//! - Drop the operation (and whatever it owns) when the deadline wins
//!
//! Dropping the losing side is the cancellation mechanism: a timed-out
//! operation's future is dropped, which runs the `Drop` of any listener or
//! guard it holds.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// The deadline elapsed before the operation completed.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("{label} did not complete within {deadline:?}")]
pub struct Elapsed {
    pub label: &'static str,
    pub deadline: Duration,
}

/// Run `op` under `deadline`.
///
/// Exactly one outcome is produced. If `op` completes first its output is
/// returned and the timer is dropped; otherwise `op` is dropped and
/// [`Elapsed`] is returned.
pub async fn with_deadline<F>(
    label: &'static str,
    deadline: Duration,
    op: F,
) -> Result<F::Output, Elapsed>
where
    F: Future,
{
    match tokio::time::timeout(deadline, op).await {
        Ok(output) => Ok(output),
        Err(_) => {
            tracing::debug!(operation = label, deadline_ms = deadline.as_millis() as u64, "Deadline elapsed");
            Err(Elapsed { label, deadline })
        }
    }
}
