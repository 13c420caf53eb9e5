//! Error taxonomy for the connection-and-resolution flow.
//!
//! Every stage reports failures as a [`LinkError`]. Transport-level failures
//! arrive as [`TransportFault`] and are classified by the stage that observed
//! them (a rejected `authenticate` is an auth error, a rejected `runCode` is a
//! compute error, and so on).

use std::time::Duration;
use thiserror::Error;

/// Failure of one resolution attempt. Terminal for that attempt.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The transport did not report "connected" before the deadline.
    #[error("Connection not established within {} seconds", .0.as_secs())]
    ConnectTimeout(Duration),

    /// The transport failed or closed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server rejected the credentials.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// No group or table with this name could be found.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Starting a compute session or running code on it failed.
    #[error("Compute error: {0}")]
    Compute(String),

    /// The model adapter could not build a model from the resolved handle.
    #[error("Model adapter error: {0}")]
    Adapter(String),

    /// The attempt was cancelled before it completed.
    #[error("Resolution cancelled")]
    Cancelled,

    /// Invalid endpoint or client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LinkError {
    /// Short, stable label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            LinkError::ConnectTimeout(_) => "connect_timeout",
            LinkError::Transport(_) => "transport",
            LinkError::Auth(_) => "auth",
            LinkError::ResourceNotFound(_) => "not_found",
            LinkError::Compute(_) => "compute",
            LinkError::Adapter(_) => "adapter",
            LinkError::Cancelled => "cancelled",
            LinkError::Config(_) => "config",
        }
    }

    /// Message shown in place of the loading indicator.
    pub fn user_message(&self) -> String {
        format!("Unable to open table: {}", self)
    }
}

/// Result type for link operations.
pub type LinkResult<T> = Result<T, LinkError>;

/// Errors reported by a [`Transport`](crate::net::Transport) implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportFault {
    /// Socket-level failure (DNS, TCP, TLS, handshake, framing).
    #[error("I/O error: {0}")]
    Io(String),

    /// The session was closed locally or by the peer.
    #[error("Session closed")]
    Closed,

    /// A request got no response within the request deadline.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The server refused the request for lack of valid credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The server does not know the requested object.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A frame could not be encoded or decoded.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Any other server-side error.
    #[error("Server error [{code}]: {message}")]
    Remote { code: String, message: String },
}

impl From<TransportFault> for LinkError {
    fn from(fault: TransportFault) -> Self {
        LinkError::Transport(fault.to_string())
    }
}
