//! Error types for the session layer.

use crate::ConnectionStatus;

/// Errors that can occur while building a target or moving a session
/// through its lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The requested lifecycle transition is not allowed, e.g.
    /// `Disconnected → Connected` without passing through `Connecting`.
    #[error("invalid session transition: {from} -> {to}")]
    InvalidTransition {
        from: ConnectionStatus,
        to: ConnectionStatus,
    },

    /// The connection target cannot be turned into a URL.
    #[error("invalid connection target: {0}")]
    InvalidTarget(String),
}
