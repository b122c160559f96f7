//! Unified error type for the Lorekeep client.

use lorekeep_protocol::ProtocolError;
use lorekeep_session::SessionError;
use lorekeep_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Transport failures during a live connection never surface here; they
/// show up as a `Disconnected` status in the mirrored state. This type
/// covers the calls that can be refused up front: a malformed target, a
/// connect while already connected, a bad environment value.
#[derive(Debug, thiserror::Error)]
pub enum LorekeepError {
    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (bad target, illegal transition).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// An HTTP side request failed.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// A service URL could not be parsed.
    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorekeep_session::ConnectionStatus;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let lorekeep_err: LorekeepError = err.into();
        assert!(matches!(lorekeep_err, LorekeepError::Transport(_)));
        assert!(lorekeep_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidFrame("bad".into());
        let lorekeep_err: LorekeepError = err.into();
        assert!(matches!(lorekeep_err, LorekeepError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::InvalidTransition {
            from: ConnectionStatus::Connected,
            to: ConnectionStatus::Connecting,
        };
        let lorekeep_err: LorekeepError = err.into();
        assert!(matches!(lorekeep_err, LorekeepError::Session(_)));
        assert!(lorekeep_err.to_string().contains("Connected -> Connecting"));
    }

    #[test]
    fn test_config_error_message() {
        let err = LorekeepError::Config("LOREKEEP_ROLE".into());
        assert_eq!(err.to_string(), "invalid configuration: LOREKEEP_ROLE");
    }
}
