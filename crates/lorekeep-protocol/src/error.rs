//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means the bytes could not be turned into a
//! frame (or a command into bytes). It never describes a network problem;
//! those are `TransportError`s in `lorekeep-transport`.

/// Errors that can occur while encoding commands or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of an outbound command failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// An inbound frame could not be parsed.
    ///
    /// Common causes: malformed JSON, a missing `type` tag, or a known tag
    /// whose payload has the wrong shape. Unknown tags are *not* an error;
    /// they decode to `ServerFrame::Unknown`.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed but breaks a protocol rule.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_frame_message() {
        let err = ProtocolError::InvalidFrame("empty session id".into());
        assert_eq!(err.to_string(), "invalid frame: empty session id");
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_decode_error_wraps_serde_message() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ProtocolError::Decode(source);
        assert!(err.to_string().starts_with("decode failed:"));
    }
}
