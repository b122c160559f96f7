//! Session types: the client's record of its one live connection.
//!
//! A session tracks:
//! - WHERE the connection is in its lifecycle (`ConnectionStatus`)
//! - WHICH session the client asked for, and which the server confirmed
//! - WHAT role and character the server assigned

use std::fmt;

use lorekeep_protocol::{CharacterId, ConnectionEstablished, Role, SessionId};

use crate::SessionError;

// ---------------------------------------------------------------------------
// ConnectionStatus
// ---------------------------------------------------------------------------

/// Connectivity of the client.
///
/// Transitions are strictly ordered:
///
/// ```text
///   Disconnected ──(connect)──→ Connecting ──(ack)──→ Connected
///        ↑                          │                     │
///        └─────(close / error)──────┴─────────────────────┘
/// ```
///
/// Opening never skips `Connecting`, and every close or transport error
/// lands on `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionStatus {
    /// Returns `true` if moving to `target` is a legal transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Disconnected, Self::Connecting)
                | (Self::Connecting, Self::Connected)
                | (Self::Connecting, Self::Disconnected)
                | (Self::Connected, Self::Disconnected)
        )
    }

    /// Returns `true` when commands may be sent.
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The client's view of its connection.
///
/// There is exactly one `Session` per client. It starts `Disconnected`,
/// and it is only ever changed through [`begin_connect`](Self::begin_connect),
/// [`establish`](Self::establish) and [`close`](Self::close), which enforce
/// the [`ConnectionStatus`] ordering.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    /// Current lifecycle state.
    pub status: ConnectionStatus,

    /// The session id the client asked for on its last connect.
    pub requested_id: Option<SessionId>,

    /// The session id the server confirmed. May differ from
    /// `requested_id`.
    pub session_id: Option<SessionId>,

    /// The role the server granted.
    pub role: Option<Role>,

    /// The character the server bound to this connection.
    pub character_id: Option<CharacterId>,
}

impl Session {
    /// `Disconnected → Connecting`.
    ///
    /// Clears what the server confirmed on a previous connection, since
    /// the next `CONNECTION_ESTABLISHED` may say something else.
    ///
    /// # Errors
    /// [`SessionError::InvalidTransition`] unless currently `Disconnected`.
    pub fn begin_connect(&mut self, requested: SessionId) -> Result<(), SessionError> {
        self.transition(ConnectionStatus::Connecting)?;
        tracing::debug!(session_id = %requested, "session connecting");
        self.requested_id = Some(requested);
        self.session_id = None;
        self.role = None;
        self.character_id = None;
        Ok(())
    }

    /// `Connecting → Connected`, recording what the server confirmed.
    ///
    /// A repeated acknowledgment while already `Connected` refreshes the
    /// recorded values without changing status.
    ///
    /// # Errors
    /// [`SessionError::InvalidTransition`] if currently `Disconnected`.
    pub fn establish(&mut self, ack: &ConnectionEstablished) -> Result<(), SessionError> {
        if self.status != ConnectionStatus::Connected {
            self.transition(ConnectionStatus::Connected)?;
        }
        self.session_id = Some(ack.session_id.clone());
        self.role = Some(ack.role);
        self.character_id = ack.character_id.clone();
        tracing::info!(
            session_id = %ack.session_id,
            role = %ack.role,
            "session established"
        );
        Ok(())
    }

    /// Any state → `Disconnected`. Returns `true` if the status changed.
    ///
    /// The confirmed ids are kept so a caller can inspect what the last
    /// connection was.
    pub fn close(&mut self) -> bool {
        if self.status == ConnectionStatus::Disconnected {
            return false;
        }
        tracing::debug!(from = %self.status, "session closed");
        self.status = ConnectionStatus::Disconnected;
        true
    }

    /// Returns `true` when commands may be sent.
    pub fn is_connected(&self) -> bool {
        self.status.is_connected()
    }

    fn transition(&mut self, to: ConnectionStatus) -> Result<(), SessionError> {
        if !self.status.can_transition_to(to) {
            return Err(SessionError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}
