//! Connection targets: where a client connects.

use lorekeep_protocol::{Role, SessionId};
use url::Url;

use crate::SessionError;

/// The address of one game session.
///
/// Renders as `ws://<host>/ws/game/<session-id>`, with `role` and
/// `dm_token` appended as query parameters when set.
///
/// ```rust
/// use lorekeep_protocol::Role;
/// use lorekeep_session::ConnectTarget;
///
/// let target = ConnectTarget::new("localhost:8000", "session-001")
///     .with_role(Role::Dm)
///     .with_dm_token("AG-DM-2026");
/// assert_eq!(
///     target.url().unwrap().as_str(),
///     "ws://localhost:8000/ws/game/session-001?role=dm&dm_token=AG-DM-2026"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    /// `host[:port]`. A leading `ws://` or `wss://` is accepted and picks
    /// the scheme.
    pub host: String,
    pub session_id: SessionId,
    pub role: Option<Role>,
    pub dm_token: Option<String>,
}

impl ConnectTarget {
    /// A target with no role or token; the server treats it as a player.
    pub fn new(host: impl Into<String>, session_id: impl Into<SessionId>) -> Self {
        Self {
            host: host.into(),
            session_id: session_id.into(),
            role: None,
            dm_token: None,
        }
    }

    /// Requests a role. The server may grant a lesser one.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Supplies the privileged token checked for the `dm` role.
    #[must_use]
    pub fn with_dm_token(mut self, token: impl Into<String>) -> Self {
        self.dm_token = Some(token.into());
        self
    }

    /// Builds the WebSocket URL.
    ///
    /// The session id is escaped as a single path segment and the token
    /// is form-encoded, so neither can change the shape of the URL.
    ///
    /// # Errors
    /// [`SessionError::InvalidTarget`] if the host is empty, is not a
    /// plain `host[:port]` with an optional `ws`/`wss` scheme, or the
    /// session id is empty.
    pub fn url(&self) -> Result<Url, SessionError> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(SessionError::InvalidTarget("host is empty".into()));
        }
        let id = self.session_id.as_str();
        if id.is_empty() || id == "." || id == ".." {
            return Err(SessionError::InvalidTarget(format!(
                "session id {id:?} is not a usable path segment"
            )));
        }

        let raw = if host.contains("://") {
            host.to_owned()
        } else {
            format!("ws://{host}")
        };
        let invalid =
            || SessionError::InvalidTarget(format!("host must be host[:port], got {host:?}"));

        let mut url = Url::parse(&raw).map_err(|_| invalid())?;
        if !matches!(url.scheme(), "ws" | "wss")
            || url.host_str().is_none_or(str::is_empty)
            || url.path() != "/"
            || url.query().is_some()
            || url.fragment().is_some()
            || !url.username().is_empty()
            || url.password().is_some()
        {
            return Err(invalid());
        }

        url.path_segments_mut()
            .map_err(|()| invalid())?
            .clear()
            .extend(["ws", "game", id]);

        if self.role.is_some() || self.dm_token.is_some() {
            let mut query = url.query_pairs_mut();
            if let Some(role) = self.role {
                query.append_pair("role", role.as_str());
            }
            if let Some(token) = &self.dm_token {
                query.append_pair("dm_token", token);
            }
        }
        Ok(url)
    }
}
