//! Client configuration.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use lorekeep_protocol::{Role, SessionId};
use lorekeep_session::ConnectTarget;

use crate::LorekeepError;

/// Settings shared by every connection a [`GameClient`](crate::GameClient)
/// makes and by [`WorldApi`](crate::WorldApi).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// `host[:port]` of the game server's WebSocket endpoint.
    pub host: String,
    /// Base URL for the HTTP side requests.
    pub http_base: String,
    /// How long an attempt may take before the client gives up and lands
    /// on `Disconnected`.
    pub connect_timeout: Duration,
    /// Role requested on connect. `None` leaves it to the server.
    pub role: Option<Role>,
    pub dm_token: Option<String>,
    /// Capacity of the effect broadcast channel. Slow subscribers lag and
    /// miss the oldest effects.
    pub effect_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost:8000".into(),
            http_base: "http://localhost:8000".into(),
            connect_timeout: Duration::from_secs(10),
            role: None,
            dm_token: None,
            effect_capacity: 64,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `LOREKEEP_*` environment variables.
    ///
    /// Values that do not parse are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = env::var("LOREKEEP_HOST") {
            config.host = host;
        }
        if let Ok(base) = env::var("LOREKEEP_HTTP_BASE") {
            config.http_base = base;
        }
        if let Some(secs) = read_env::<u64>("LOREKEEP_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(capacity) = read_env::<usize>("LOREKEEP_EFFECT_CAPACITY") {
            config.effect_capacity = capacity.max(1);
        }
        if let Ok(role) = env::var("LOREKEEP_ROLE") {
            match parse_role(&role) {
                Ok(role) => config.role = Some(role),
                Err(e) => tracing::warn!(error = %e, "ignoring LOREKEEP_ROLE"),
            }
        }
        if let Ok(token) = env::var("LOREKEEP_DM_TOKEN") {
            config.dm_token = Some(token);
        }

        config
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub fn with_http_base(mut self, base: impl Into<String>) -> Self {
        self.http_base = base.into();
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    #[must_use]
    pub fn with_dm_token(mut self, token: impl Into<String>) -> Self {
        self.dm_token = Some(token.into());
        self
    }

    /// The target for `session_id` on the configured host, carrying the
    /// configured role and token.
    pub fn target(&self, session_id: impl Into<SessionId>) -> ConnectTarget {
        let mut target = ConnectTarget::new(self.host.clone(), session_id);
        target.role = self.role;
        target.dm_token = self.dm_token.clone();
        target
    }
}

/// Parses `player` or `dm`, ignoring case.
///
/// # Errors
/// [`LorekeepError::Config`] for anything else.
pub fn parse_role(value: &str) -> Result<Role, LorekeepError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "player" => Ok(Role::Player),
        "dm" => Ok(Role::Dm),
        other => Err(LorekeepError::Config(format!("unknown role {other:?}"))),
    }
}

/// Reads and parses `key`. A value that does not parse is logged and
/// treated as unset.
fn read_env<T>(key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, "ignoring unparsable value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "localhost:8000");
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.role.is_none());
    }

    #[test]
    fn test_target_carries_role_and_token() {
        let config = ClientConfig::default()
            .with_host("game.example:9000")
            .with_role(Role::Dm)
            .with_dm_token("secret");
        let target = config.target("session-001");
        assert_eq!(
            target.url().unwrap().as_str(),
            "ws://game.example:9000/ws/game/session-001?role=dm&dm_token=secret"
        );
    }

    #[test]
    fn test_unparsable_env_value_reads_as_unset() {
        // SAFETY: the key is unique to this test.
        unsafe { env::set_var("LOREKEEP_TEST_READ_ENV_TIMEOUT", "ten") };
        assert_eq!(read_env::<u64>("LOREKEEP_TEST_READ_ENV_TIMEOUT"), None);

        unsafe { env::set_var("LOREKEEP_TEST_READ_ENV_TIMEOUT", " 12 ") };
        assert_eq!(read_env::<u64>("LOREKEEP_TEST_READ_ENV_TIMEOUT"), Some(12));

        unsafe { env::remove_var("LOREKEEP_TEST_READ_ENV_TIMEOUT") };
        assert_eq!(read_env::<u64>("LOREKEEP_TEST_READ_ENV_TIMEOUT"), None);
    }

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("DM").unwrap(), Role::Dm);
        assert_eq!(parse_role(" player ").unwrap(), Role::Player);
        assert!(matches!(
            parse_role("wizard"),
            Err(LorekeepError::Config(_))
        ));
    }
}
