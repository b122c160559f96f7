//! Typed identifiers used across the Lorekeep wire format.
//!
//! Every id the server hands out is a plain string on the wire, but a
//! session id, a combatant id and a spell id mean very different things.
//! Each gets its own newtype so the compiler rejects a `SpellId` where a
//! `CombatantId` is expected.

use serde::{Deserialize, Serialize};

// We import `fmt` for the Display impls generated below.
use std::fmt;

// ---------------------------------------------------------------------------
// Identity newtypes
// ---------------------------------------------------------------------------

/// Declares a string-backed identifier newtype.
///
/// `#[serde(transparent)]` keeps the JSON shape a bare string, so
/// `CombatantId::from("goblin_1")` serializes as `"goblin_1"` and not as
/// `{ "0": "goblin_1" }`.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw string id.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrows the raw id.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns the underlying `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id! {
    /// Identifies one game session on the server (the `<session-id>` part
    /// of `/ws/game/<session-id>`).
    SessionId
}

string_id! {
    /// Identifies a player character (the owner of an inventory or a
    /// spell book).
    CharacterId
}

string_id! {
    /// Identifies a member of the initiative roster.
    CombatantId
}

string_id! {
    /// Identifies an ad hoc combat target addressed by `targets/<id>/...`
    /// patches.
    TargetId
}

string_id! {
    /// Identifies a spell in the server's spell registry.
    SpellId
}

string_id! {
    /// Identifies a node on the world map.
    NodeId
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The role a connection plays in a session.
///
/// The client asks for a role in the connection URL; the server answers
/// with the role it actually granted in `CONNECTION_ESTABLISHED`. A
/// request for `Dm` without a valid token comes back as `Player`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A regular participant.
    #[default]
    Player,

    /// The game master (moderator), allowed to run privileged actions
    /// such as `start_combat` or `distribute_loot`.
    Dm,

    /// A role granted by a newer server that this client does not know.
    /// Carries no privileges.
    #[serde(other)]
    Unknown,
}

impl Role {
    /// The value used for the `role` query parameter and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Dm => "dm",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combatant_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&CombatantId::from("goblin_1")).unwrap();
        assert_eq!(json, "\"goblin_1\"");
    }

    #[test]
    fn test_session_id_deserializes_from_plain_string() {
        let id: SessionId = serde_json::from_str("\"session-001\"").unwrap();
        assert_eq!(id.as_str(), "session-001");
    }

    #[test]
    fn test_id_display_is_raw_string() {
        assert_eq!(SpellId::new("spell_fireball").to_string(), "spell_fireball");
    }

    #[test]
    fn test_ids_order_by_raw_string() {
        // TargetId is used as a BTreeMap key in the mirror.
        let mut ids = vec![TargetId::from("orc"), TargetId::from("goblin")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "goblin");
    }

    #[test]
    fn test_role_wire_format_is_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Dm).unwrap(), "\"dm\"");
        let role: Role = serde_json::from_str("\"player\"").unwrap();
        assert_eq!(role, Role::Player);
    }

    #[test]
    fn test_unrecognised_role_reads_as_unknown() {
        let role: Role = serde_json::from_str("\"spectator\"").unwrap();
        assert_eq!(role, Role::Unknown);
    }

    #[test]
    fn test_role_default_is_player() {
        assert_eq!(Role::default(), Role::Player);
        assert_eq!(Role::Dm.to_string(), "dm");
    }
}
