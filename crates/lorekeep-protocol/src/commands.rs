//! Outbound commands: what the client sends to the game server.
//!
//! The server accepts two shapes on the same socket:
//!
//! ```text
//! { "type": "CONNECTION_REQUEST", "session_id": "session-001" }   ← session plumbing
//! { "action": "roll", "sides": 20, "count": 1, "modifier": 0 }    ← game actions
//! ```
//!
//! [`ClientCommand`] covers both. It is `#[serde(untagged)]`, so each
//! variant serializes as its inner enum with no extra wrapper.

use serde::{Deserialize, Serialize};

use crate::types::{CharacterId, CombatantId, NodeId, SessionId, SpellId};

// ---------------------------------------------------------------------------
// ClientCommand
// ---------------------------------------------------------------------------

/// Any message the client may put on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientCommand {
    /// Session plumbing, tagged by `type`.
    System(SystemRequest),
    /// A game action, tagged by `action`.
    Action(GameAction),
}

impl ClientCommand {
    /// The announcement sent right after the socket opens.
    pub fn connection_request(session_id: SessionId) -> Self {
        Self::System(SystemRequest::ConnectionRequest { session_id })
    }

    /// The discriminant value, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::System(SystemRequest::ConnectionRequest { .. }) => "CONNECTION_REQUEST",
            Self::Action(action) => action.name(),
        }
    }
}

impl From<GameAction> for ClientCommand {
    fn from(action: GameAction) -> Self {
        Self::Action(action)
    }
}

/// Session-level requests, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemRequest {
    /// "I am here for this session."
    #[serde(rename = "CONNECTION_REQUEST")]
    ConnectionRequest { session_id: SessionId },
}

// ---------------------------------------------------------------------------
// GameAction
// ---------------------------------------------------------------------------

/// What a map interaction is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    /// Move the party to another node.
    #[default]
    Travel,
    /// Move a character to a cell on the local grid.
    Move,
    /// Look at a node without moving.
    Inspect,
    /// Ask the server for a `MAP_DATA` frame.
    RequestData,
}

/// A game action, tagged by `action` in snake case.
///
/// Optional fields are left out of the JSON when `None`
/// (`skip_serializing_if`), which lets the server apply its own defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GameAction {
    // -- Combat --
    Attack {
        attacker_id: CombatantId,
        target_id: CombatantId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        weapon_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        action_name: Option<String>,
    },
    CastSpell {
        spell_id: SpellId,
        attacker_id: CombatantId,
        target_id: CombatantId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_ids: Option<Vec<CombatantId>>,
    },
    RollInitiative {
        combatant_id: CombatantId,
        name: String,
        dex_modifier: i32,
        is_player: bool,
    },
    StartCombat,
    NextTurn,
    Roll {
        sides: u32,
        count: u32,
        modifier: i32,
    },

    // -- Character --
    GetInventory {
        character_id: CharacterId,
    },
    EquipItem {
        character_id: CharacterId,
        item_id: String,
        slot: String,
    },
    UnequipItem {
        character_id: CharacterId,
        item_id: String,
    },
    GetSpells {
        character_id: CharacterId,
    },

    // -- Loot and shops --
    GenerateLoot {
        cr: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_character_id: Option<CharacterId>,
    },
    DistributeLoot {
        item_ids: Vec<String>,
        target_character_id: CharacterId,
    },
    GetShop {
        node_id: NodeId,
        character_id: CharacterId,
    },
    SearchMonsters {
        query: String,
    },

    // -- World --
    MapInteraction {
        character_id: CharacterId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_node_id: Option<NodeId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cell_id: Option<i64>,
        #[serde(default)]
        interaction_type: InteractionKind,
    },
    NarrativeAction {
        content: String,
    },

    // -- Widgets --
    CloseWidget {
        widget_id: String,
    },

    // -- Saves --
    SaveGame {
        save_id: String,
    },
    LoadGame {
        save_id: String,
    },
    ListSaves,
}

impl GameAction {
    /// A plain dice roll: `count`d`sides` + `modifier`.
    pub fn roll(sides: u32, count: u32, modifier: i32) -> Self {
        Self::Roll {
            sides,
            count,
            modifier,
        }
    }

    /// A weapon attack with the server's default weapon choice.
    pub fn attack(attacker: CombatantId, target: CombatantId) -> Self {
        Self::Attack {
            attacker_id: attacker,
            target_id: target,
            weapon_id: None,
            action_name: None,
        }
    }

    /// Travel to a map node.
    pub fn travel(character_id: CharacterId, node: NodeId) -> Self {
        Self::MapInteraction {
            character_id,
            target_node_id: Some(node),
            cell_id: None,
            interaction_type: InteractionKind::Travel,
        }
    }

    /// Ask the server to push the map node set.
    pub fn request_map_data(character_id: CharacterId) -> Self {
        Self::MapInteraction {
            character_id,
            target_node_id: None,
            cell_id: None,
            interaction_type: InteractionKind::RequestData,
        }
    }

    /// The `action` discriminant, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Attack { .. } => "attack",
            Self::CastSpell { .. } => "cast_spell",
            Self::RollInitiative { .. } => "roll_initiative",
            Self::StartCombat => "start_combat",
            Self::NextTurn => "next_turn",
            Self::Roll { .. } => "roll",
            Self::GetInventory { .. } => "get_inventory",
            Self::EquipItem { .. } => "equip_item",
            Self::UnequipItem { .. } => "unequip_item",
            Self::GetSpells { .. } => "get_spells",
            Self::GenerateLoot { .. } => "generate_loot",
            Self::DistributeLoot { .. } => "distribute_loot",
            Self::GetShop { .. } => "get_shop",
            Self::SearchMonsters { .. } => "search_monsters",
            Self::MapInteraction { .. } => "map_interaction",
            Self::NarrativeAction { .. } => "narrative_action",
            Self::CloseWidget { .. } => "close_widget",
            Self::SaveGame { .. } => "save_game",
            Self::LoadGame { .. } => "load_game",
            Self::ListSaves => "list_saves",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
