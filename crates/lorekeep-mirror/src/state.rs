//! The mirrored game state and its component records.

use std::collections::BTreeMap;

use lorekeep_protocol::{
    CharacterId, Combatant, DiceResult, FactPacket, InventoryItem, LogLevel, MapNode, NodeId,
    SaveSummary, ShopInventory, Spell, TargetId, Widget,
};
use lorekeep_session::Session;
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// TargetRecord
// ---------------------------------------------------------------------------

/// An ad hoc combat participant addressed by `targets/<id>/<field>`
/// patches.
///
/// Targets are created lazily the first time a patch names them, so the
/// defaults matter: a fresh target has 0 hp, which makes the first `hp`
/// patch read as a heal.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetRecord {
    pub hp: i64,
    pub status: String,
    pub ac: Option<i64>,
    pub conditions: Vec<String>,
    /// Fields the server patched that this client has no typed slot for.
    pub extra: Map<String, Value>,
}

/// Armor class given to targets the server has not described yet.
pub const DEFAULT_TARGET_AC: i64 = 10;

impl Default for TargetRecord {
    fn default() -> Self {
        Self {
            hp: 0,
            status: "unknown".to_string(),
            ac: Some(DEFAULT_TARGET_AC),
            conditions: Vec::new(),
            extra: Map::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// The most recent `MAP_UPDATE` interaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MapInteraction {
    pub cell_id: Option<i64>,
    pub interaction_type: String,
    pub character_id: Option<CharacterId>,
}

/// World map projection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapState {
    pub nodes: Vec<MapNode>,
    pub current_node_id: Option<NodeId>,
    pub last_interaction: Option<MapInteraction>,
}

impl MapState {
    /// Looks up a node by id.
    pub fn node(&self, id: &NodeId) -> Option<&MapNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }
}

// ---------------------------------------------------------------------------
// Toast
// ---------------------------------------------------------------------------

/// A short-lived notification. Toasts are independent of the narrative
/// log: dismissing one never touches a log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Unique within one `GameState` lineage; used to dismiss.
    pub id: u64,
    pub level: LogLevel,
    pub message: String,
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// The client's mirror of authoritative server state.
///
/// A `GameState` is never edited in place once published. Every change
/// produces a new value that replaces the old one wholesale (see
/// [`Mirror`](crate::Mirror)), so observers can compare `Arc` pointers to
/// learn whether anything changed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameState {
    // -- Connectivity --
    pub session: Session,

    // -- Narrative --
    /// Finalized log entries, append-only.
    pub narrative: Vec<String>,
    /// Text of the narrative entry currently streaming in.
    pub current_narrative: String,
    pub is_streaming: bool,

    // -- Combat --
    pub targets: BTreeMap<TargetId, TargetRecord>,
    pub last_fact_packet: Option<FactPacket>,
    pub last_dice_result: Option<DiceResult>,
    /// Initiative roster in server order.
    pub combatants: Vec<Combatant>,
    pub current_round: u32,

    // -- Character --
    pub inventory: Vec<InventoryItem>,
    pub spells: Vec<Spell>,
    pub gold: i64,

    // -- World --
    pub map: MapState,
    pub visited_node_ids: Vec<NodeId>,
    pub shop_inventory: Option<ShopInventory>,
    pub monster_search_results: Vec<Value>,
    pub saves: Vec<SaveSummary>,

    // -- Presentation cues --
    pub active_widgets: Vec<Widget>,
    pub toasts: Vec<Toast>,
    /// Set when a target took damage; cleared by the application layer.
    pub screen_shake: bool,

    pub(crate) next_toast_id: u64,
}

impl GameState {
    /// Appends a toast and returns its id.
    pub fn push_toast(&mut self, level: LogLevel, message: impl Into<String>) -> u64 {
        self.next_toast_id += 1;
        let id = self.next_toast_id;
        self.toasts.push(Toast {
            id,
            level,
            message: message.into(),
        });
        id
    }

    /// Looks up a combatant by id.
    pub fn combatant(&self, id: &str) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id.as_str() == id)
    }

    /// Looks up a target by id.
    pub fn target(&self, id: &str) -> Option<&TargetRecord> {
        self.targets.get(&TargetId::from(id))
    }
}
