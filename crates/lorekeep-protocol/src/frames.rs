//! Inbound frames: everything the game server pushes to the client.
//!
//! Each frame is a JSON object tagged by a `type` field, for example:
//!
//! ```text
//! { "type": "NARRATIVE_CHUNK", "content": "The goblin", "index": 0, "done": false }
//! ```
//!
//! [`ServerFrame`] is the closed set of frames this client understands.
//! Tags it does not recognise decode to [`ServerFrame::Unknown`] instead of
//! failing, so a server that grows a new frame type never breaks an older
//! client.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{CharacterId, CombatantId, NodeId, Role, SessionId, SpellId};

/// An opaque bag of resolved-action outcome fields (roll totals, hit/miss,
/// damage) attached to a state patch.
pub type FactPacket = Map<String, Value>;

// ---------------------------------------------------------------------------
// ServerFrame
// ---------------------------------------------------------------------------

/// A decoded inbound frame.
///
/// `#[serde(tag = "type")]` makes this "internally tagged": the variant is
/// chosen by the `type` field and the remaining fields fill the payload
/// struct. `rename_all = "SCREAMING_SNAKE_CASE"` maps `StatePatch` to
/// `"STATE_PATCH"`.
///
/// `#[serde(other)]` on `Unknown` catches every tag not listed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerFrame {
    // -- Connection lifecycle --
    /// The server accepted the connection and reports what it granted.
    ConnectionEstablished(ConnectionEstablished),

    // -- Narrative --
    /// One fragment of streamed narrative text.
    NarrativeChunk(NarrativeChunk),
    /// A complete, non-streamed narrative event (travel, discovery, ...).
    NarrativeEvent(NarrativeEvent),

    // -- State mutation --
    /// Path-addressed partial mutations plus an optional fact packet.
    StatePatch(StatePatch),
    /// Result of a dice roll.
    DiceResult(DiceResult),

    // -- Collection replacement --
    /// Full initiative roster.
    InitiativeUpdate(InitiativeUpdate),
    /// Full inventory contents for a character.
    InventoryUpdate(InventoryUpdate),
    /// Full spell list for a character.
    SpellBookUpdate(SpellBookUpdate),
    /// Full world map node set.
    MapData(MapData),
    /// A single map interaction (travel, move).
    MapUpdate(MapUpdate),
    /// Saved-game summaries.
    SaveList(SaveList),
    /// Monster search results.
    MonsterSearchResults(MonsterSearchResults),
    /// Shop stock at a map node.
    ShopInventory(ShopInventory),
    /// New gold total for a character.
    GoldUpdate(GoldUpdate),

    // -- Widgets and notifications --
    /// Request to open a modal-like widget.
    ShowWidget(Widget),
    /// Operational message for the log and a toast.
    Log(LogEntry),
    /// Loot was handed to a character.
    LootDistributed(LootDistributed),
    /// Acknowledgement of a client action.
    Ack(Ack),

    /// Any tag this client does not know.
    #[serde(other)]
    Unknown,
}

impl ServerFrame {
    /// The wire tag of this frame, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionEstablished(_) => "CONNECTION_ESTABLISHED",
            Self::NarrativeChunk(_) => "NARRATIVE_CHUNK",
            Self::NarrativeEvent(_) => "NARRATIVE_EVENT",
            Self::StatePatch(_) => "STATE_PATCH",
            Self::DiceResult(_) => "DICE_RESULT",
            Self::InitiativeUpdate(_) => "INITIATIVE_UPDATE",
            Self::InventoryUpdate(_) => "INVENTORY_UPDATE",
            Self::SpellBookUpdate(_) => "SPELL_BOOK_UPDATE",
            Self::MapData(_) => "MAP_DATA",
            Self::MapUpdate(_) => "MAP_UPDATE",
            Self::SaveList(_) => "SAVE_LIST",
            Self::MonsterSearchResults(_) => "MONSTER_SEARCH_RESULTS",
            Self::ShopInventory(_) => "SHOP_INVENTORY",
            Self::GoldUpdate(_) => "GOLD_UPDATE",
            Self::ShowWidget(_) => "SHOW_WIDGET",
            Self::Log(_) => "LOG",
            Self::LootDistributed(_) => "LOOT_DISTRIBUTED",
            Self::Ack(_) => "ACK",
            Self::Unknown => "UNKNOWN",
        }
    }
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// Payload of `CONNECTION_ESTABLISHED`.
///
/// `session_id` and `role` are what the server confirmed; they can differ
/// from what the client asked for (a refused DM token downgrades the role).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEstablished {
    pub session_id: SessionId,
    #[serde(default)]
    pub character_id: Option<CharacterId>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub message: String,
}

// ---------------------------------------------------------------------------
// Narrative
// ---------------------------------------------------------------------------

/// Payload of `NARRATIVE_CHUNK`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NarrativeChunk {
    #[serde(default)]
    pub content: String,
    /// Position of this fragment in its stream. Diagnostic only.
    #[serde(default)]
    pub index: Option<u32>,
    /// `true` on the terminal fragment of a stream.
    #[serde(default)]
    pub done: bool,
}

/// Payload of `NARRATIVE_EVENT`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeEvent {
    #[serde(default)]
    pub content: String,
    /// `travel`, `discovery`, `encounter`, ...
    #[serde(default = "default_event_type")]
    pub event_type: String,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

fn default_event_type() -> String {
    "travel".to_string()
}

// ---------------------------------------------------------------------------
// State patches
// ---------------------------------------------------------------------------

/// One path-addressed mutation, e.g. `{ "op": "replace", "path":
/// "/targets/goblin_1/hp", "value": 7 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOp {
    #[serde(default, alias = "operation")]
    pub op: String,
    pub path: String,
    #[serde(default)]
    pub value: Value,
}

impl PatchOp {
    /// Builds a `replace` patch.
    pub fn replace(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            op: "replace".to_string(),
            path: path.into(),
            value: value.into(),
        }
    }
}

/// Payload of `STATE_PATCH`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StatePatch {
    #[serde(default)]
    pub patches: Vec<PatchOp>,
    #[serde(default)]
    pub fact_packet: Option<FactPacket>,
}

/// Payload of `DICE_RESULT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DiceResult {
    #[serde(default)]
    pub notation: String,
    #[serde(default)]
    pub rolls: Vec<i64>,
    #[serde(default)]
    pub total: i64,
}

// ---------------------------------------------------------------------------
// Roster, inventory, spells
// ---------------------------------------------------------------------------

/// A member of the initiative roster.
///
/// Fields the server adds beyond the ones named here (`cr`, `resistances`,
/// `position`, ...) are kept in `extra`, which `#[serde(flatten)]` fills
/// with every key not matched by a named field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub initiative: i64,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub current: bool,
    #[serde(default, alias = "isPlayer")]
    pub is_player: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp_max: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ac: Option<i64>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Combatant {
    /// A roster entry with only an id and a name.
    pub fn new(id: impl Into<CombatantId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            initiative: 0,
            active: true,
            current: false,
            is_player: false,
            hp: None,
            hp_max: None,
            ac: None,
            conditions: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// Payload of `INITIATIVE_UPDATE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InitiativeUpdate {
    #[serde(default)]
    pub combatants: Vec<Combatant>,
    #[serde(default)]
    pub round: Option<u32>,
}

/// An item instance in a character's inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub instance_id: String,
    #[serde(default)]
    pub template_id: String,
    #[serde(default)]
    pub name: String,
    /// `backpack`, `main_hand`, ...
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub slot_type: Option<String>,
    #[serde(default)]
    pub charges: i64,
    #[serde(default)]
    pub stats: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of `INVENTORY_UPDATE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InventoryUpdate {
    #[serde(default)]
    pub character_id: Option<CharacterId>,
    #[serde(default)]
    pub items: Vec<InventoryItem>,
}

/// A spell as listed in a spell book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spell {
    pub id: SpellId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub casting_time: String,
    #[serde(default)]
    pub range: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_attack: bool,
    #[serde(default)]
    pub is_save: bool,
    #[serde(default)]
    pub save_stat: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of `SPELL_BOOK_UPDATE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SpellBookUpdate {
    #[serde(default)]
    pub character_id: Option<CharacterId>,
    #[serde(default)]
    pub spells: Vec<Spell>,
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// Position of a node on the map, in percent of the map's extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

/// A location on the world map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapNode {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    /// `city`, `dungeon`, `wilderness`, `landmark`.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Coordinates,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub connections: Vec<NodeId>,
    #[serde(default = "default_risk_level")]
    pub risk_level: u8,
}

fn default_risk_level() -> u8 {
    1
}

/// Payload of `MAP_DATA`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MapData {
    #[serde(default)]
    pub nodes: Vec<MapNode>,
    #[serde(default)]
    pub current_node_id: Option<NodeId>,
}

/// Payload of `MAP_UPDATE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MapUpdate {
    #[serde(default)]
    pub character_id: Option<CharacterId>,
    #[serde(default)]
    pub cell_id: Option<i64>,
    #[serde(default)]
    pub node_id: Option<NodeId>,
    #[serde(default)]
    pub interaction_type: String,
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Saves, shops, monsters, gold
// ---------------------------------------------------------------------------

/// Summary of one saved game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveSummary {
    pub save_id: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub character_name: Option<String>,
    #[serde(default)]
    pub character_class: Option<String>,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub location: Option<String>,
}

fn default_level() -> u32 {
    1
}

/// Payload of `SAVE_LIST`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SaveList {
    #[serde(default)]
    pub saves: Vec<SaveSummary>,
}

/// Payload of `MONSTER_SEARCH_RESULTS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MonsterSearchResults {
    #[serde(default)]
    pub results: Vec<Value>,
}

/// One item offered by a shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rarity: String,
    #[serde(default)]
    pub buy_price: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of `SHOP_INVENTORY`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopInventory {
    pub node_id: NodeId,
    #[serde(default)]
    pub node_type: String,
    #[serde(default)]
    pub has_shop: bool,
    #[serde(default)]
    pub items: Vec<ShopItem>,
}

/// Payload of `GOLD_UPDATE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GoldUpdate {
    #[serde(default)]
    pub character_id: Option<CharacterId>,
    /// New total.
    #[serde(default)]
    pub gold: i64,
    /// Amount added by this transaction.
    #[serde(default)]
    pub delta: i64,
}

// ---------------------------------------------------------------------------
// Widgets and notifications
// ---------------------------------------------------------------------------

/// Payload of `SHOW_WIDGET`: a server-requested modal or overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_id: Option<String>,
    pub widget_type: String,
    #[serde(default)]
    pub data: Value,
}

impl Widget {
    /// The handle used to close this widget: its id, or its type when the
    /// server sent no id.
    pub fn handle(&self) -> &str {
        self.widget_id.as_deref().unwrap_or(&self.widget_type)
    }
}

/// Severity of a `LOG` frame.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Warning,
    Error,
    Success,
}

impl LogLevel {
    /// Upper-case label used when the message is written to the log.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Success => "SUCCESS",
        }
    }
}

/// Payload of `LOG`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    #[serde(default)]
    pub level: LogLevel,
}

/// Payload of `LOOT_DISTRIBUTED`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LootDistributed {
    #[serde(default)]
    pub character_id: Option<CharacterId>,
    #[serde(default)]
    pub items: Vec<InventoryItem>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Payload of `ACK`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// `ok` or `error`.
    #[serde(default = "default_ack_status")]
    pub status: String,
    #[serde(default)]
    pub action_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_ack_status() -> String {
    "ok".to_string()
}

impl Ack {
    /// `true` when the server rejected the action.
    pub fn is_error(&self) -> bool {
        self.status == "error"
    }
}

// =========================================================================
// Tests
// =========================================================================
