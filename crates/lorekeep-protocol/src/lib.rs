//! Wire protocol for Lorekeep.
//!
//! This crate defines the language spoken between the client and the game
//! server:
//!
//! - **Identifiers** ([`SessionId`], [`CombatantId`], [`SpellId`], ...):
//!   string ids that cannot be mixed up with each other.
//! - **Frames** ([`ServerFrame`]): what the server pushes.
//! - **Commands** ([`ClientCommand`], [`GameAction`]): what the client sends.
//! - **Codec** ([`Codec`], [`JsonCodec`]): bytes in, types out.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes) → Protocol (ServerFrame) → Mirror (GameState)
//! ```

mod codec;
mod commands;
mod error;
mod frames;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use commands::{ClientCommand, GameAction, InteractionKind, SystemRequest};
pub use error::ProtocolError;
pub use frames::{
    Ack, Combatant, ConnectionEstablished, Coordinates, DiceResult, FactPacket, GoldUpdate,
    InitiativeUpdate, InventoryItem, InventoryUpdate, LogEntry, LogLevel, LootDistributed,
    MapData, MapNode, MapUpdate, MonsterSearchResults, NarrativeChunk, NarrativeEvent, PatchOp,
    SaveList, SaveSummary, ServerFrame, ShopInventory, ShopItem, Spell, SpellBookUpdate,
    StatePatch, Widget,
};
pub use types::{CharacterId, CombatantId, NodeId, Role, SessionId, SpellId, TargetId};
