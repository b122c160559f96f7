//! Game-state mirror for Lorekeep.
//!
//! Turns the stream of decoded [`ServerFrame`](lorekeep_protocol::ServerFrame)s
//! into a sequence of immutable [`GameState`] snapshots.
//!
//! # Key types
//!
//! - [`GameState`]: the mirrored state, replaced wholesale on every change
//! - [`Mirror`]: the single writer that owns the current state
//! - [`dispatch`]: the reducer table, one reducer per frame type
//! - [`NarrativeBuffer`]: assembles streamed narrative fragments
//! - [`Effect`] / [`EffectSink`]: visual cues derived from hp deltas
//!
//! ```text
//! ServerFrame ─→ dispatch ─→ Option<GameState> ─→ Mirror (Arc swap)
//!                   │
//!                   ├─→ NarrativeBuffer
//!                   └─→ EffectSink
//! ```

mod effects;
mod mirror;
mod narrative;
mod patch;
mod reducers;
mod state;

pub use effects::{Effect, EffectSink};
pub use mirror::Mirror;
pub use narrative::NarrativeBuffer;
pub use reducers::dispatch;
pub use state::{GameState, MapInteraction, MapState, TargetRecord, Toast, DEFAULT_TARGET_AC};
