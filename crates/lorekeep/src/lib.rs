//! # Lorekeep
//!
//! Client-side mirror of a narrative tabletop game session.
//!
//! A game server streams narrative text, combat patches, rosters,
//! inventories and map data over a WebSocket. Lorekeep keeps a local,
//! immutable [`GameState`] snapshot in step with that stream and hands it
//! to whatever presents it.
//!
//! ```text
//! lorekeep-transport  bytes over WebSocket
//! lorekeep-protocol   ServerFrame / ClientCommand
//! lorekeep-session    connection lifecycle and targets
//! lorekeep-mirror     reducers, narrative buffer, effects
//! lorekeep            GameClient, config, HTTP side requests
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lorekeep::prelude::*;
//!
//! # async fn run() -> Result<(), LorekeepError> {
//! let mut client = GameClient::new(ClientConfig::from_env());
//! client
//!     .connect(ConnectTarget::new("localhost:8000", "session-001"))
//!     .await?;
//!
//! client.send(GameAction::roll(20, 1, 0));
//! let state = client.state();
//! println!("{} log lines", state.narrative.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod world_api;

pub use client::{GameClient, GameClientBuilder};
pub use config::{ClientConfig, parse_role};
pub use error::LorekeepError;
pub use world_api::{DEFAULT_CAPTURE_SEED, DEFAULT_SPAWN_CR, NodeActor, WorldApi};

pub use lorekeep_mirror::{Effect, GameState, MapState, TargetRecord, Toast};
pub use lorekeep_protocol::{ClientCommand, GameAction, Role, ServerFrame, SessionId};
pub use lorekeep_session::{ConnectTarget, ConnectionStatus};

/// Everything a typical client needs.
pub mod prelude {
    pub use crate::{
        ClientConfig, GameClient, GameClientBuilder, LorekeepError, NodeActor, WorldApi,
    };
    pub use lorekeep_mirror::{Effect, GameState, Toast};
    pub use lorekeep_protocol::{
        CharacterId, ClientCommand, CombatantId, GameAction, LogLevel, NodeId, Role, SessionId,
    };
    pub use lorekeep_session::{ConnectTarget, ConnectionStatus};
}
