//! Session lifecycle for Lorekeep.
//!
//! This crate answers two questions about the one live connection a
//! client owns:
//!
//! 1. **Where** does it go? ([`ConnectTarget`] builds the
//!    `ws://<host>/ws/game/<session-id>` URL with optional `role` and
//!    `dm_token` query parameters.)
//! 2. **What state** is it in? ([`Session`] and its [`ConnectionStatus`]
//!    state machine.)
//!
//! # How it fits in the stack
//!
//! ```text
//! Client (above)      ← drives transitions as the socket opens and closes
//!     ↕
//! Session (this crate)
//!     ↕
//! Protocol (below)    ← provides SessionId, Role, ConnectionEstablished
//! ```

mod error;
mod session;
mod target;

pub use error::SessionError;
pub use session::{ConnectionStatus, Session};
pub use target::ConnectTarget;
pub use url::Url;
