//! Ephemeral UI cues derived from state deltas.
//!
//! Reducers never reach out to the presentation layer directly. They emit
//! [`Effect`]s into an [`EffectSink`] the caller passes in, so a test can
//! collect them in a `Vec` and the client can forward them over a channel.

use lorekeep_protocol::TargetId;
use tokio::sync::broadcast;

/// A transient, non-authoritative notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// A target lost hit points. `amount` is positive.
    Damage { target: TargetId, amount: i64 },
    /// A target gained hit points. `amount` is positive.
    Heal { target: TargetId, amount: i64 },
}

impl Effect {
    /// Short name of the effect kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Damage { .. } => "damage",
            Self::Heal { .. } => "heal",
        }
    }

    /// The signed hp change, as a floating combat number would show it.
    pub fn signed_amount(&self) -> i64 {
        match self {
            Self::Damage { amount, .. } => -amount,
            Self::Heal { amount, .. } => *amount,
        }
    }
}

/// Receives effects emitted while a frame is reduced.
pub trait EffectSink {
    fn emit(&mut self, effect: Effect);
}

impl EffectSink for Vec<Effect> {
    fn emit(&mut self, effect: Effect) {
        self.push(effect);
    }
}

/// Fans effects out to every subscribed listener. With no subscribers the
/// effect is dropped.
impl EffectSink for broadcast::Sender<Effect> {
    fn emit(&mut self, effect: Effect) {
        let _ = self.send(effect);
    }
}
