//! The state store: the single writer of [`GameState`].

use std::sync::Arc;

use lorekeep_protocol::{ServerFrame, SessionId};
use lorekeep_session::{ConnectionStatus, SessionError};

use crate::reducers::dispatch;
use crate::{EffectSink, GameState, NarrativeBuffer};

/// Owns the current [`GameState`] and the narrative buffer that feeds it.
///
/// Every mutation goes through `&mut self`, so there is exactly one writer.
/// State is held behind an `Arc` and swapped for a new one on every change;
/// when a frame or action changes nothing the `Arc` is kept, which lets
/// observers use [`Arc::ptr_eq`] as the change signal.
///
/// ```rust
/// use std::sync::Arc;
/// use lorekeep_mirror::{Effect, Mirror};
/// use lorekeep_protocol::ServerFrame;
///
/// let mut mirror = Mirror::new();
/// let before = Arc::clone(mirror.state());
/// let mut effects: Vec<Effect> = Vec::new();
///
/// let changed = mirror.apply(ServerFrame::Unknown, &mut effects);
/// assert!(!changed);
/// assert!(Arc::ptr_eq(&before, mirror.state()));
/// ```
#[derive(Debug, Default)]
pub struct Mirror {
    state: Arc<GameState>,
    buffer: NarrativeBuffer,
}

impl Mirror {
    /// A mirror holding an all-empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resumes from a previously published state with an empty narrative
    /// buffer.
    pub fn from_state(state: Arc<GameState>) -> Self {
        Self {
            state,
            buffer: NarrativeBuffer::new(),
        }
    }

    /// The current state.
    pub fn state(&self) -> &Arc<GameState> {
        &self.state
    }

    /// Reduces one inbound frame. Returns `true` if the state changed.
    pub fn apply(&mut self, frame: ServerFrame, effects: &mut dyn EffectSink) -> bool {
        let next = dispatch(&self.state, frame, &mut self.buffer, effects);
        self.replace(next)
    }

    // -- Connection lifecycle --

    /// Moves the session to `Connecting`.
    ///
    /// # Errors
    /// [`SessionError::InvalidTransition`] unless currently disconnected.
    pub fn begin_connect(&mut self, requested: SessionId) -> Result<(), SessionError> {
        let mut next = GameState::clone(&self.state);
        next.session.begin_connect(requested)?;
        self.state = Arc::new(next);
        Ok(())
    }

    /// Moves the session to `Disconnected` and discards any half-built
    /// narrative entry. Returns `true` if the state changed.
    pub fn disconnect(&mut self) -> bool {
        self.buffer.discard();
        self.update(|state| {
            if state.session.status == ConnectionStatus::Disconnected && !state.is_streaming {
                return None;
            }
            let mut next = state.clone();
            next.session.close();
            next.current_narrative.clear();
            next.is_streaming = false;
            Some(next)
        })
    }

    // -- Application-layer actions --

    /// Removes the open widget with the given handle (its id, or its type
    /// when it has no id). Returns `true` if one was removed.
    pub fn close_widget(&mut self, handle: &str) -> bool {
        self.update(|state| {
            let index = state.active_widgets.iter().position(|w| w.handle() == handle)?;
            let mut next = state.clone();
            next.active_widgets.remove(index);
            Some(next)
        })
    }

    /// Removes a toast. The narrative log is left untouched.
    pub fn dismiss_toast(&mut self, id: u64) -> bool {
        self.update(|state| {
            let index = state.toasts.iter().position(|t| t.id == id)?;
            let mut next = state.clone();
            next.toasts.remove(index);
            Some(next)
        })
    }

    /// Clears the screen-shake cue once the presentation has played it.
    pub fn clear_screen_shake(&mut self) -> bool {
        self.update(|state| {
            state.screen_shake.then(|| GameState {
                screen_shake: false,
                ..state.clone()
            })
        })
    }

    fn update(&mut self, f: impl FnOnce(&GameState) -> Option<GameState>) -> bool {
        let next = f(&self.state);
        self.replace(next)
    }

    fn replace(&mut self, next: Option<GameState>) -> bool {
        match next {
            Some(state) => {
                self.state = Arc::new(state);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Effect;
    use lorekeep_protocol::{LogLevel, NarrativeChunk, Widget};
    use serde_json::json;

    fn chunk(content: &str, done: bool) -> ServerFrame {
        ServerFrame::NarrativeChunk(NarrativeChunk {
            content: content.into(),
            index: None,
            done,
        })
    }

    fn widget(id: Option<&str>, widget_type: &str) -> ServerFrame {
        ServerFrame::ShowWidget(Widget {
            widget_id: id.map(str::to_string),
            widget_type: widget_type.into(),
            data: json!({}),
        })
    }

    #[test]
    fn test_change_replaces_arc() {
        let mut mirror = Mirror::new();
        let before = Arc::clone(mirror.state());
        assert!(mirror.apply(chunk("a", false), &mut Vec::<Effect>::new()));
        assert!(!Arc::ptr_eq(&before, mirror.state()));
        // The old snapshot is untouched.
        assert!(!before.is_streaming);
    }

    #[test]
    fn test_disconnect_discards_partial_narrative() {
        let mut mirror = Mirror::new();
        mirror.begin_connect(SessionId::from("s")).unwrap();
        mirror.apply(chunk("half", false), &mut Vec::<Effect>::new());

        assert!(mirror.disconnect());
        let state = mirror.state();
        assert_eq!(state.session.status, ConnectionStatus::Disconnected);
        assert!(!state.is_streaming);
        assert!(state.current_narrative.is_empty());

        // The next stream starts from an empty buffer.
        mirror.apply(chunk("fresh", true), &mut Vec::<Effect>::new());
        assert_eq!(mirror.state().narrative, vec!["fresh"]);
    }

    #[test]
    fn test_disconnect_when_idle_keeps_state() {
        let mut mirror = Mirror::new();
        let before = Arc::clone(mirror.state());
        assert!(!mirror.disconnect());
        assert!(Arc::ptr_eq(&before, mirror.state()));
    }

    #[test]
    fn test_begin_connect_twice_fails() {
        let mut mirror = Mirror::new();
        mirror.begin_connect(SessionId::from("s")).unwrap();
        assert!(mirror.begin_connect(SessionId::from("s")).is_err());
        assert_eq!(mirror.state().session.status, ConnectionStatus::Connecting);
    }

    #[test]
    fn test_close_widget_by_id_or_type() {
        let mut mirror = Mirror::new();
        let sink: &mut Vec<Effect> = &mut Vec::new();
        mirror.apply(widget(Some("w-1"), "loot"), sink);
        mirror.apply(widget(None, "shop"), sink);

        assert!(mirror.close_widget("shop"));
        assert!(mirror.close_widget("w-1"));
        assert!(mirror.state().active_widgets.is_empty());
        assert!(!mirror.close_widget("w-1"));
    }

    #[test]
    fn test_dismiss_toast_keeps_log_line() {
        let mut mirror = Mirror::new();
        mirror.apply(
            ServerFrame::Log(lorekeep_protocol::LogEntry {
                message: "Careful!".into(),
                level: LogLevel::Warning,
            }),
            &mut Vec::<Effect>::new(),
        );
        let id = mirror.state().toasts[0].id;

        assert!(mirror.dismiss_toast(id));
        assert!(mirror.state().toasts.is_empty());
        assert_eq!(mirror.state().narrative, vec!["[WARNING] Careful!"]);
        assert!(!mirror.dismiss_toast(id));
    }

    #[test]
    fn test_clear_screen_shake() {
        let mut mirror = Mirror::new();
        assert!(!mirror.clear_screen_shake());

        let patch = serde_json::from_value(json!({
            "type": "STATE_PATCH",
            "patches": [
                { "op": "replace", "path": "/targets/g/hp", "value": 5 },
                { "op": "replace", "path": "/targets/g/hp", "value": 1 }
            ]
        }))
        .unwrap();
        mirror.apply(patch, &mut Vec::<Effect>::new());
        assert!(mirror.state().screen_shake);

        assert!(mirror.clear_screen_shake());
        assert!(!mirror.state().screen_shake);
    }
}
