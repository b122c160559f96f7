//! The dispatch table: one reducer per inbound frame type.
//!
//! Each reducer reads the current [`GameState`] and a frame and returns
//! the next state, or `None` when the frame changes nothing. `None` is the
//! identity reducer: the caller keeps its existing state reference, which
//! is how observers learn that nothing happened.
//!
//! Reducers never fail. A frame that cannot be applied is logged and
//! treated as identity.

use lorekeep_protocol::{
    Ack, ConnectionEstablished, GoldUpdate, InitiativeUpdate, LogEntry, LogLevel, LootDistributed,
    MapData, MapUpdate, NarrativeChunk, NarrativeEvent, NodeId, ServerFrame, StatePatch,
};

use crate::patch::apply_patches;
use crate::{EffectSink, GameState, MapInteraction, NarrativeBuffer};

/// Default toast text for `LOOT_DISTRIBUTED` without a message.
const LOOT_RECEIVED: &str = "Loot received!";

/// Default toast text for an error `ACK` without a message.
const ACTION_FAILED: &str = "Action failed";

/// Selects and runs the reducer for `frame`.
///
/// `buffer` is the narrative accumulator that outlives individual frames;
/// `effects` receives the visual cues derived from state deltas.
pub fn dispatch(
    state: &GameState,
    frame: ServerFrame,
    buffer: &mut NarrativeBuffer,
    effects: &mut dyn EffectSink,
) -> Option<GameState> {
    tracing::trace!(kind = frame.kind(), "dispatching frame");

    match frame {
        ServerFrame::ConnectionEstablished(ack) => connection_established(state, &ack),
        ServerFrame::NarrativeChunk(chunk) => Some(narrative_chunk(state, &chunk, buffer)),
        ServerFrame::NarrativeEvent(event) => narrative_event(state, event),
        ServerFrame::StatePatch(patch) => Some(state_patch(state, patch, effects)),
        ServerFrame::DiceResult(result) => Some(GameState {
            last_dice_result: Some(result),
            ..state.clone()
        }),
        ServerFrame::InitiativeUpdate(update) => Some(initiative_update(state, update)),
        ServerFrame::InventoryUpdate(update) => Some(GameState {
            inventory: update.items,
            ..state.clone()
        }),
        ServerFrame::SpellBookUpdate(update) => Some(GameState {
            spells: update.spells,
            ..state.clone()
        }),
        ServerFrame::MapData(data) => Some(map_data(state, data)),
        ServerFrame::MapUpdate(update) => Some(map_update(state, update)),
        ServerFrame::SaveList(list) => Some(GameState {
            saves: list.saves,
            ..state.clone()
        }),
        ServerFrame::MonsterSearchResults(found) => Some(GameState {
            monster_search_results: found.results,
            ..state.clone()
        }),
        ServerFrame::ShopInventory(shop) => Some(GameState {
            shop_inventory: Some(shop),
            ..state.clone()
        }),
        ServerFrame::GoldUpdate(update) => Some(gold_update(state, &update)),
        ServerFrame::ShowWidget(widget) => {
            let mut next = state.clone();
            next.active_widgets.push(widget);
            Some(next)
        }
        ServerFrame::Log(entry) => Some(log(state, entry)),
        ServerFrame::LootDistributed(loot) => Some(loot_distributed(state, loot)),
        ServerFrame::Ack(ack) => ack_frame(state, ack),
        ServerFrame::Unknown => {
            tracing::debug!("unknown frame type, state unchanged");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

fn connection_established(state: &GameState, ack: &ConnectionEstablished) -> Option<GameState> {
    let mut next = state.clone();
    match next.session.establish(ack) {
        Ok(()) => Some(next),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring CONNECTION_ESTABLISHED");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Narrative
// ---------------------------------------------------------------------------

fn narrative_chunk(
    state: &GameState,
    chunk: &NarrativeChunk,
    buffer: &mut NarrativeBuffer,
) -> GameState {
    buffer.append(chunk.index, &chunk.content);
    let mut next = state.clone();

    if chunk.done {
        // One entry per terminal chunk, even when the buffer is empty.
        next.narrative.push(buffer.flush());
        next.current_narrative.clear();
        next.is_streaming = false;
    } else {
        next.current_narrative = buffer.as_str().to_string();
        next.is_streaming = true;
    }
    next
}

/// A complete, non-streamed event. Travel events only move the party, so
/// they stay out of the log; every other kind is logged. Arriving at a node
/// for the first time raises a discovery toast.
fn narrative_event(state: &GameState, event: NarrativeEvent) -> Option<GameState> {
    let metadata = event.metadata.unwrap_or_default();
    let discovered = metadata
        .get("node_id")
        .and_then(|v| v.as_str())
        .map(NodeId::from)
        .filter(|id| !state.visited_node_ids.contains(id));
    let logged = event.event_type != "travel";

    if discovered.is_none() && !logged {
        return None;
    }

    let mut next = state.clone();
    if let Some(node_id) = discovered {
        let name = metadata
            .get("node_name")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown Location");
        next.push_toast(LogLevel::Info, format!("New Discovery: {name}"));
        next.visited_node_ids.push(node_id);
    }
    if logged {
        next.narrative.push(event.content);
    }
    Some(next)
}

fn log(state: &GameState, entry: LogEntry) -> GameState {
    let mut next = state.clone();
    next.narrative
        .push(format!("[{}] {}", entry.level.label(), entry.message));
    next.push_toast(entry.level, entry.message);
    next
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

fn state_patch(state: &GameState, patch: StatePatch, effects: &mut dyn EffectSink) -> GameState {
    let mut next = state.clone();
    let shook = apply_patches(&mut next, &patch.patches, effects);
    next.screen_shake = shook || state.screen_shake;
    if let Some(facts) = patch.fact_packet {
        next.last_fact_packet = Some(facts);
    }
    next
}

fn initiative_update(state: &GameState, update: InitiativeUpdate) -> GameState {
    let mut next = state.clone();
    next.combatants = update.combatants;
    // A missing or zero round keeps the current one.
    if let Some(round) = update.round.filter(|r| *r != 0) {
        next.current_round = round;
    }
    next
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

fn map_data(state: &GameState, data: MapData) -> GameState {
    let mut next = state.clone();
    next.map.nodes = data.nodes;
    next.map.current_node_id = data.current_node_id;
    next
}

fn map_update(state: &GameState, update: MapUpdate) -> GameState {
    let mut next = state.clone();
    if let Some(node_id) = update.node_id {
        next.map.current_node_id = Some(node_id);
    }
    next.map.last_interaction = Some(MapInteraction {
        cell_id: update.cell_id,
        interaction_type: update.interaction_type,
        character_id: update.character_id,
    });
    next
}

fn gold_update(state: &GameState, update: &GoldUpdate) -> GameState {
    let mut next = state.clone();
    next.gold = update.gold;
    next.push_toast(
        LogLevel::Info,
        format!("+{} gp (total: {} gp)", update.delta, update.gold),
    );
    next
}

fn loot_distributed(state: &GameState, loot: LootDistributed) -> GameState {
    let mut next = state.clone();
    let message = loot
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| LOOT_RECEIVED.to_string());
    next.push_toast(LogLevel::Info, message);
    next
}

fn ack_frame(state: &GameState, ack: Ack) -> Option<GameState> {
    if !ack.is_error() {
        return None;
    }
    tracing::debug!(action_id = ?ack.action_id, "server rejected action");
    let mut next = state.clone();
    let message = ack.message.unwrap_or_else(|| ACTION_FAILED.to_string());
    next.push_toast(LogLevel::Error, message);
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Effect;
    use lorekeep_protocol::{
        Combatant, DiceResult, InventoryItem, InventoryUpdate, MapNode, PatchOp, Role, SessionId,
        Widget,
    };
    use serde_json::{json, Value};

    fn run(state: &GameState, frame: ServerFrame) -> Option<GameState> {
        dispatch(state, frame, &mut NarrativeBuffer::new(), &mut Vec::<Effect>::new())
    }

    fn parse(value: Value) -> ServerFrame {
        serde_json::from_value(value).unwrap()
    }

    fn chunk(content: &str, done: bool) -> ServerFrame {
        ServerFrame::NarrativeChunk(NarrativeChunk {
            content: content.to_string(),
            index: None,
            done,
        })
    }

    fn item(id: &str) -> InventoryItem {
        serde_json::from_value(json!({ "instance_id": id, "name": id })).unwrap()
    }

    #[test]
    fn test_unknown_frame_is_identity() {
        let state = GameState::default();
        let frame = parse(json!({ "type": "WEATHER_REPORT", "rain": true }));
        assert!(run(&state, frame).is_none());
    }

    #[test]
    fn test_chunks_concatenate_into_one_entry() {
        let mut buffer = NarrativeBuffer::new();
        let mut effects: Vec<Effect> = Vec::new();
        let state = GameState::default();

        let state = dispatch(&state, chunk("The goblin", false), &mut buffer, &mut effects).unwrap();
        assert!(state.is_streaming);
        assert_eq!(state.current_narrative, "The goblin");
        assert!(state.narrative.is_empty());

        let state = dispatch(&state, chunk(" snarls.", true), &mut buffer, &mut effects).unwrap();
        assert_eq!(state.narrative, vec!["The goblin snarls."]);
        assert_eq!(state.current_narrative, "");
        assert!(!state.is_streaming);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_lone_terminal_chunk_still_produces_entry() {
        let state = run(&GameState::default(), chunk("", true)).unwrap();
        assert_eq!(state.narrative, vec![String::new()]);
    }

    #[test]
    fn test_state_patch_sets_shake_and_fact_packet() {
        let mut effects: Vec<Effect> = Vec::new();
        let mut buffer = NarrativeBuffer::new();
        let patch = |hp: i64, facts: Option<Value>| {
            ServerFrame::StatePatch(StatePatch {
                patches: vec![PatchOp::replace("/targets/goblin_1/hp", hp)],
                fact_packet: facts.and_then(|f| f.as_object().cloned()),
            })
        };

        let state = GameState::default();
        let state = dispatch(&state, patch(7, None), &mut buffer, &mut effects).unwrap();
        assert!(!state.screen_shake);
        assert_eq!(state.target("goblin_1").unwrap().hp, 7);

        let state = dispatch(
            &state,
            patch(2, Some(json!({ "hit": true, "damage": 5 }))),
            &mut buffer,
            &mut effects,
        )
        .unwrap();
        assert!(state.screen_shake);
        assert_eq!(state.last_fact_packet.as_ref().unwrap()["damage"], json!(5));
        assert!(matches!(effects[1], Effect::Damage { amount: 5, .. }));

        // A heal does not clear an earlier shake, and a patch without a
        // fact packet keeps the previous one.
        let state = dispatch(&state, patch(4, None), &mut buffer, &mut effects).unwrap();
        assert!(state.screen_shake);
        assert!(state.last_fact_packet.is_some());
    }

    #[test]
    fn test_initiative_update_replaces_roster_and_round() {
        let mut state = GameState::default();
        state.combatants = vec![Combatant::new("old", "Old")];
        state.current_round = 3;

        let next = run(
            &state,
            ServerFrame::InitiativeUpdate(InitiativeUpdate {
                combatants: vec![Combatant::new("a", "A"), Combatant::new("b", "B")],
                round: Some(0),
            }),
        )
        .unwrap();
        assert_eq!(next.combatants.len(), 2);
        assert!(next.combatant("old").is_none());
        assert_eq!(next.current_round, 3);

        let next = run(
            &next,
            ServerFrame::InitiativeUpdate(InitiativeUpdate {
                combatants: vec![],
                round: Some(4),
            }),
        )
        .unwrap();
        assert_eq!(next.current_round, 4);
        assert!(next.combatants.is_empty());
    }

    #[test]
    fn test_inventory_update_replaces_without_merge() {
        let mut state = GameState::default();
        state.inventory = vec![item("sword"), item("shield")];

        let next = run(
            &state,
            ServerFrame::InventoryUpdate(InventoryUpdate {
                character_id: None,
                items: vec![item("potion")],
            }),
        )
        .unwrap();
        assert_eq!(next.inventory, vec![item("potion")]);
    }

    #[test]
    fn test_dice_result_is_recorded() {
        let result = DiceResult {
            notation: "1d20+5".into(),
            rolls: vec![14],
            total: 19,
        };
        let next = run(&GameState::default(), ServerFrame::DiceResult(result.clone())).unwrap();
        assert_eq!(next.last_dice_result, Some(result));
    }

    #[test]
    fn test_map_data_and_update() {
        let node: MapNode = serde_json::from_value(json!({
            "id": "town", "name": "Town", "type": "town",
            "coordinates": { "x": 1.0, "y": 2.0 }
        }))
        .unwrap();
        let state = run(
            &GameState::default(),
            ServerFrame::MapData(MapData {
                nodes: vec![node],
                current_node_id: Some(NodeId::from("town")),
            }),
        )
        .unwrap();
        assert!(state.map.node(&NodeId::from("town")).is_some());

        // An update without a node keeps the current one.
        let state = run(
            &state,
            parse(json!({
                "type": "MAP_UPDATE", "cell_id": 12,
                "interaction_type": "move", "character_id": "player_1"
            })),
        )
        .unwrap();
        assert_eq!(state.map.current_node_id, Some(NodeId::from("town")));
        let interaction = state.map.last_interaction.as_ref().unwrap();
        assert_eq!(interaction.cell_id, Some(12));
        assert_eq!(interaction.interaction_type, "move");
    }

    #[test]
    fn test_show_widget_appends() {
        let widget = Widget {
            widget_id: None,
            widget_type: "loot".into(),
            data: json!({ "gold": 5 }),
        };
        let state = run(&GameState::default(), ServerFrame::ShowWidget(widget.clone())).unwrap();
        let state = run(&state, ServerFrame::ShowWidget(widget)).unwrap();
        assert_eq!(state.active_widgets.len(), 2);
    }

    #[test]
    fn test_log_writes_narrative_and_toast() {
        let state = run(
            &GameState::default(),
            parse(json!({ "type": "LOG", "message": "Saved.", "level": "success" })),
        )
        .unwrap();
        assert_eq!(state.narrative, vec!["[SUCCESS] Saved."]);
        assert_eq!(state.toasts.len(), 1);
        assert_eq!(state.toasts[0].message, "Saved.");
        assert_eq!(state.toasts[0].level, LogLevel::Success);
    }

    #[test]
    fn test_narrative_event_discovery() {
        let event = |event_type: &str| {
            parse(json!({
                "type": "NARRATIVE_EVENT",
                "content": "You arrive at the ruins.",
                "event_type": event_type,
                "metadata": { "node_id": "ruins", "node_name": "Old Ruins" }
            }))
        };

        let state = run(&GameState::default(), event("travel")).unwrap();
        assert!(state.narrative.is_empty());
        assert_eq!(state.toasts[0].message, "New Discovery: Old Ruins");
        assert_eq!(state.visited_node_ids, vec![NodeId::from("ruins")]);

        // Second travel event to the same node changes nothing.
        assert!(run(&state, event("travel")).is_none());

        // A non-travel event is logged but raises no second discovery.
        let state = run(&state, event("encounter")).unwrap();
        assert_eq!(state.narrative, vec!["You arrive at the ruins."]);
        assert_eq!(state.toasts.len(), 1);
    }

    #[test]
    fn test_narrative_event_without_name() {
        let state = run(
            &GameState::default(),
            parse(json!({
                "type": "NARRATIVE_EVENT", "content": "",
                "metadata": { "node_id": "x" }
            })),
        )
        .unwrap();
        assert_eq!(state.toasts[0].message, "New Discovery: Unknown Location");
    }

    #[test]
    fn test_gold_and_loot_toasts() {
        let state = run(
            &GameState::default(),
            parse(json!({ "type": "GOLD_UPDATE", "gold": 120, "delta": 20 })),
        )
        .unwrap();
        assert_eq!(state.gold, 120);
        assert_eq!(state.toasts[0].message, "+20 gp (total: 120 gp)");

        let state = run(&state, parse(json!({ "type": "LOOT_DISTRIBUTED" }))).unwrap();
        assert_eq!(state.toasts[1].message, "Loot received!");
    }

    #[test]
    fn test_ack_only_changes_state_on_error() {
        let state = GameState::default();
        assert!(run(&state, parse(json!({ "type": "ACK", "status": "ok" }))).is_none());

        let next = run(
            &state,
            parse(json!({ "type": "ACK", "status": "error", "message": "Not your turn" })),
        )
        .unwrap();
        assert_eq!(next.toasts[0].level, LogLevel::Error);
        assert_eq!(next.toasts[0].message, "Not your turn");
        assert!(next.narrative.is_empty());
    }

    #[test]
    fn test_shop_and_monster_results_replace() {
        let state = run(
            &GameState::default(),
            parse(json!({
                "type": "SHOP_INVENTORY", "node_id": "town", "node_type": "town",
                "has_shop": true,
                "items": [{ "name": "Rope", "rarity": "common", "buy_price": 1 }]
            })),
        )
        .unwrap();
        assert_eq!(state.shop_inventory.as_ref().unwrap().items.len(), 1);

        let state = run(
            &state,
            parse(json!({ "type": "MONSTER_SEARCH_RESULTS", "results": [{ "name": "Wolf" }] })),
        )
        .unwrap();
        assert_eq!(state.monster_search_results, vec![json!({ "name": "Wolf" })]);
    }

    #[test]
    fn test_connection_established_requires_connecting() {
        let ack = ConnectionEstablished {
            session_id: SessionId::from("s"),
            character_id: None,
            role: Role::Dm,
            message: String::new(),
        };
        assert!(run(&GameState::default(), ServerFrame::ConnectionEstablished(ack.clone())).is_none());

        let mut state = GameState::default();
        state.session.begin_connect(SessionId::from("s")).unwrap();
        let next = run(&state, ServerFrame::ConnectionEstablished(ack)).unwrap();
        assert!(next.session.is_connected());
        assert_eq!(next.session.role, Some(Role::Dm));
    }
}
