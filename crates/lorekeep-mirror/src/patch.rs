//! Path-addressed state patches (`STATE_PATCH`).
//!
//! A patch path is a `/`-delimited string such as `/targets/goblin_1/hp`.
//! Only two roots are understood:
//!
//! - `targets/<id>/<field>`: ad hoc combat participants. Unknown ids are
//!   created on first mention.
//! - `combatants/<id>/<field>`: initiative roster members. Unknown ids are
//!   ignored; the roster only grows through `INITIATIVE_UPDATE`.
//!
//! Every other path is skipped so the server can add new roots without
//! breaking older clients. Applying patches never fails.

use std::cmp::Ordering;

use lorekeep_protocol::{Combatant, PatchOp, TargetId};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{Effect, EffectSink, GameState};

/// A parsed patch path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatchPath<'a> {
    Target { id: &'a str, field: &'a str },
    Combatant { id: &'a str, field: &'a str },
}

impl<'a> PatchPath<'a> {
    /// Splits `path`, ignoring empty segments. Segments past the field are
    /// not addressable and are ignored.
    fn parse(path: &'a str) -> Option<Self> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let root = segments.next()?;
        let id = segments.next()?;
        let field = segments.next()?;
        match root {
            "targets" => Some(Self::Target { id, field }),
            "combatants" => Some(Self::Combatant { id, field }),
            _ => None,
        }
    }
}

/// Applies `patches` to `state` in list order.
///
/// Returns `true` if any target took damage, which the caller turns into
/// the screen-shake cue.
pub(crate) fn apply_patches(
    state: &mut GameState,
    patches: &[PatchOp],
    effects: &mut dyn EffectSink,
) -> bool {
    let mut shook = false;
    for patch in patches {
        match PatchPath::parse(&patch.path) {
            Some(PatchPath::Target { id, field }) => {
                shook |= patch_target(state, id, field, &patch.value, effects);
            }
            Some(PatchPath::Combatant { id, field }) => {
                patch_combatant(state, id, field, &patch.value);
            }
            None => {
                tracing::debug!(path = %patch.path, op = %patch.op, "ignoring patch path");
            }
        }
    }
    shook
}

fn patch_target(
    state: &mut GameState,
    id: &str,
    field: &str,
    value: &Value,
    effects: &mut dyn EffectSink,
) -> bool {
    let target_id = TargetId::from(id);
    let record = state.targets.entry(target_id.clone()).or_default();
    let mut shook = false;

    match field {
        "hp" => match as_int(value) {
            Some(hp) => {
                // Widened so extreme values can neither overflow nor flip
                // the sign; the reported amount saturates at `i64::MAX`.
                let delta = i128::from(hp) - i128::from(record.hp);
                let amount = i64::try_from(delta.unsigned_abs()).unwrap_or(i64::MAX);
                match delta.cmp(&0) {
                    Ordering::Less => {
                        effects.emit(Effect::Damage {
                            target: target_id,
                            amount,
                        });
                        shook = true;
                    }
                    Ordering::Greater => {
                        effects.emit(Effect::Heal {
                            target: target_id,
                            amount,
                        });
                    }
                    Ordering::Equal => {}
                }
                record.hp = hp;
            }
            None => skip_value(id, field, value),
        },
        "status" => match value.as_str() {
            Some(status) => record.status = status.to_string(),
            None => skip_value(id, field, value),
        },
        "ac" => match value {
            Value::Null => record.ac = None,
            other => match as_int(other) {
                Some(ac) => record.ac = Some(ac),
                None => skip_value(id, field, value),
            },
        },
        "conditions" => match serde_json::from_value::<Vec<String>>(value.clone()) {
            Ok(conditions) => record.conditions = conditions,
            Err(_) => skip_value(id, field, value),
        },
        other => {
            record.extra.insert(other.to_string(), value.clone());
        }
    }
    shook
}

fn patch_combatant(state: &mut GameState, id: &str, field: &str, value: &Value) {
    let Some(combatant) = state.combatants.iter_mut().find(|c| c.id.as_str() == id) else {
        tracing::debug!(combatant = id, field, "patch for unknown combatant ignored");
        return;
    };
    // The id is the roster key; renaming it through a patch would let two
    // entries collide.
    if field == "id" {
        skip_value(id, field, value);
        return;
    }
    match with_field::<Combatant>(combatant, field, value) {
        Some(updated) => *combatant = updated,
        None => skip_value(id, field, value),
    }
}

/// Returns a copy of `record` with `field` set to `value`, going through
/// the serde representation so typed fields are checked and unknown ones
/// land in the flattened `extra` map. `None` if the value does not fit.
fn with_field<T>(record: &T, field: &str, value: &Value) -> Option<T>
where
    T: Serialize + DeserializeOwned,
{
    let Value::Object(mut fields) = serde_json::to_value(record).ok()? else {
        return None;
    };
    fields.insert(field.to_string(), value.clone());
    serde_json::from_value(Value::Object(fields)).ok()
}

/// Reads an integer, accepting floats with no fractional part. Floats
/// beyond the `i64` range saturate.
fn as_int(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.is_finite())
            .map(|f| f as i64)
    })
}

fn skip_value(id: &str, field: &str, value: &Value) {
    tracing::debug!(id, field, %value, "patch value has the wrong type, skipped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn replace(path: &str, value: Value) -> PatchOp {
        PatchOp::replace(path, value)
    }

    fn state_with_roster() -> GameState {
        let mut state = GameState::default();
        state.combatants = vec![
            Combatant::new("hero", "Aria"),
            Combatant::new("goblin_1", "Goblin"),
        ];
        state
    }

    #[test]
    fn test_parse_paths() {
        assert_eq!(
            PatchPath::parse("/targets/goblin_1/hp"),
            Some(PatchPath::Target {
                id: "goblin_1",
                field: "hp"
            })
        );
        assert_eq!(
            PatchPath::parse("combatants//hero/current"),
            Some(PatchPath::Combatant {
                id: "hero",
                field: "current"
            })
        );
        assert_eq!(PatchPath::parse("/targets/goblin_1"), None);
        assert_eq!(PatchPath::parse("/weather/today/rain"), None);
        assert_eq!(PatchPath::parse(""), None);
    }

    #[test]
    fn test_unseen_target_is_created_with_defaults() {
        let mut state = GameState::default();
        let mut effects: Vec<Effect> = Vec::new();
        apply_patches(
            &mut state,
            &[replace("/targets/orc/status", json!("bloodied"))],
            &mut effects,
        );

        let orc = state.target("orc").unwrap();
        assert_eq!(orc.status, "bloodied");
        assert_eq!(orc.hp, 0);
        assert_eq!(orc.ac, Some(10));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_hp_delta_sign_selects_effect() {
        let mut state = GameState::default();
        let mut effects: Vec<Effect> = Vec::new();

        let shook = apply_patches(
            &mut state,
            &[replace("/targets/g/hp", json!(7))],
            &mut effects,
        );
        assert!(!shook);

        let shook = apply_patches(
            &mut state,
            &[replace("/targets/g/hp", json!(2))],
            &mut effects,
        );
        assert!(shook);

        let shook = apply_patches(
            &mut state,
            &[replace("/targets/g/hp", json!(2))],
            &mut effects,
        );
        assert!(!shook);

        assert_eq!(
            effects,
            vec![
                Effect::Heal {
                    target: TargetId::from("g"),
                    amount: 7
                },
                Effect::Damage {
                    target: TargetId::from("g"),
                    amount: 5
                },
            ]
        );
    }

    #[test]
    fn test_extreme_hp_values_keep_the_delta_sign() {
        let mut state = GameState::default();

        let mut effects: Vec<Effect> = Vec::new();
        apply_patches(&mut state, &[replace("/targets/g/hp", json!(7))], &mut effects);
        let shook = apply_patches(
            &mut state,
            &[replace("/targets/g/hp", json!(i64::MIN))],
            &mut effects,
        );
        assert!(shook);
        assert_eq!(
            effects.last(),
            Some(&Effect::Damage {
                target: TargetId::from("g"),
                amount: i64::MAX
            })
        );
        assert_eq!(state.target("g").unwrap().hp, i64::MIN);

        // 1e300 saturates to i64::MAX; dropping to -1 from there is damage.
        let mut effects: Vec<Effect> = Vec::new();
        apply_patches(&mut state, &[replace("/targets/h/hp", json!(1e300))], &mut effects);
        assert_eq!(state.target("h").unwrap().hp, i64::MAX);
        let shook = apply_patches(&mut state, &[replace("/targets/h/hp", json!(-1))], &mut effects);
        assert!(shook);
        assert_eq!(
            effects,
            vec![
                Effect::Heal {
                    target: TargetId::from("h"),
                    amount: i64::MAX
                },
                Effect::Damage {
                    target: TargetId::from("h"),
                    amount: i64::MAX
                },
            ]
        );
    }

    #[test]
    fn test_later_patches_for_same_path_win() {
        let mut state = GameState::default();
        let mut effects: Vec<Effect> = Vec::new();
        apply_patches(
            &mut state,
            &[
                replace("/targets/g/hp", json!(10)),
                replace("/targets/g/hp", json!(4)),
            ],
            &mut effects,
        );
        assert_eq!(state.target("g").unwrap().hp, 4);
        assert_eq!(effects.len(), 2);
    }

    #[test]
    fn test_wrong_typed_target_value_still_creates_target() {
        let mut state = GameState::default();
        let mut effects: Vec<Effect> = Vec::new();
        let shook = apply_patches(
            &mut state,
            &[replace("/targets/g/hp", json!("lots"))],
            &mut effects,
        );
        assert!(!shook);
        assert_eq!(state.target("g").unwrap().hp, 0);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_target_ac_null_and_unknown_fields() {
        let mut state = GameState::default();
        apply_patches(
            &mut state,
            &[
                replace("/targets/g/ac", Value::Null),
                replace("/targets/g/conditions", json!(["prone"])),
                replace("/targets/g/position", json!({"x": 1, "y": 2})),
            ],
            &mut Vec::<Effect>::new(),
        );
        let g = state.target("g").unwrap();
        assert_eq!(g.ac, None);
        assert_eq!(g.conditions, vec!["prone"]);
        assert_eq!(g.extra["position"], json!({"x": 1, "y": 2}));
    }

    #[test]
    fn test_combatant_patch_updates_known_member() {
        let mut state = state_with_roster();
        apply_patches(
            &mut state,
            &[
                replace("/combatants/goblin_1/hp", json!(3)),
                replace("/combatants/goblin_1/current", json!(true)),
                replace("/combatants/goblin_1/cr", json!("1/4")),
            ],
            &mut Vec::<Effect>::new(),
        );
        let goblin = state.combatant("goblin_1").unwrap();
        assert_eq!(goblin.hp, Some(3));
        assert!(goblin.current);
        assert_eq!(goblin.extra["cr"], json!("1/4"));
    }

    #[test]
    fn test_combatant_patch_for_unknown_id_is_noop() {
        let mut state = state_with_roster();
        let before = state.clone();
        apply_patches(
            &mut state,
            &[replace("/combatants/ghost/hp", json!(1))],
            &mut Vec::<Effect>::new(),
        );
        assert_eq!(state, before);
        assert_eq!(state.combatants.len(), 2);
    }

    #[test]
    fn test_combatant_patch_with_bad_value_or_id_field_is_skipped() {
        let mut state = state_with_roster();
        let before = state.clone();
        apply_patches(
            &mut state,
            &[
                replace("/combatants/hero/initiative", json!("high")),
                replace("/combatants/hero/id", json!("goblin_1")),
            ],
            &mut Vec::<Effect>::new(),
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_combatant_hp_does_not_emit_effects() {
        let mut state = state_with_roster();
        let mut effects: Vec<Effect> = Vec::new();
        let shook = apply_patches(
            &mut state,
            &[replace("/combatants/hero/hp", json!(1))],
            &mut effects,
        );
        assert!(!shook);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_foreign_paths_are_ignored() {
        let mut state = GameState::default();
        let before = state.clone();
        apply_patches(
            &mut state,
            &[
                replace("/weather/today/rain", json!(true)),
                replace("/targets", json!({})),
                replace("not a path", json!(1)),
            ],
            &mut Vec::<Effect>::new(),
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_float_hp_with_integral_value_is_accepted() {
        let mut state = GameState::default();
        apply_patches(
            &mut state,
            &[replace("/targets/g/hp", json!(12.0))],
            &mut Vec::<Effect>::new(),
        );
        assert_eq!(state.target("g").unwrap().hp, 12);
    }
}
