//! Recalculation hooks run after a command has mutated the tree.
//!
//! The table is ordered; every hook whose matcher and action set fit the
//! command runs, in table order. Hooks repair derived state and never fail.

use serde_json::Value;
use tianji_domain::{paths, slot_key, CommandAction, RealmTier, SaveState, EQUIPMENT_SLOT_COUNT};

use super::matcher::{any_match, PathMatcher};
use super::validator::ValidatedCommand;
use crate::use_cases::derived;

const LONGITUDE: &str = "player.location.longitude";
const LATITUDE: &str = "player.location.latitude";

/// What a hook sees: the command and the value its path held beforehand.
pub struct HookContext<'a> {
    pub command: &'a ValidatedCommand,
    pub old_value: Option<&'a Value>,
}

type HookFn = fn(&mut SaveState, &HookContext<'_>);

pub struct Hook {
    pub name: &'static str,
    pub matchers: &'static [PathMatcher],
    pub actions: &'static [CommandAction],
    run: HookFn,
}

impl Hook {
    fn applies(&self, command: &ValidatedCommand) -> bool {
        self.actions.contains(&command.action) && any_match(self.matchers, &command.path)
    }
}

pub struct HookTable {
    hooks: Vec<Hook>,
}

impl HookTable {
    pub fn standard() -> Self {
        use CommandAction::{Add, Delete, Push, Set};

        Self {
            hooks: vec![
                Hook {
                    name: "equipment-bonus",
                    matchers: &[PathMatcher::ChildOf(paths::EQUIPMENT)],
                    actions: &[Set, Delete],
                    run: equipment_bonus,
                },
                Hook {
                    name: "dao-unlock",
                    matchers: &[PathMatcher::Under(paths::DAO_PATHS)],
                    actions: &[Set],
                    run: dao_unlock,
                },
                Hook {
                    name: "mastered-skills",
                    matchers: &[
                        PathMatcher::UnderEndingIn(paths::INVENTORY_ITEMS, "progress"),
                        PathMatcher::ChildOf(paths::INVENTORY_ITEMS),
                        PathMatcher::Exact(paths::INVENTORY_ITEMS),
                        PathMatcher::Prefix(paths::CULTIVATION_TECHNIQUE),
                    ],
                    actions: &[Set, Add, Push, Delete],
                    run: mastered_skills,
                },
                Hook {
                    name: "coordinate-sync",
                    matchers: &[
                        PathMatcher::Exact(LONGITUDE),
                        PathMatcher::Exact(LATITUDE),
                        PathMatcher::Exact(paths::PLAYER_LOCATION),
                    ],
                    actions: &[Set],
                    run: coordinate_sync,
                },
                Hook {
                    name: "status-sweep",
                    matchers: &[PathMatcher::Prefix(paths::GAME_TIME)],
                    actions: &[Set, Add],
                    run: status_sweep,
                },
                Hook {
                    name: "lifespan-sync",
                    matchers: &[
                        PathMatcher::Prefix(paths::GAME_TIME),
                        PathMatcher::Exact(paths::PLAYER_BIRTH_DATE),
                    ],
                    actions: &[Set, Add],
                    run: lifespan_sync,
                },
                Hook {
                    name: "tribulation-consume",
                    matchers: &[
                        PathMatcher::Exact(paths::PLAYER),
                        PathMatcher::Exact(paths::PLAYER_REALM),
                        PathMatcher::Exact(paths::PLAYER_REALM_NAME),
                    ],
                    actions: &[Set],
                    run: tribulation_consume,
                },
            ],
        }
    }

    pub fn empty() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Run every applicable hook. Returns the names of the hooks that ran.
    pub fn run(&self, state: &mut SaveState, ctx: &HookContext<'_>) -> Vec<&'static str> {
        let mut ran = Vec::new();
        for hook in self.hooks.iter().filter(|h| h.applies(ctx.command)) {
            (hook.run)(state, ctx);
            ran.push(hook.name);
        }
        if !ran.is_empty() {
            tracing::debug!(path = %ctx.command.path, hooks = ?ran, "Recalculation hooks ran");
        }
        ran
    }
}

impl Default for HookTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn item_id(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|id| !id.is_empty())
}

fn equipment_bonus(state: &mut SaveState, ctx: &HookContext<'_>) {
    let previous = item_id(ctx.old_value).map(str::to_string);
    let current = item_id(state.get(&ctx.command.path)).map(str::to_string);
    if previous == current {
        return;
    }

    if let Some(id) = previous.as_deref() {
        derived::remove_equipment_bonus(state, id);
        derived::set_equipped_flag(state, id, false);
    }
    if let Some(id) = current.as_deref() {
        // An item occupies one slot: writing it elsewhere moves it, bonus and all.
        if vacate_other_slot(state, ctx, id) {
            tracing::debug!(item = id, path = %ctx.command.path, "Equipment moved between slots");
        } else {
            derived::apply_equipment_bonus(state, id);
        }
        derived::set_equipped_flag(state, id, true);
    }
}

/// Clear any slot other than the written one that still holds `id`.
fn vacate_other_slot(state: &mut SaveState, ctx: &HookContext<'_>, id: &str) -> bool {
    let Some(other) = (1..=EQUIPMENT_SLOT_COUNT)
        .filter(|n| !ctx.command.path.ends_with_key(&slot_key(*n)))
        .find(|n| state.equipment_slot(*n).as_deref() == Some(id))
    else {
        return false;
    };
    match state
        .get_at_mut(paths::EQUIPMENT)
        .and_then(|slots| slots.get_mut(slot_key(other)))
    {
        Some(slot) => {
            *slot = Value::Null;
            true
        }
        None => false,
    }
}

fn dao_unlock(state: &mut SaveState, ctx: &HookContext<'_>) {
    let Some(name) = ctx.command.path.key_at(2) else {
        return;
    };
    let Some(Value::Object(dao)) = state.get_at_mut(paths::DAO_PATHS).and_then(|d| d.get_mut(name.as_ref())) else {
        return;
    };
    dao.insert("unlocked".to_string(), Value::Bool(true));
}

fn mastered_skills(state: &mut SaveState, _ctx: &HookContext<'_>) {
    derived::recompute_mastered_skills(state);
}

fn coordinate_sync(state: &mut SaveState, _ctx: &HookContext<'_>) {
    derived::sync_coordinates(state);
}

fn status_sweep(state: &mut SaveState, _ctx: &HookContext<'_>) {
    derived::sweep_status_effects(state);
}

fn lifespan_sync(state: &mut SaveState, _ctx: &HookContext<'_>) {
    derived::sync_lifespans(state);
}

fn tribulation_consume(state: &mut SaveState, ctx: &HookContext<'_>) {
    let Some(target) = ctx.command.realm_name().and_then(RealmTier::from_name) else {
        return;
    };
    let old_realm = if ctx.command.path.is(paths::PLAYER) {
        ctx.old_value.and_then(|player| player.get("realm"))
    } else {
        ctx.old_value
    };
    let previous = old_realm
        .and_then(|old| old.get("name").or(Some(old)))
        .and_then(Value::as_str)
        .and_then(RealmTier::from_name)
        .unwrap_or(RealmTier::Mortal);

    if target > previous {
        derived::consume_tribulation(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::commands::validator::CommandValidator;
    use serde_json::json;
    use tianji_domain::Command;

    fn validated(command: Command) -> ValidatedCommand {
        CommandValidator::new().validate(&command).unwrap()
    }

    #[test]
    fn only_matching_hooks_run() {
        let table = HookTable::standard();
        let mut state = SaveState::empty();

        let command = validated(Command::add("gameTime.minute", json!(30)));
        let ran = table.run(&mut state, &HookContext { command: &command, old_value: None });
        assert_eq!(ran, vec!["status-sweep", "lifespan-sync"]);

        let command = validated(Command::set("player.name", json!("Lin Feng")));
        assert!(table.run(&mut state, &HookContext { command: &command, old_value: None }).is_empty());
    }

    #[test]
    fn stage_change_keeps_the_tribulation_marker() {
        let mut state = SaveState::from_value(json!({
            "player": {"realm": {"name": "Qi Refining"}, "tribulationPassed": true}
        }))
        .unwrap();
        let old = json!("Qi Refining");
        let command = validated(Command::set("player.realm.name", json!("Qi Refining")));

        HookTable::standard().run(&mut state, &HookContext { command: &command, old_value: Some(&old) });
        assert!(state.tribulation_passed());
    }

    #[test]
    fn major_advance_consumes_the_tribulation_marker() {
        let mut state = SaveState::from_value(json!({
            "player": {"realm": {"name": "Golden Core"}, "tribulationPassed": true}
        }))
        .unwrap();
        let old = json!({"name": "Foundation Establishment", "stage": "Peak"});
        let command = validated(Command::set(
            "player.realm",
            json!({
                "name": "Golden Core", "stage": "Early", "currentProgress": 0,
                "nextThreshold": 1000, "breakthroughNarrative": "The core forms"
            }),
        ));

        HookTable::standard().run(&mut state, &HookContext { command: &command, old_value: Some(&old) });
        assert!(!state.tribulation_passed());
    }

    #[test]
    fn empty_table_runs_nothing() {
        let mut state = SaveState::empty();
        let command = validated(Command::add("gameTime.minute", json!(30)));
        assert!(HookTable::empty()
            .run(&mut state, &HookContext { command: &command, old_value: None })
            .is_empty());
    }
}
