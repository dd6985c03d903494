//! Derived-state recalculation.
//!
//! These functions keep aggregated fields in step with the facts they derive
//! from. Command hooks and UI actions both call them, so a sword equipped by
//! the story and one equipped from the inventory panel add the same bonus.
//!
//! None of them fail: a malformed record is logged and left alone.

use serde_json::{json, Map, Number, Value};
use tianji_domain::{paths, BirthDate, Item, Path, SaveState, StatusEffect};

// =============================================================================
// Numbers
// =============================================================================

/// `current + delta` (or `current - delta`). Integers stay integers; anything
/// else is computed in floating point. Absent counts as zero.
pub fn add_numbers(current: Option<&Number>, delta: &Number, subtract: bool) -> Option<Number> {
    let zero = Number::from(0);
    let current = current.unwrap_or(&zero);

    if let (Some(a), Some(b)) = (current.as_i64(), delta.as_i64()) {
        let sum = if subtract { a.checked_sub(b) } else { a.checked_add(b) };
        if let Some(sum) = sum {
            return Some(Number::from(sum));
        }
    }

    let a = current.as_f64()?;
    let b = delta.as_f64()?;
    Number::from_f64(if subtract { a - b } else { a + b })
}

// =============================================================================
// Equipment bonuses
// =============================================================================

/// Add the item's `equipBonus` onto the `player` subtree. Only stats the
/// player already has are adjusted, so removal restores the tree exactly.
pub fn apply_equipment_bonus(state: &mut SaveState, item_id: &str) {
    adjust_equipment_bonus(state, item_id, false);
}

/// Exact inverse of [`apply_equipment_bonus`].
pub fn remove_equipment_bonus(state: &mut SaveState, item_id: &str) {
    adjust_equipment_bonus(state, item_id, true);
}

fn adjust_equipment_bonus(state: &mut SaveState, item_id: &str, subtract: bool) {
    let Some(bonus) = state
        .item_value(item_id)
        .and_then(|item| item.get("equipBonus"))
        .cloned()
    else {
        return;
    };

    let mut leaves = Vec::new();
    collect_numeric_leaves(&bonus, &mut vec![paths::PLAYER.to_string()], &mut leaves);

    for (raw, delta) in leaves {
        let Ok(target) = Path::parse(&raw) else {
            continue;
        };
        let current = match state.get(&target) {
            None | Some(Value::Null) => {
                tracing::debug!(path = %target, item = item_id, "Bonus target absent, skipped");
                continue;
            }
            Some(Value::Number(n)) => n.clone(),
            Some(_) => {
                tracing::warn!(path = %target, item = item_id, "Bonus target is not numeric, skipped");
                continue;
            }
        };
        let Some(next) = add_numbers(Some(&current), &delta, subtract) else {
            continue;
        };
        if let Err(e) = state.set(&target, Value::Number(next)) {
            tracing::warn!(path = %target, error = %e, "Could not write equipment bonus");
        }
    }
}

fn collect_numeric_leaves(value: &Value, prefix: &mut Vec<String>, out: &mut Vec<(String, Number)>) {
    match value {
        Value::Number(n) => out.push((prefix.join("."), n.clone())),
        Value::Object(map) => {
            for (key, child) in map {
                prefix.push(key.clone());
                collect_numeric_leaves(child, prefix, out);
                prefix.pop();
            }
        }
        _ => {}
    }
}

/// Set the `equipped` flag on an inventory item, if the item exists.
pub fn set_equipped_flag(state: &mut SaveState, item_id: &str, equipped: bool) {
    if let Some(Value::Object(item)) = state.item_value_mut(item_id) {
        item.insert("equipped".to_string(), Value::Bool(equipped));
    }
}

// =============================================================================
// Techniques
// =============================================================================

/// Rebuild `player.masteredSkills` from the active technique and every
/// technique in the inventory.
pub fn recompute_mastered_skills(state: &mut SaveState) {
    let mut techniques: Vec<Item> = state.active_technique().into_iter().collect();
    for id in state.item_ids() {
        if let Some(item) = state.item(&id).filter(Item::is_technique) {
            techniques.push(item);
        }
    }

    let mastered: Vec<Value> = techniques
        .iter()
        .flat_map(|technique| {
            technique.mastered_skills().map(move |skill| {
                json!({
                    "name": skill.name,
                    "description": skill.description,
                    "technique": technique.name,
                })
            })
        })
        .collect();

    if let Err(e) = state.set_at(paths::PLAYER_MASTERED_SKILLS, Value::Array(mastered)) {
        tracing::warn!(error = %e, "Could not write mastered skills");
    }
}

// =============================================================================
// Time
// =============================================================================

/// Drop status effects whose duration has elapsed at the current game time.
/// Returns how many were removed. Entries that cannot be read are kept.
pub fn sweep_status_effects(state: &mut SaveState) -> usize {
    let now = state.game_time();
    let Some(Value::Array(effects)) = state.get_at(paths::PLAYER_STATUS_EFFECTS) else {
        return 0;
    };

    let kept: Vec<Value> = effects
        .iter()
        .filter(|raw| {
            serde_json::from_value::<StatusEffect>((*raw).clone())
                .map(|effect| !effect.is_expired(&now))
                .unwrap_or(true)
        })
        .cloned()
        .collect();

    let removed = effects.len() - kept.len();
    if removed > 0 {
        tracing::debug!(removed, "Expired status effects swept");
        if let Err(e) = state.set_at(paths::PLAYER_STATUS_EFFECTS, Value::Array(kept)) {
            tracing::warn!(error = %e, "Could not write status effects");
        }
    }
    removed
}

/// Recompute ages from birth dates: the player's `age` and
/// `lifespan.current`, and `age` of every NPC that records a `birthDate`.
pub fn sync_lifespans(state: &mut SaveState) {
    let now = state.game_time();

    if let Some(birth) = birth_date(state.get_at(paths::PLAYER_BIRTH_DATE)) {
        let age = json!(now.years_since(birth.year, birth.month, birth.day));
        write_if_changed(state, paths::PLAYER_AGE, &age);
        write_if_changed(state, paths::PLAYER_LIFESPAN_CURRENT, &age);
    }

    let tracked: Vec<(String, BirthDate)> = state
        .get_at(paths::RELATIONS)
        .and_then(Value::as_object)
        .map(|relations| {
            relations
                .iter()
                .filter_map(|(name, npc)| birth_date(npc.get("birthDate")).map(|b| (name.clone(), b)))
                .collect()
        })
        .unwrap_or_default();

    for (name, birth) in tracked {
        let age = json!(now.years_since(birth.year, birth.month, birth.day));
        let Ok(path) = Path::parse(paths::RELATIONS) else {
            continue;
        };
        let path = path.child(name).child("age");
        if state.get(&path) != Some(&age) {
            if let Err(e) = state.set(&path, age) {
                tracing::warn!(path = %path, error = %e, "Could not sync npc age");
            }
        }
    }
}

fn birth_date(value: Option<&Value>) -> Option<BirthDate> {
    value.and_then(|v| serde_json::from_value(v.clone()).ok())
}

fn write_if_changed(state: &mut SaveState, raw: &str, value: &Value) {
    if state.get_at(raw) == Some(value) {
        return;
    }
    if let Err(e) = state.set_at(raw, value.clone()) {
        tracing::warn!(path = raw, error = %e, "Could not write derived value");
    }
}

// =============================================================================
// Location
// =============================================================================

/// Recompute `x`/`y` of the player location once both longitude and latitude
/// are known.
pub fn sync_coordinates(state: &mut SaveState) {
    let Some(Value::Object(location)) = state.get_at(paths::PLAYER_LOCATION) else {
        return;
    };
    let (Some(longitude), Some(latitude)) = (
        location.get("longitude").and_then(Value::as_f64),
        location.get("latitude").and_then(Value::as_f64),
    ) else {
        return;
    };

    let (x, y) = state.map_config().project(longitude, latitude);
    tracing::debug!(longitude, latitude, x, y, "Location coordinates synced");

    if let Some(Value::Object(location)) = state.get_at_mut(paths::PLAYER_LOCATION) {
        insert_number(location, "x", x);
        insert_number(location, "y", y);
    }
}

fn insert_number(record: &mut Map<String, Value>, key: &str, value: f64) {
    if let Some(n) = Number::from_f64(value) {
        record.insert(key.to_string(), Value::Number(n));
    }
}

// =============================================================================
// Realm
// =============================================================================

/// The tribulation marker pays for exactly one major advance.
pub fn consume_tribulation(state: &mut SaveState) {
    if state.tribulation_passed() {
        tracing::info!("Tribulation marker consumed by realm advance");
        if let Err(e) = state.set_at(paths::PLAYER_TRIBULATION_PASSED, Value::Bool(false)) {
            tracing::warn!(error = %e, "Could not clear tribulation marker");
        }
    }
}
