//! Inverse descriptors and the tree moves both directions share.
//!
//! Every action is built from the moves below, and its inverse replays the
//! opposite moves, so undoing restores item records, slots and aggregated
//! stats exactly.

use serde_json::Value;
use tianji_domain::{paths, slot_key, ChangeLogEntry, CommandAction, Path, SaveState};
use tianji_shared::ActionKind;

use super::error::ActionError;
use crate::use_cases::derived;

/// What an action displaced, so it can be put back.
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreData {
    Equip { slot: usize, evicted: Option<String> },
    Unequip { slot: usize },
    Use { previous: Value },
    Cultivate { previous: Option<String> },
    StopCultivation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UndoAction {
    pub kind: ActionKind,
    pub item_id: String,
    pub item_name: String,
    pub quantity: Option<u32>,
    pub restore: RestoreData,
}

impl UndoAction {
    /// Apply the exact inverse of the recorded action.
    pub fn revert(&self, state: &mut SaveState) -> Result<Vec<ChangeLogEntry>, ActionError> {
        match &self.restore {
            RestoreData::Equip { slot, evicted } => {
                // Later actions may have moved things; act on where they are now.
                let current = state.slot_of(&self.item_id);
                let target = current.unwrap_or(*slot);
                let evicted = evicted
                    .as_deref()
                    .filter(|id| state.item_value(id).is_some())
                    .filter(|id| state.slot_of(id).is_none());

                let mut tracked = vec![slot_path(target)?, item_path(&self.item_id)?];
                if let Some(evicted) = evicted {
                    tracked.push(item_path(evicted)?);
                }
                let changes = Changes::track(state, tracked);
                if current.is_some() {
                    vacate_slot(state, target)?;
                }
                if let Some(evicted) = evicted {
                    if state.equipment_slot(target).is_none() {
                        occupy_slot(state, target, evicted)?;
                    }
                }
                Ok(changes.finish(state))
            }
            RestoreData::Unequip { slot } => {
                if state.slot_of(&self.item_id).is_some() {
                    return Ok(Vec::new());
                }
                let target = match state.equipment_slot(*slot) {
                    None => *slot,
                    Some(_) => state
                        .first_empty_slot()
                        .ok_or_else(|| ActionError::NoFreeSlot(self.item_name.clone()))?,
                };
                let changes = Changes::track(state, vec![slot_path(target)?, item_path(&self.item_id)?]);
                occupy_slot(state, target, &self.item_id)?;
                Ok(changes.finish(state))
            }
            RestoreData::Use { previous } => {
                let path = item_path(&self.item_id)?;
                let changes = Changes::track(state, vec![path.clone()]);
                state.set(&path, previous.clone())?;
                Ok(changes.finish(state))
            }
            RestoreData::Cultivate { previous } => {
                let mut tracked = vec![Path::parse(paths::CULTIVATION_TECHNIQUE)?, item_path(&self.item_id)?];
                if let Some(previous) = previous {
                    tracked.push(item_path(previous)?);
                }
                let changes = Changes::track(state, tracked);
                return_technique(state)?;
                if let Some(previous) = previous {
                    activate_technique(state, previous)?;
                }
                derived::recompute_mastered_skills(state);
                Ok(changes.finish(state))
            }
            RestoreData::StopCultivation => {
                let changes = Changes::track(
                    state,
                    vec![Path::parse(paths::CULTIVATION_TECHNIQUE)?, item_path(&self.item_id)?],
                );
                activate_technique(state, &self.item_id)?;
                derived::recompute_mastered_skills(state);
                Ok(changes.finish(state))
            }
        }
    }
}

// =============================================================================
// Paths
// =============================================================================

pub(super) fn slot_path(slot: usize) -> Result<Path, ActionError> {
    Ok(Path::parse(paths::EQUIPMENT)?.child(slot_key(slot)))
}

pub(super) fn item_path(id: &str) -> Result<Path, ActionError> {
    Ok(Path::parse(paths::INVENTORY_ITEMS)?.child(id))
}

// =============================================================================
// Moves
// =============================================================================

/// Put `id` into `slot` and apply its bonus.
pub(super) fn occupy_slot(state: &mut SaveState, slot: usize, id: &str) -> Result<(), ActionError> {
    state.set(&slot_path(slot)?, Value::String(id.to_string()))?;
    derived::apply_equipment_bonus(state, id);
    derived::set_equipped_flag(state, id, true);
    Ok(())
}

/// Empty `slot`, removing the bonus of whatever it held. Returns that id.
pub(super) fn vacate_slot(state: &mut SaveState, slot: usize) -> Result<Option<String>, ActionError> {
    let occupant = state.equipment_slot(slot);
    state.set(&slot_path(slot)?, Value::Null)?;
    if let Some(id) = occupant.as_deref() {
        derived::remove_equipment_bonus(state, id);
        derived::set_equipped_flag(state, id, false);
    }
    Ok(occupant)
}

/// Move the active technique back into the inventory. Returns its id.
pub(super) fn return_technique(state: &mut SaveState) -> Result<Option<String>, ActionError> {
    let Some(technique) = state
        .get_at(paths::CULTIVATION_TECHNIQUE)
        .filter(|v| !v.is_null())
        .cloned()
    else {
        return Ok(None);
    };
    let id = technique
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| tianji_domain::DomainError::malformed(paths::CULTIVATION_TECHNIQUE, "missing id"))?;

    state.set(&item_path(&id)?, technique)?;
    state.set_at(paths::CULTIVATION_TECHNIQUE, Value::Null)?;
    Ok(Some(id))
}

/// Move an inventory technique into the cultivation slot.
pub(super) fn activate_technique(state: &mut SaveState, id: &str) -> Result<(), ActionError> {
    let technique = state
        .take_item(id)
        .ok_or_else(|| ActionError::ItemNotFound(id.to_string()))?;
    state.set_at(paths::CULTIVATION_TECHNIQUE, technique)?;
    Ok(())
}

// =============================================================================
// Changelog
// =============================================================================

/// Before-snapshots of the paths an action touches.
pub(super) struct Changes {
    tracked: Vec<(Path, Option<Value>)>,
}

impl Changes {
    pub(super) fn track(state: &SaveState, paths: Vec<Path>) -> Self {
        let tracked = paths
            .into_iter()
            .map(|path| {
                let before = state.get(&path).cloned();
                (path, before)
            })
            .collect();
        Self { tracked }
    }

    pub(super) fn finish(self, state: &SaveState) -> Vec<ChangeLogEntry> {
        self.tracked
            .into_iter()
            .filter_map(|(path, before)| {
                let after = state.get(&path).cloned();
                let action = if after.is_none() {
                    CommandAction::Delete
                } else {
                    CommandAction::Set
                };
                ChangeLogEntry::diff(path.to_string(), action, before, after)
            })
            .collect()
    }
}
