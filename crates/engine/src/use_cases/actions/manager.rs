//! Direct-manipulation actions from the inventory panel.
//!
//! Actions mutate the tree immediately. Each one also queues an entry for the
//! display and an inverse descriptor for undo; both live together in one
//! bounded queue so that trimming, conflict cancellation and undo always
//! drop the pair.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Arc;

use tianji_domain::{paths, ActionId, ChangeLogEntry, Item, Path, SaveState};
use tianji_shared::{ActionKind, DisplayEvent, QueueEntry};

use super::error::ActionError;
use super::undo::{
    activate_technique, item_path, occupy_slot, return_technique, slot_path, vacate_slot, Changes,
    RestoreData, UndoAction,
};
use crate::infrastructure::ports::{ClockPort, DisplayPort};
use crate::use_cases::derived;

pub const DEFAULT_QUEUE_CAP: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    Applied,
    /// Nothing to do, e.g. equipping an item already worn
    AlreadyDone,
    /// Reversed a pending opposite action instead of queueing a new one
    ConflictCancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub status: ActionStatus,
    pub message: String,
    pub changelog: Vec<ChangeLogEntry>,
}

impl ActionOutcome {
    fn new(status: ActionStatus, message: impl Into<String>, changelog: Vec<ChangeLogEntry>) -> Self {
        Self {
            status,
            message: message.into(),
            changelog,
        }
    }
}

/// A queued action: what the display shows and how to take it back.
#[derive(Debug, Clone)]
pub struct PendingAction {
    pub entry: QueueEntry,
    pub undo: UndoAction,
    pub queued_at: DateTime<Utc>,
}

pub struct ActionQueueManager {
    pending: VecDeque<PendingAction>,
    cap: usize,
    display: Arc<dyn DisplayPort>,
    clock: Arc<dyn ClockPort>,
}

impl ActionQueueManager {
    pub fn new(cap: usize, display: Arc<dyn DisplayPort>, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            pending: VecDeque::new(),
            cap: cap.max(1),
            display,
            clock,
        }
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingAction> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Display descriptions, oldest first, for the next narrative turn.
    pub fn pending_descriptions(&self) -> Vec<String> {
        self.pending.iter().map(|p| p.entry.description.clone()).collect()
    }

    /// Forget every pending action; they are now part of the story.
    pub fn clear_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        tracing::debug!(count = self.pending.len(), "Pending actions cleared");
        self.pending.clear();
        self.display.notify(DisplayEvent::QueueCleared);
    }

    // =========================================================================
    // Actions
    // =========================================================================

    pub fn equip(&mut self, state: &mut SaveState, item_id: &str) -> Result<ActionOutcome, ActionError> {
        let item = inventory_item(state, item_id)?;
        if !item.is_equipment() {
            return Err(ActionError::NotEquipment(item.name));
        }
        if state.slot_of(item_id).is_some() {
            return Ok(ActionOutcome::new(
                ActionStatus::AlreadyDone,
                format!("{} is already equipped", item.name),
                Vec::new(),
            ));
        }

        match self.cancel_opposite(state, ActionKind::Unequip, item_id, &item.name) {
            Ok(Some(outcome)) => return Ok(outcome),
            Ok(None) => {}
            // Every slot was refilled since the unequip; equip normally and keep both.
            Err(ActionError::NoFreeSlot(_)) => {
                tracing::debug!(item = item_id, "Pending unequip kept, no slot to restore into");
            }
            Err(e) => return Err(e),
        }

        let (slot, evicted) = match state.first_empty_slot() {
            Some(slot) => (slot, None),
            None => (1, state.equipment_slot(1)),
        };

        let mut tracked = vec![slot_path(slot)?];
        if let Some(evicted) = evicted.as_deref() {
            tracked.push(item_path(evicted)?);
        }
        tracked.push(item_path(item_id)?);
        let changes = Changes::track(state, tracked);

        if evicted.is_some() {
            vacate_slot(state, slot)?;
        }
        occupy_slot(state, slot, item_id)?;

        let message = match &evicted {
            Some(evicted) => format!("Equipped {} in slot {slot}, returning {evicted} to the inventory", item.name),
            None => format!("Equipped {} in slot {slot}", item.name),
        };
        tracing::info!(item = item_id, slot, evicted = ?evicted, "Item equipped");

        self.queue(UndoAction {
            kind: ActionKind::Equip,
            item_id: item_id.to_string(),
            item_name: item.name,
            quantity: None,
            restore: RestoreData::Equip { slot, evicted },
        });
        Ok(ActionOutcome::new(ActionStatus::Applied, message, changes.finish(state)))
    }

    pub fn unequip(&mut self, state: &mut SaveState, item_id: &str) -> Result<ActionOutcome, ActionError> {
        let item = inventory_item(state, item_id)?;
        let Some(slot) = state.slot_of(item_id) else {
            return Err(ActionError::NotEquipped(item.name));
        };

        if let Some(outcome) = self.cancel_opposite(state, ActionKind::Equip, item_id, &item.name)? {
            return Ok(outcome);
        }

        let changes = Changes::track(state, vec![slot_path(slot)?, item_path(item_id)?]);
        vacate_slot(state, slot)?;
        tracing::info!(item = item_id, slot, "Item unequipped");

        let message = format!("Unequipped {}", item.name);
        self.queue(UndoAction {
            kind: ActionKind::Unequip,
            item_id: item_id.to_string(),
            item_name: item.name,
            quantity: None,
            restore: RestoreData::Unequip { slot },
        });
        Ok(ActionOutcome::new(ActionStatus::Applied, message, changes.finish(state)))
    }

    pub fn use_item(
        &mut self,
        state: &mut SaveState,
        item_id: &str,
        quantity: u32,
    ) -> Result<ActionOutcome, ActionError> {
        if quantity == 0 {
            return Err(ActionError::InvalidQuantity);
        }
        let item = inventory_item(state, item_id)?;
        if state.slot_of(item_id).is_some() || item.equipped {
            return Err(ActionError::ItemEquipped(item.name));
        }
        if item.quantity < quantity {
            return Err(ActionError::InsufficientResource {
                item: item.name,
                requested: quantity,
                available: item.quantity,
            });
        }

        let path = item_path(item_id)?;
        let previous = state.get(&path).cloned().unwrap_or_default();
        let changes = Changes::track(state, vec![path.clone()]);

        let remaining = item.quantity - quantity;
        if remaining == 0 {
            state.remove(&path);
        } else {
            state.set(&path.child("quantity"), remaining.into())?;
        }
        tracing::info!(item = item_id, quantity, remaining, "Item used");

        let message = format!("Used {quantity} x {}", item.name);
        self.queue(UndoAction {
            kind: ActionKind::Use,
            item_id: item_id.to_string(),
            item_name: item.name,
            quantity: Some(quantity),
            restore: RestoreData::Use { previous },
        });
        Ok(ActionOutcome::new(ActionStatus::Applied, message, changes.finish(state)))
    }

    pub fn cultivate(&mut self, state: &mut SaveState, item_id: &str) -> Result<ActionOutcome, ActionError> {
        let item = inventory_item(state, item_id)?;
        if !item.is_technique() {
            return Err(ActionError::NotATechnique(item.name));
        }

        let previous = state.active_technique().map(|t| t.id);
        let mut tracked = vec![
            Path::parse(paths::CULTIVATION_TECHNIQUE)?,
            item_path(item_id)?,
        ];
        if let Some(previous) = previous.as_deref() {
            tracked.push(item_path(previous)?);
        }
        let changes = Changes::track(state, tracked);

        return_technique(state)?;
        activate_technique(state, item_id)?;
        derived::recompute_mastered_skills(state);
        tracing::info!(item = item_id, previous = ?previous, "Cultivation started");

        let message = format!("Now cultivating {}", item.name);
        self.queue(UndoAction {
            kind: ActionKind::Cultivate,
            item_id: item_id.to_string(),
            item_name: item.name,
            quantity: None,
            restore: RestoreData::Cultivate { previous },
        });
        Ok(ActionOutcome::new(ActionStatus::Applied, message, changes.finish(state)))
    }

    pub fn stop_cultivation(
        &mut self,
        state: &mut SaveState,
        item_id: &str,
    ) -> Result<ActionOutcome, ActionError> {
        let technique = state
            .active_technique()
            .filter(|t| t.id == item_id)
            .ok_or_else(|| ActionError::NoActiveTechnique(item_id.to_string()))?;

        let changes = Changes::track(
            state,
            vec![
                Path::parse(paths::CULTIVATION_TECHNIQUE)?,
                item_path(item_id)?,
            ],
        );
        return_technique(state)?;
        derived::recompute_mastered_skills(state);
        tracing::info!(item = item_id, "Cultivation stopped");

        let message = format!("Stopped cultivating {}", technique.name);
        self.queue(UndoAction {
            kind: ActionKind::StopCultivation,
            item_id: item_id.to_string(),
            item_name: technique.name,
            quantity: None,
            restore: RestoreData::StopCultivation,
        });
        Ok(ActionOutcome::new(ActionStatus::Applied, message, changes.finish(state)))
    }

    /// Reverse the most recent pending action.
    pub fn undo_last(&mut self, state: &mut SaveState) -> Result<ActionOutcome, ActionError> {
        let Some(last) = self.pending.back() else {
            return Err(ActionError::NothingToUndo);
        };
        let changelog = last.undo.revert(state)?;
        let Some(last) = self.pending.pop_back() else {
            return Err(ActionError::NothingToUndo);
        };
        self.display.notify(DisplayEvent::QueueRemoved { id: last.entry.id });
        tracing::info!(action = %last.entry.description, "Action undone");

        Ok(ActionOutcome::new(
            ActionStatus::Applied,
            format!("Undid: {}", last.entry.description),
            changelog,
        ))
    }

    // =========================================================================
    // Queue
    // =========================================================================

    /// If an opposite action on the same item is pending, reverse it and drop
    /// it instead of queueing a new action.
    fn cancel_opposite(
        &mut self,
        state: &mut SaveState,
        opposite: ActionKind,
        item_id: &str,
        item_name: &str,
    ) -> Result<Option<ActionOutcome>, ActionError> {
        let Some(index) = self
            .pending
            .iter()
            .rposition(|p| p.undo.kind == opposite && p.undo.item_id == item_id)
        else {
            return Ok(None);
        };

        let changelog = match self.pending.get(index) {
            Some(pending) => pending.undo.revert(state)?,
            None => return Ok(None),
        };
        if let Some(cancelled) = self.pending.remove(index) {
            self.display.notify(DisplayEvent::QueueRemoved { id: cancelled.entry.id });
        }
        tracing::info!(item = item_id, cancelled = opposite.verb(), "Pending action cancelled by its opposite");

        Ok(Some(ActionOutcome::new(
            ActionStatus::ConflictCancelled,
            format!("Cancelled pending {} of {item_name}", opposite.verb()),
            changelog,
        )))
    }

    fn queue(&mut self, undo: UndoAction) {
        let entry = QueueEntry {
            id: ActionId::new(),
            kind: undo.kind,
            item_id: undo.item_id.clone(),
            item_name: undo.item_name.clone(),
            quantity: undo.quantity,
            description: describe(&undo),
        };
        self.display.notify(DisplayEvent::QueueAdded { entry: entry.clone() });
        self.pending.push_back(PendingAction {
            entry,
            undo,
            queued_at: self.clock.now(),
        });

        while self.pending.len() > self.cap {
            if let Some(oldest) = self.pending.pop_front() {
                tracing::debug!(action = %oldest.entry.description, "Oldest pending action trimmed");
                self.display.notify(DisplayEvent::QueueRemoved { id: oldest.entry.id });
            }
        }
    }
}

fn describe(undo: &UndoAction) -> String {
    match undo.quantity {
        Some(quantity) => format!("{} {quantity} x {}", undo.kind.verb(), undo.item_name),
        None => format!("{} {}", undo.kind.verb(), undo.item_name),
    }
}

fn inventory_item(state: &SaveState, item_id: &str) -> Result<Item, ActionError> {
    let raw = state
        .item_value(item_id)
        .ok_or_else(|| ActionError::ItemNotFound(item_id.to_string()))?;
    Ok(Item::from_value(raw)?)
}
