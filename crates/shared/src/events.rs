//! Notifications pushed to the UI display. The display has no mutation
//! authority; it only mirrors the pending-action queue and the changelog.

use serde::{Deserialize, Serialize};

use tianji_domain::{ActionId, ChangeLogEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Equip,
    Unequip,
    Use,
    Cultivate,
    StopCultivation,
    /// Unknown kind for forward compatibility
    #[serde(other)]
    Unknown,
}

impl ActionKind {
    pub fn verb(&self) -> &'static str {
        match self {
            ActionKind::Equip => "equip",
            ActionKind::Unequip => "unequip",
            ActionKind::Use => "use",
            ActionKind::Cultivate => "cultivate",
            ActionKind::StopCultivation => "stop cultivating",
            ActionKind::Unknown => "act on",
        }
    }
}

/// One pending UI action as shown to the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub id: ActionId,
    pub kind: ActionKind,
    pub item_id: String,
    pub item_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DisplayEvent {
    QueueAdded { entry: QueueEntry },
    QueueRemoved { id: ActionId },
    QueueCleared,
    Changelog { entries: Vec<ChangeLogEntry> },
}
