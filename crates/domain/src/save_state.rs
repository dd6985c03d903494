//! The save tree for one character session.
//!
//! `SaveState` owns the JSON document and offers typed accessors for the
//! well-known locations listed in [`paths`]. Anything the engine does not
//! interpret is carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DomainError;
use crate::game_time::GameTime;
use crate::path::{self, Path, PathError};
use crate::value_objects::{Item, MapConfig, PlayerRealm, RealmTier};

pub const EQUIPMENT_SLOT_COUNT: usize = 6;

/// Well-known locations in the save tree.
pub mod paths {
    pub const PLAYER: &str = "player";
    pub const PLAYER_REALM: &str = "player.realm";
    pub const PLAYER_REALM_NAME: &str = "player.realm.name";
    pub const PLAYER_LOCATION: &str = "player.location";
    pub const PLAYER_ATTRIBUTES: &str = "player.attributes";
    pub const PLAYER_STATUS_EFFECTS: &str = "player.statusEffects";
    pub const PLAYER_MASTERED_SKILLS: &str = "player.masteredSkills";
    pub const PLAYER_TRIBULATION_PASSED: &str = "player.tribulationPassed";
    pub const PLAYER_BIRTH_DATE: &str = "player.birthDate";
    pub const PLAYER_AGE: &str = "player.age";
    pub const PLAYER_LIFESPAN_CURRENT: &str = "player.lifespan.current";
    pub const INVENTORY_ITEMS: &str = "inventory.items";
    pub const EQUIPMENT: &str = "equipment";
    pub const CULTIVATION_TECHNIQUE: &str = "cultivation.technique";
    pub const RELATIONS: &str = "relations";
    pub const GAME_TIME: &str = "gameTime";
    pub const GAME_TIME_MINUTE: &str = "gameTime.minute";
    pub const DAO_PATHS: &str = "dao.paths";
    pub const QUESTS_ACTIVE: &str = "quests.active";
    pub const MEMORY: &str = "memory";
    pub const MEMORY_SHORT_TERM: &str = "memory.shortTerm";
    pub const MEMORY_MID_TERM: &str = "memory.midTerm";
    pub const MEMORY_IMPLICIT_MID_TERM: &str = "memory.implicitMidTerm";
    pub const MAP_CONFIG: &str = "world.mapConfig";
}

/// Key of the 1-based equipment slot `n`.
pub fn slot_key(n: usize) -> String {
    format!("slot{n}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaveState {
    root: Value,
}

impl SaveState {
    pub fn from_value(root: Value) -> Result<Self, DomainError> {
        if !root.is_object() {
            return Err(DomainError::validation("save tree root must be a record"));
        }
        Ok(Self { root })
    }

    pub fn empty() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    // =========================================================================
    // Path access
    // =========================================================================

    pub fn get(&self, path: &Path) -> Option<&Value> {
        path::get(&self.root, path)
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut Value> {
        path::get_mut(&mut self.root, path)
    }

    pub fn set(&mut self, path: &Path, value: Value) -> Result<(), PathError> {
        path::set(&mut self.root, path, value)
    }

    pub fn remove(&mut self, path: &Path) -> Option<Value> {
        path::remove(&mut self.root, path)
    }

    /// Read through a dotted literal; unparseable input reads as absent.
    pub fn get_at(&self, raw: &str) -> Option<&Value> {
        Path::parse(raw).ok().and_then(|p| path::get(&self.root, &p))
    }

    pub fn get_at_mut(&mut self, raw: &str) -> Option<&mut Value> {
        let parsed = Path::parse(raw).ok()?;
        path::get_mut(&mut self.root, &parsed)
    }

    pub fn set_at(&mut self, raw: &str, value: Value) -> Result<(), PathError> {
        let parsed = Path::parse(raw)?;
        path::set(&mut self.root, &parsed, value)
    }

    pub fn remove_at(&mut self, raw: &str) -> Option<Value> {
        let parsed = Path::parse(raw).ok()?;
        path::remove(&mut self.root, &parsed)
    }

    // =========================================================================
    // Typed views
    // =========================================================================

    /// Current calendar; a missing or malformed record reads as the default.
    pub fn game_time(&self) -> GameTime {
        self.get_at(paths::GAME_TIME)
            .and_then(|v| GameTime::from_value(v).ok())
            .unwrap_or_default()
    }

    pub fn set_game_time(&mut self, time: GameTime) -> Result<(), PathError> {
        self.set_at(paths::GAME_TIME, time.to_value())
    }

    pub fn player_realm(&self) -> Option<PlayerRealm> {
        self.get_at(paths::PLAYER_REALM)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Tier of the current realm name, if recognised.
    pub fn realm_tier(&self) -> Option<RealmTier> {
        self.get_at(paths::PLAYER_REALM_NAME)
            .and_then(Value::as_str)
            .and_then(RealmTier::from_name)
    }

    pub fn tribulation_passed(&self) -> bool {
        self.get_at(paths::PLAYER_TRIBULATION_PASSED)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn map_config(&self) -> MapConfig {
        self.get_at(paths::MAP_CONFIG)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    pub fn item(&self, id: &str) -> Option<Item> {
        self.item_value(id).and_then(|v| Item::from_value(v).ok())
    }

    pub fn item_value(&self, id: &str) -> Option<&Value> {
        self.get_at(paths::INVENTORY_ITEMS)
            .and_then(Value::as_object)
            .and_then(|items| items.get(id))
    }

    pub fn item_value_mut(&mut self, id: &str) -> Option<&mut Value> {
        self.get_at_mut(paths::INVENTORY_ITEMS)
            .and_then(Value::as_object_mut)
            .and_then(|items| items.get_mut(id))
    }

    /// Ids of every item record in the inventory.
    pub fn item_ids(&self) -> Vec<String> {
        self.get_at(paths::INVENTORY_ITEMS)
            .and_then(Value::as_object)
            .map(|items| items.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn put_item(&mut self, item: &Item) -> Result<(), PathError> {
        let path = Path::parse(paths::INVENTORY_ITEMS)?.child(item.id.clone());
        self.set(&path, item.to_value())
    }

    pub fn take_item(&mut self, id: &str) -> Option<Value> {
        let path = Path::parse(paths::INVENTORY_ITEMS).ok()?.child(id);
        self.remove(&path)
    }

    /// Item id held by the 1-based slot `n`, if occupied.
    pub fn equipment_slot(&self, n: usize) -> Option<String> {
        self.get_at(paths::EQUIPMENT)
            .and_then(|equipment| equipment.get(slot_key(n)))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }

    /// 1-based slot currently holding `id`.
    pub fn slot_of(&self, id: &str) -> Option<usize> {
        (1..=EQUIPMENT_SLOT_COUNT).find(|n| self.equipment_slot(*n).as_deref() == Some(id))
    }

    pub fn first_empty_slot(&self) -> Option<usize> {
        (1..=EQUIPMENT_SLOT_COUNT).find(|n| self.equipment_slot(*n).is_none())
    }

    pub fn active_technique(&self) -> Option<Item> {
        self.get_at(paths::CULTIVATION_TECHNIQUE)
            .filter(|v| !v.is_null())
            .and_then(|v| Item::from_value(v).ok())
    }
}

impl Default for SaveState {
    fn default() -> Self {
        Self::empty()
    }
}

impl TryFrom<Value> for SaveState {
    type Error = DomainError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}
