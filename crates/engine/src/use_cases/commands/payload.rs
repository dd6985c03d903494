//! Typed command payloads.
//!
//! A payload exists only after the schema checks for its path category have
//! passed. Gates and hooks read these instead of the raw JSON value.

use tianji_domain::{DaoPath, Item, Location, NpcProfile, NpcRealm, PlayerRealm, Quest, StatusEffect};

#[derive(Debug, Clone, PartialEq)]
pub enum CommandPayload {
    PlayerRealm(PlayerRealm),
    RealmName(String),
    Location(Location),
    StatusEffect(StatusEffect),
    Item(Box<Item>),
    Npc(Box<NpcProfile>),
    NpcRealm(NpcRealm),
    Dao(DaoPath),
    Quest(Quest),
    /// No schema applies; the value is carried as-is
    Raw,
}

impl CommandPayload {
    /// Target realm name, for payloads that set one.
    pub fn realm_name(&self) -> Option<&str> {
        match self {
            CommandPayload::PlayerRealm(realm) => Some(&realm.name),
            CommandPayload::RealmName(name) => Some(name),
            _ => None,
        }
    }

    pub fn item(&self) -> Option<&Item> {
        match self {
            CommandPayload::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CommandPayload::PlayerRealm(_) => "player realm",
            CommandPayload::RealmName(_) => "realm name",
            CommandPayload::Location(_) => "location",
            CommandPayload::StatusEffect(_) => "status effect",
            CommandPayload::Item(_) => "item",
            CommandPayload::Npc(_) => "npc",
            CommandPayload::NpcRealm(_) => "npc realm",
            CommandPayload::Dao(_) => "dao",
            CommandPayload::Quest(_) => "quest",
            CommandPayload::Raw => "raw",
        }
    }
}
