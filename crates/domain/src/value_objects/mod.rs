//! Typed views of the records carried by commands and stored in the tree

mod attributes;
mod dao;
mod item;
mod location;
mod npc;
mod quest;
mod realm;
mod status_effect;

pub use attributes::SixAttributes;
pub use dao::{DaoPath, DaoStage};
pub use item::{
    Item, Quality, QualityTier, TechniqueSkill, CATEGORY_CONSUMABLE, CATEGORY_EQUIPMENT,
    CATEGORY_TECHNIQUE,
};
pub use location::{Location, MapConfig, MAP_HEIGHT, MAP_WIDTH};
pub use npc::{BirthDate, NpcProfile};
pub use quest::{Quest, QuestObjective};
pub use realm::{NpcRealm, PlayerRealm, RealmStage, RealmTier};
pub use status_effect::{StatusEffect, StatusKind};
