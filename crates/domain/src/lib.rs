//! Tianji Domain - core types for the character save tree.
//!
//! The save tree is a single JSON document per character session. Everything in
//! this crate is synchronous and free of I/O:
//!
//! - `path` - dot/index addresses and the resolver that reads and writes through them
//! - `save_state` - the owning wrapper around the tree plus well-known locations
//! - `game_time` - the 30-day-month calendar and its normalization rules
//! - `command` - the mutation command model and changelog entries
//! - `value_objects` - typed views of the records that commands carry
//! - `character` - seeding a brand new character

extern crate self as tianji_domain;

pub mod character;
pub mod command;
pub mod error;
pub mod game_time;
pub mod ids;
pub mod path;
pub mod save_state;
pub mod value_objects;

pub use character::NewCharacter;
pub use command::{ChangeLogEntry, Command, CommandAction};
pub use error::DomainError;
pub use game_time::GameTime;
pub use ids::{ActionId, SessionId};
pub use path::{Path, PathError, Segment};
pub use save_state::{paths, slot_key, SaveState, EQUIPMENT_SLOT_COUNT};
pub use value_objects::{
    BirthDate, DaoPath, DaoStage, Item, Location, MapConfig, NpcProfile, NpcRealm, PlayerRealm,
    Quality, QualityTier, Quest, QuestObjective, RealmStage, RealmTier, SixAttributes,
    StatusEffect, StatusKind, TechniqueSkill,
};
