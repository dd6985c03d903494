//! NPC profiles stored under `relations.<name>`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::realm::NpcRealm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthDate {
    pub year: i64,
    pub month: i64,
    pub day: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NpcProfile {
    pub name: String,
    pub gender: String,
    pub age: f64,
    pub realm: NpcRealm,
    pub role: String,
    /// A list of traits or a free-form description
    pub traits: Value,
    pub appearance: String,
    pub relationship_label: String,
    pub favor: f64,
    #[serde(default)]
    pub memory: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<BirthDate>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NpcProfile {
    /// NPCs with a birth date have their age kept in step with the calendar.
    pub fn is_tracked(&self) -> bool {
        self.birth_date.is_some()
    }
}
