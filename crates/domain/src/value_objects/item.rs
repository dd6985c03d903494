//! Inventory items.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DomainError;

/// Item quality tiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Mortal,
    Common,
    Subtle,
    Earthly,
    Heavenly,
    Immortal,
    Divine,
}

impl QualityTier {
    pub fn all() -> &'static [QualityTier] {
        &[
            QualityTier::Mortal,
            QualityTier::Common,
            QualityTier::Subtle,
            QualityTier::Earthly,
            QualityTier::Heavenly,
            QualityTier::Immortal,
            QualityTier::Divine,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Mortal => "mortal",
            QualityTier::Common => "common",
            QualityTier::Subtle => "subtle",
            QualityTier::Earthly => "earthly",
            QualityTier::Heavenly => "heavenly",
            QualityTier::Immortal => "immortal",
            QualityTier::Divine => "divine",
        }
    }

    pub fn from_name(name: &str) -> Option<QualityTier> {
        let name = name.trim();
        Self::all()
            .iter()
            .copied()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quality {
    pub tier: QualityTier,
    /// 0 to 10 inclusive
    pub grade: f64,
}

/// One unlockable skill of a technique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechniqueSkill {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Technique progress needed before the skill counts as mastered
    #[serde(default)]
    pub unlock_threshold: f64,
}

/// An inventory item. Category-specific fields the engine does not interpret
/// are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    pub category: String,
    pub quality: Quality,
    pub quantity: u32,
    pub description: String,
    #[serde(default)]
    pub equipped: bool,
    #[serde(default)]
    pub stackable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<TechniqueSkill>,
    /// Cultivation progress, techniques only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    /// Bonus applied while equipped; mirrors the shape of the `player` subtree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equip_bonus: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub const CATEGORY_EQUIPMENT: &str = "equipment";
pub const CATEGORY_TECHNIQUE: &str = "technique";
pub const CATEGORY_CONSUMABLE: &str = "consumable";

impl Item {
    pub fn from_value(value: &Value) -> Result<Self, DomainError> {
        serde_json::from_value(value.clone()).map_err(|e| DomainError::malformed("item", e))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn is_technique(&self) -> bool {
        self.category.eq_ignore_ascii_case(CATEGORY_TECHNIQUE)
    }

    pub fn is_equipment(&self) -> bool {
        self.category.eq_ignore_ascii_case(CATEGORY_EQUIPMENT)
    }

    /// Skills whose threshold the current progress has reached.
    pub fn mastered_skills(&self) -> impl Iterator<Item = &TechniqueSkill> {
        let progress = self.progress.unwrap_or(0.0);
        self.skills
            .iter()
            .filter(move |skill| skill.unlock_threshold <= progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn technique() -> Value {
        json!({
            "id": "tech_1",
            "name": "Azure Cloud Sutra",
            "category": "technique",
            "quality": {"tier": "earthly", "grade": 6},
            "quantity": 1,
            "description": "A wind-attuned method",
            "progress": 40,
            "skills": [
                {"name": "Cloud Step", "unlockThreshold": 0},
                {"name": "Gale Palm", "unlockThreshold": 30},
                {"name": "Sky Rend", "unlockThreshold": 80}
            ],
            "origin": "Azure Sect library"
        })
    }

    #[test]
    fn quality_tiers_are_ordered() {
        assert!(QualityTier::Mortal < QualityTier::Common);
        assert!(QualityTier::Immortal < QualityTier::Divine);
        assert_eq!(QualityTier::from_name("Heavenly"), Some(QualityTier::Heavenly));
        assert_eq!(QualityTier::from_name("legendary"), None);
    }

    #[test]
    fn mastered_skills_follow_progress() {
        let item = Item::from_value(&technique()).unwrap();
        let names: Vec<_> = item.mastered_skills().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Cloud Step", "Gale Palm"]);
        assert!(item.is_technique());
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let item = Item::from_value(&technique()).unwrap();
        assert_eq!(item.extra.get("origin"), Some(&json!("Azure Sect library")));
        assert_eq!(item.to_value()["origin"], json!("Azure Sect library"));
    }
}
