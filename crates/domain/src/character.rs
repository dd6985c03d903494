//! Seeding the save tree for a brand new character.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::game_time::GameTime;
use crate::save_state::{slot_key, SaveState, EQUIPMENT_SLOT_COUNT};
use crate::value_objects::{PlayerRealm, SixAttributes};

/// Creation choices for a new character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCharacter {
    pub name: String,
    pub gender: String,
    pub age: i64,
    pub innate: SixAttributes,
    #[serde(default)]
    pub birthplace: String,
    #[serde(default)]
    pub start_time: GameTime,
}

impl NewCharacter {
    pub fn new(name: impl Into<String>, gender: impl Into<String>, age: i64, innate: SixAttributes) -> Self {
        Self {
            name: name.into(),
            gender: gender.into(),
            age,
            innate,
            birthplace: String::new(),
            start_time: GameTime::default(),
        }
    }
}

impl SaveState {
    /// Build the default tree for a new character. Resource maxima and the
    /// lifespan ceiling derive from the innate attributes.
    pub fn new_character(spec: &NewCharacter) -> SaveState {
        let innate = spec.innate;
        let hp = innate.max_hp();
        let mana = innate.max_mana();
        let spirit = innate.max_spirit();
        let time = spec.start_time.normalized();

        let mut equipment = serde_json::Map::new();
        for n in 1..=EQUIPMENT_SLOT_COUNT {
            equipment.insert(slot_key(n), serde_json::Value::Null);
        }

        let realm = PlayerRealm {
            breakthrough_narrative: "Draw qi into the body and begin the path of cultivation".into(),
            ..PlayerRealm::mortal()
        };

        let root = json!({
            "player": {
                "name": spec.name,
                "gender": spec.gender,
                "age": spec.age,
                "birthDate": {
                    "year": time.year - spec.age,
                    "month": time.month,
                    "day": time.day
                },
                "lifespan": {"current": spec.age, "max": innate.max_lifespan()},
                "realm": realm,
                "location": {"description": spec.birthplace, "x": 0.0, "y": 0.0},
                "attributes": {
                    "hp": {"current": hp, "max": hp},
                    "mana": {"current": mana, "max": mana},
                    "spirit": {"current": spirit, "max": spirit}
                },
                "innate": innate,
                "acquired": SixAttributes::default(),
                "statusEffects": [],
                "masteredSkills": [],
                "tribulationPassed": false
            },
            "inventory": {
                "spiritStones": {"low": 0, "middle": 0, "high": 0, "supreme": 0},
                "items": {}
            },
            "equipment": equipment,
            "cultivation": {
                "technique": null,
                "proficiency": 0,
                "cultivationMinutes": 0,
                "breakthroughs": 0
            },
            "relations": {},
            "gameTime": time.to_value(),
            "dao": {"paths": {}},
            "quests": {"active": []},
            "memory": {
                "shortTerm": [],
                "midTerm": [],
                "longTerm": [],
                "implicitMidTerm": []
            }
        });

        SaveState::from_value(root).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save_state::paths;
    use serde_json::Value;

    #[test]
    fn derives_resources_from_innate_attributes() {
        let spec = NewCharacter::new("Lin Feng", "male", 16, SixAttributes::new(8, 6, 5, 3, 4, 7));
        let state = SaveState::new_character(&spec);

        assert_eq!(state.get_at("player.attributes.hp.max"), Some(&json!(180)));
        assert_eq!(state.get_at("player.attributes.mana.current"), Some(&json!(80)));
        assert_eq!(state.get_at("player.attributes.spirit.max"), Some(&json!(45)));
        assert_eq!(state.get_at("player.lifespan.max"), Some(&json!(120)));
        assert_eq!(state.get_at("player.birthDate.year"), Some(&json!(984)));
    }

    #[test]
    fn starts_with_empty_slots_and_memory() {
        let spec = NewCharacter::new("Su Mei", "female", 18, SixAttributes::default());
        let state = SaveState::new_character(&spec);

        assert_eq!(state.first_empty_slot(), Some(1));
        assert_eq!(state.game_time(), GameTime::default());
        assert_eq!(state.get_at(paths::MEMORY_SHORT_TERM), Some(&json!([])));
        assert_eq!(state.get_at(paths::CULTIVATION_TECHNIQUE), Some(&Value::Null));
        assert_eq!(state.realm_tier(), Some(crate::RealmTier::Mortal));
    }
}
