use serde::{Deserialize, Serialize};

/// The six innate attributes. `innate` never changes after creation;
/// `acquired` accumulates from events and items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SixAttributes {
    pub root_bone: i64,
    pub spirituality: i64,
    pub comprehension: i64,
    pub fortune: i64,
    pub charm: i64,
    pub temperament: i64,
}

impl SixAttributes {
    pub fn new(
        root_bone: i64,
        spirituality: i64,
        comprehension: i64,
        fortune: i64,
        charm: i64,
        temperament: i64,
    ) -> Self {
        Self {
            root_bone,
            spirituality,
            comprehension,
            fortune,
            charm,
            temperament,
        }
    }

    pub fn max_hp(&self) -> i64 {
        100 + self.root_bone * 10
    }

    pub fn max_mana(&self) -> i64 {
        50 + self.spirituality * 5
    }

    pub fn max_spirit(&self) -> i64 {
        30 + self.comprehension * 3
    }

    pub fn max_lifespan(&self) -> i64 {
        80 + self.root_bone * 5
    }
}
