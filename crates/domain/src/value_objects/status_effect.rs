use serde::{Deserialize, Serialize};

use crate::game_time::GameTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Buff,
    Debuff,
}

/// A timed buff or debuff on the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEffect {
    pub name: String,
    pub kind: StatusKind,
    pub created_at: GameTime,
    /// Negative means permanent
    pub duration_minutes: f64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl StatusEffect {
    pub fn is_permanent(&self) -> bool {
        self.duration_minutes < 0.0
    }

    /// Expired once the elapsed time reaches the duration.
    pub fn is_expired(&self, now: &GameTime) -> bool {
        if self.is_permanent() {
            return false;
        }
        now.minutes_since(&self.created_at) as f64 >= self.duration_minutes
    }
}
