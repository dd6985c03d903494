//! Cultivation realms.
//!
//! A realm is a major tier plus a stage inside it. Moving between stages is a
//! minor change; moving to a higher tier is a major advance that requires the
//! tribulation marker.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Major realm tiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RealmTier {
    Mortal,
    QiRefining,
    FoundationEstablishment,
    GoldenCore,
    NascentSoul,
    DeityTransformation,
    VoidRefinement,
    BodyIntegration,
    TribulationTranscendence,
}

impl RealmTier {
    pub fn all() -> &'static [RealmTier] {
        &[
            RealmTier::Mortal,
            RealmTier::QiRefining,
            RealmTier::FoundationEstablishment,
            RealmTier::GoldenCore,
            RealmTier::NascentSoul,
            RealmTier::DeityTransformation,
            RealmTier::VoidRefinement,
            RealmTier::BodyIntegration,
            RealmTier::TribulationTranscendence,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RealmTier::Mortal => "Mortal",
            RealmTier::QiRefining => "Qi Refining",
            RealmTier::FoundationEstablishment => "Foundation Establishment",
            RealmTier::GoldenCore => "Golden Core",
            RealmTier::NascentSoul => "Nascent Soul",
            RealmTier::DeityTransformation => "Deity Transformation",
            RealmTier::VoidRefinement => "Void Refinement",
            RealmTier::BodyIntegration => "Body Integration",
            RealmTier::TribulationTranscendence => "Tribulation Transcendence",
        }
    }

    /// Resolve a realm name. Case, spacing, `-` and `_` are ignored.
    pub fn from_name(name: &str) -> Option<RealmTier> {
        let wanted = fold(name);
        if wanted.is_empty() {
            return None;
        }
        Self::all()
            .iter()
            .copied()
            .find(|tier| fold(tier.display_name()) == wanted)
    }

    /// The tier directly above this one.
    pub fn next(&self) -> Option<RealmTier> {
        let all = Self::all();
        all.iter()
            .position(|tier| tier == self)
            .and_then(|i| all.get(i + 1))
            .copied()
    }
}

impl fmt::Display for RealmTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RealmStage {
    Early,
    Middle,
    Late,
    Peak,
}

impl RealmStage {
    pub fn from_name(name: &str) -> Option<RealmStage> {
        match fold(name).as_str() {
            "early" => Some(RealmStage::Early),
            "middle" => Some(RealmStage::Middle),
            "late" => Some(RealmStage::Late),
            "peak" => Some(RealmStage::Peak),
            _ => None,
        }
    }
}

fn fold(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// The player's realm record at `player.realm`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRealm {
    pub name: String,
    pub stage: String,
    pub current_progress: f64,
    pub next_threshold: f64,
    pub breakthrough_narrative: String,
}

impl PlayerRealm {
    pub fn tier(&self) -> Option<RealmTier> {
        RealmTier::from_name(&self.name)
    }

    pub fn mortal() -> Self {
        Self {
            name: RealmTier::Mortal.display_name().to_string(),
            stage: String::new(),
            current_progress: 0.0,
            next_threshold: 100.0,
            breakthrough_narrative: String::new(),
        }
    }
}

/// An NPC realm carries exactly a name and a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NpcRealm {
    pub name: String,
    pub stage: String,
}
