use serde::{Deserialize, Serialize};

/// A stage of a dao path, written either as a bare name or a full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DaoStage {
    Named(String),
    Detailed {
        name: String,
        #[serde(default)]
        description: String,
        #[serde(default, rename = "requiredExperience")]
        required_experience: f64,
    },
}

impl DaoStage {
    pub fn name(&self) -> &str {
        match self {
            DaoStage::Named(name) => name,
            DaoStage::Detailed { name, .. } => name,
        }
    }
}

/// A comprehension path under `dao.paths.<name>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaoPath {
    pub name: String,
    pub description: String,
    pub stages: Vec<DaoStage>,
    pub unlocked: bool,
    #[serde(default)]
    pub current_stage: u32,
    #[serde(default)]
    pub experience: f64,
    #[serde(default)]
    pub total_experience: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stages_accept_names_and_records() {
        let dao: DaoPath = serde_json::from_value(json!({
            "name": "Sword Dao",
            "description": "The way of the blade",
            "stages": ["Sword Intent", {"name": "Sword Heart", "requiredExperience": 500}],
            "unlocked": false
        }))
        .unwrap();
        assert_eq!(dao.stages[0].name(), "Sword Intent");
        assert_eq!(dao.stages[1].name(), "Sword Heart");
        assert_eq!(dao.current_stage, 0);
    }
}
