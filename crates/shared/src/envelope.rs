//! Response envelope requested from the generation service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{"text", "mid_term_summary"?, "commands"?}`
///
/// Older prompt formats used `mid_term_memory` and `tavern_commands`; both are
/// accepted. Commands stay raw here; the engine decides which entries are
/// well-formed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationEnvelope {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, alias = "mid_term_memory")]
    pub mid_term_summary: Option<String>,
    #[serde(default, alias = "tavern_commands")]
    pub commands: Option<Vec<Value>>,
}

impl GenerationEnvelope {
    /// Read an envelope out of an arbitrary JSON record. Fields of the wrong
    /// type are treated as absent.
    pub fn from_record(value: &Value) -> Option<Self> {
        let record = value.as_object()?;
        let text = record.get("text").and_then(Value::as_str).map(str::to_string);
        let mid_term_summary = ["mid_term_summary", "mid_term_memory"]
            .iter()
            .find_map(|key| record.get(*key).and_then(Value::as_str))
            .map(str::to_string);
        let commands = ["commands", "tavern_commands"]
            .iter()
            .find_map(|key| record.get(*key).and_then(Value::as_array))
            .cloned();
        Some(Self {
            text,
            mid_term_summary,
            commands,
        })
    }

    /// An envelope says something when it has text or commands.
    pub fn is_meaningful(&self) -> bool {
        self.text.is_some() || self.commands.is_some()
    }
}
