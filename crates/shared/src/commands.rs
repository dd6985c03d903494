//! The command shape as it appears on the wire.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tianji_domain::command::present_value;
use tianji_domain::{Command, CommandAction, DomainError};

/// `{"action": "...", "key": "<path>", "value": <any>}`
///
/// `action` is kept as text so unknown actions surface as validation
/// failures instead of parse failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireCommand {
    pub action: String,
    pub key: String,
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
}

impl WireCommand {
    /// Lift a raw JSON entry. Entries without a string `action` and a string
    /// `key` are not commands at all and yield `None`.
    pub fn from_value(raw: &Value) -> Option<Self> {
        let record = raw.as_object()?;
        let action = record.get("action")?.as_str()?;
        let key = record.get("key")?.as_str()?;
        Some(Self {
            action: action.to_string(),
            key: key.to_string(),
            value: record.get("value").cloned(),
        })
    }
}

impl TryFrom<WireCommand> for Command {
    type Error = DomainError;

    fn try_from(wire: WireCommand) -> Result<Self, Self::Error> {
        let action: CommandAction = wire.action.parse()?;
        Ok(Command::new(action, wire.key, wire.value))
    }
}

impl From<&Command> for WireCommand {
    fn from(command: &Command) -> Self {
        Self {
            action: command.action.as_str().to_string(),
            key: command.key.clone(),
            value: command.value.clone(),
        }
    }
}
