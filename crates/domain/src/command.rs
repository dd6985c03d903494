//! Mutation commands and the changelog they produce.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandAction {
    Set,
    Add,
    Push,
    Delete,
    /// Remove the first sequence element equal to the value
    Pull,
}

impl CommandAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandAction::Set => "set",
            CommandAction::Add => "add",
            CommandAction::Push => "push",
            CommandAction::Delete => "delete",
            CommandAction::Pull => "pull",
        }
    }

    pub fn requires_value(&self) -> bool {
        !matches!(self, CommandAction::Delete)
    }
}

impl fmt::Display for CommandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "set" => Ok(CommandAction::Set),
            "add" => Ok(CommandAction::Add),
            "push" => Ok(CommandAction::Push),
            "delete" => Ok(CommandAction::Delete),
            "pull" => Ok(CommandAction::Pull),
            other => Err(DomainError::validation(format!("unknown action `{other}`"))),
        }
    }
}

/// A candidate mutation of the save tree. `key` is an unparsed path; the
/// validator decides whether the command may be applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub action: CommandAction,
    pub key: String,
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
}

impl Command {
    pub fn new(action: CommandAction, key: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            action,
            key: key.into(),
            value,
        }
    }

    pub fn set(key: impl Into<String>, value: Value) -> Self {
        Self::new(CommandAction::Set, key, Some(value))
    }

    pub fn add(key: impl Into<String>, value: Value) -> Self {
        Self::new(CommandAction::Add, key, Some(value))
    }

    pub fn push(key: impl Into<String>, value: Value) -> Self {
        Self::new(CommandAction::Push, key, Some(value))
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self::new(CommandAction::Delete, key, None)
    }

    pub fn pull(key: impl Into<String>, value: Value) -> Self {
        Self::new(CommandAction::Pull, key, Some(value))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.action, self.key)
    }
}

/// Distinguishes an explicit `null` value from a missing one.
pub fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// One before/after diff. `None` means the path was absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogEntry {
    pub path: String,
    pub action: CommandAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

impl ChangeLogEntry {
    /// Build an entry only when the two snapshots differ.
    pub fn diff(
        path: impl Into<String>,
        action: CommandAction,
        old_value: Option<Value>,
        new_value: Option<Value>,
    ) -> Option<Self> {
        if old_value == new_value {
            return None;
        }
        Some(Self {
            path: path.into(),
            action,
            old_value,
            new_value,
        })
    }
}
