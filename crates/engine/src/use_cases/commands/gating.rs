//! Gating rules: domain preconditions that can veto a structurally valid command.
//!
//! A gate only answers allow/deny. It never edits or replaces the command.

use thiserror::Error;
use tianji_domain::{paths, CommandAction, RealmTier, SaveState};

use super::matcher::{any_match, PathMatcher};
use super::validator::ValidatedCommand;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("gate `{rule}` blocked {path}: {reason}")]
pub struct GatingViolation {
    pub rule: &'static str,
    pub path: String,
    pub reason: String,
}

type GateCheck = fn(&SaveState, &ValidatedCommand) -> Result<(), String>;

pub struct GateRule {
    pub name: &'static str,
    pub matchers: &'static [PathMatcher],
    pub actions: &'static [CommandAction],
    check: GateCheck,
}

/// Ordered gate table. Every matching rule must allow the command.
pub struct GatingLayer {
    rules: Vec<GateRule>,
}

impl GatingLayer {
    pub fn standard() -> Self {
        Self {
            rules: vec![GateRule {
                name: "realm-breakthrough",
                matchers: &[
                    PathMatcher::Exact(paths::PLAYER),
                    PathMatcher::Exact(paths::PLAYER_REALM),
                    PathMatcher::Exact(paths::PLAYER_REALM_NAME),
                ],
                actions: &[CommandAction::Set],
                check: realm_breakthrough,
            }],
        }
    }

    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn check(&self, state: &SaveState, command: &ValidatedCommand) -> Result<(), GatingViolation> {
        for rule in &self.rules {
            if !rule.actions.contains(&command.action) || !any_match(rule.matchers, &command.path) {
                continue;
            }
            (rule.check)(state, command).map_err(|reason| GatingViolation {
                rule: rule.name,
                path: command.path.to_string(),
                reason,
            })?;
        }
        Ok(())
    }
}

impl Default for GatingLayer {
    fn default() -> Self {
        Self::standard()
    }
}

/// Minor stage changes and demotions pass. A higher tier needs the
/// tribulation marker. An unknown realm name that differs from the current
/// one is refused.
fn realm_breakthrough(state: &SaveState, command: &ValidatedCommand) -> Result<(), String> {
    let Some(target_name) = command.realm_name() else {
        return Ok(());
    };

    let current_name = state
        .get_at(paths::PLAYER_REALM_NAME)
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    if target_name.trim() == current_name.trim() {
        return Ok(());
    }

    let Some(target) = RealmTier::from_name(target_name) else {
        return Err(format!("unknown realm `{target_name}`"));
    };
    let current = state.realm_tier().unwrap_or(RealmTier::Mortal);

    if target > current && !state.tribulation_passed() {
        return Err(format!(
            "advancing from {current} to {target} requires passing the tribulation"
        ));
    }
    Ok(())
}
