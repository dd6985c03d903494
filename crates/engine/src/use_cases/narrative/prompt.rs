//! Prompt assembly for narrative turns.

use serde_json::Value;
use tianji_domain::{paths, QualityTier, RealmTier, SaveState};

/// Input used when the player just presses enter.
pub const CONTINUE_INPUT: &str = "Continue the current activity";

const ROLE_INSTRUCTIONS: &str = "You are the narrator of a xianxia cultivation world. \
Continue the story from the player's action, keeping every fact consistent with the save state.";

const RESPONSE_FORMAT: &str = r#"Reply with a single JSON object and nothing else:
{
  "text": "the narrative for this turn",
  "mid_term_summary": "one-sentence summary of what happened (optional)",
  "commands": [{"action": "set|add|push|delete|pull", "key": "dotted.path", "value": ...}]
}
Commands are the only way the save state changes. Use "add" on "gameTime.minute" to pass time."#;

/// Sub-trees the model never sees; they are fed back through the summary.
const HIDDEN_PATHS: &[&str] = &[paths::MEMORY_SHORT_TERM, paths::MEMORY_IMPLICIT_MID_TERM];

pub fn system_prompt(max_tier: QualityTier) -> String {
    let tiers: Vec<&str> = QualityTier::all()
        .iter()
        .filter(|t| **t <= max_tier)
        .map(QualityTier::as_str)
        .collect();
    let realms: Vec<&str> = RealmTier::all().iter().map(RealmTier::display_name).collect();

    format!(
        "{ROLE_INSTRUCTIONS}\n\n{RESPONSE_FORMAT}\n\n\
Items you create must have a quality tier among: {}.\n\
Realm tiers in order: {}. Advancing to a higher tier only succeeds after \
player.tribulationPassed has been set to true.",
        tiers.join(", "),
        realms.join(", ")
    )
}

/// The effective player input, with pending UI actions in front.
pub fn effective_input(input: &str, pending_actions: &[String]) -> String {
    let input = match input.trim() {
        "" => CONTINUE_INPUT,
        trimmed => trimmed,
    };
    if pending_actions.is_empty() {
        return input.to_string();
    }
    format!("[Actions already taken] {}\n{input}", pending_actions.join("; "))
}

/// Serialized save state, minus the hidden memory sub-trees.
pub fn state_context(state: &SaveState) -> String {
    let mut visible = state.clone();
    for path in HIDDEN_PATHS {
        visible.remove_at(path);
    }
    serde_json::to_string_pretty(visible.as_value()).unwrap_or_else(|_| Value::Null.to_string())
}

pub fn user_prompt(state: &SaveState, input: &str, pending_actions: &[String]) -> String {
    format!(
        "## Save state\n{}\n\n## Current time\n{}\n\n## Player\n{}",
        state_context(state),
        state.game_time(),
        effective_input(input, pending_actions)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_input_continues() {
        assert_eq!(effective_input("   ", &[]), CONTINUE_INPUT);
        assert_eq!(effective_input(" meditate ", &[]), "meditate");
    }

    #[test]
    fn pending_actions_come_first() {
        let input = effective_input("", &["equip Jade Sword".into(), "use 2 x Qi Pill".into()]);
        assert!(input.starts_with("[Actions already taken] equip Jade Sword; use 2 x Qi Pill"));
        assert!(input.ends_with(CONTINUE_INPUT));
    }

    #[test]
    fn short_term_and_implicit_memory_are_hidden() {
        let state = SaveState::from_value(json!({
            "memory": {"shortTerm": ["secret-short"], "midTerm": ["visible-mid"], "implicitMidTerm": ["secret-implicit"]}
        }))
        .unwrap();
        let context = state_context(&state);
        assert!(context.contains("visible-mid"));
        assert!(!context.contains("secret-short"));
        assert!(!context.contains("secret-implicit"));
    }

    #[test]
    fn tier_ceiling_limits_the_listed_qualities() {
        assert!(system_prompt(QualityTier::Mortal).contains("among: mortal."));
        let prompt = system_prompt(QualityTier::Earthly);
        assert!(prompt.contains("among: mortal, common, subtle, earthly."));
        assert!(!prompt.contains("heavenly"));
    }
}
