//! Engine configuration read from the environment.
//!
//! `dotenvy` loads `.env` files before this runs (see `main.rs`). Every value
//! has a default; a value that is set but cannot be parsed falls back to the
//! default with a warning.

use std::str::FromStr;
use std::time::Duration;

use tianji_domain::QualityTier;

use crate::infrastructure::ollama::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use crate::use_cases::narrative::RetryPolicy;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub generation: GenerationSettings,
    pub retry: RetryPolicy,
    /// Bound of the undo stack and the pending-action display queue
    pub action_queue_cap: usize,
    /// Turn changelogs kept per session before trimming
    pub changelog_history_cap: usize,
    /// Turn changelogs left after a trim
    pub changelog_history_keep: usize,
    pub short_term_memory_cap: usize,
    pub autosave_after_turn: bool,
    /// Highest item quality the generation service is told it may create
    pub max_generated_tier: QualityTier,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            generation: GenerationSettings::default(),
            retry: RetryPolicy::default(),
            action_queue_cap: 40,
            changelog_history_cap: 50,
            changelog_history_keep: 30,
            short_term_memory_cap: 5,
            autosave_after_turn: true,
            max_generated_tier: QualityTier::Heavenly,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let base_url = read("GENERATION_BASE_URL")
            .or_else(|| read("OLLAMA_BASE_URL"))
            .unwrap_or(defaults.generation.base_url);
        let model = read("GENERATION_MODEL")
            .or_else(|| read("OLLAMA_MODEL"))
            .unwrap_or(defaults.generation.model);

        let max_generated_tier = match read("MAX_GENERATED_TIER") {
            Some(raw) => QualityTier::from_name(&raw).unwrap_or_else(|| {
                tracing::warn!(key = "MAX_GENERATED_TIER", value = %raw, "Unknown quality tier, using default");
                defaults.max_generated_tier
            }),
            None => defaults.max_generated_tier,
        };

        let retry = RetryPolicy {
            max_auto_attempts: parse_or(&read, "RETRY_MAX_AUTO", defaults.retry.max_auto_attempts)
                .max(1),
            base_delay: Duration::from_millis(parse_or(
                &read,
                "RETRY_BASE_DELAY_MS",
                defaults.retry.base_delay.as_millis() as u64,
            )),
            jitter_factor: parse_or(&read, "RETRY_JITTER", defaults.retry.jitter_factor)
                .clamp(0.0, 1.0),
        };

        let changelog_history_cap =
            parse_or(&read, "CHANGELOG_HISTORY_CAP", defaults.changelog_history_cap).max(1);

        Self {
            generation: GenerationSettings {
                base_url,
                model,
                timeout_secs: parse_or(&read, "GENERATION_TIMEOUT_SECS", defaults.generation.timeout_secs),
            },
            retry,
            action_queue_cap: parse_or(&read, "ACTION_QUEUE_CAP", defaults.action_queue_cap).max(1),
            changelog_history_cap,
            changelog_history_keep: defaults.changelog_history_keep.min(changelog_history_cap),
            short_term_memory_cap: parse_or(
                &read,
                "SHORT_TERM_MEMORY_CAP",
                defaults.short_term_memory_cap,
            ),
            autosave_after_turn: parse_or(&read, "AUTOSAVE_AFTER_TURN", defaults.autosave_after_turn),
            max_generated_tier,
        }
    }
}

fn parse_or<T>(read: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Debug,
{
    match read(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = ?default, "Unparseable setting, using default");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> EngineConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(config(&[]), EngineConfig::default());
    }

    #[test]
    fn ollama_variables_are_accepted_as_fallbacks() {
        let cfg = config(&[("OLLAMA_BASE_URL", "http://gpu-box:11434"), ("GENERATION_MODEL", "llama3.2")]);
        assert_eq!(cfg.generation.base_url, "http://gpu-box:11434");
        assert_eq!(cfg.generation.model, "llama3.2");
    }

    #[test]
    fn unparseable_values_fall_back() {
        let cfg = config(&[
            ("RETRY_MAX_AUTO", "lots"),
            ("ACTION_QUEUE_CAP", "12"),
            ("AUTOSAVE_AFTER_TURN", "false"),
            ("MAX_GENERATED_TIER", "earthly"),
        ]);
        assert_eq!(cfg.retry.max_auto_attempts, RetryPolicy::default().max_auto_attempts);
        assert_eq!(cfg.action_queue_cap, 12);
        assert!(!cfg.autosave_after_turn);
        assert_eq!(cfg.max_generated_tier, QualityTier::Earthly);
    }

    #[test]
    fn retry_delay_is_read_in_milliseconds() {
        let cfg = config(&[("RETRY_BASE_DELAY_MS", "250"), ("RETRY_JITTER", "3.5")]);
        assert_eq!(cfg.retry.base_delay, Duration::from_millis(250));
        assert_eq!(cfg.retry.jitter_factor, 1.0);
    }
}
