//! Narrative turn orchestration.
//!
//! One turn: build the prompt, call the generation service, parse the reply,
//! validate its commands, and apply them once the reply is usable. Unusable
//! replies go through the retry state machine.

use std::sync::Arc;

use thiserror::Error;
use tianji_domain::{ChangeLogEntry, Command, QualityTier, SaveState};
use tianji_shared::WireCommand;

use super::prompt;
use super::response_parser::{parse_response, ParsedResponse};
use super::retry::{NextStep, RetryMachine, RetryPolicy};
use crate::infrastructure::ports::{
    GenerationOptions, GenerationPort, GenerationRequest, RetryDecisionPort,
};
use crate::use_cases::commands::{ApplyReport, CommandEngine, ValidatedCommand, ValidationRejected};

#[derive(Debug, Error)]
pub enum ConverseError {
    #[error("generation gave up after {attempts} attempts: {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },
}

#[derive(Debug, Clone, Default)]
pub struct ConverseOptions {
    /// Descriptions of UI actions taken since the last turn
    pub pending_actions: Vec<String>,
    pub generation: GenerationOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub narrative: String,
    pub summary: Option<String>,
    pub changelog: Vec<ChangeLogEntry>,
    pub report: ApplyReport,
    pub attempts: u32,
}

/// A reply that passed the usability checks, with its commands validated.
struct UsableReply {
    text: String,
    summary: Option<String>,
    validated: Vec<Result<ValidatedCommand, ValidationRejected>>,
}

pub struct NarrativeOrchestrator {
    generation: Arc<dyn GenerationPort>,
    retry_decision: Arc<dyn RetryDecisionPort>,
    engine: CommandEngine,
    policy: RetryPolicy,
    max_generated_tier: QualityTier,
}

impl NarrativeOrchestrator {
    pub fn new(
        generation: Arc<dyn GenerationPort>,
        retry_decision: Arc<dyn RetryDecisionPort>,
        engine: CommandEngine,
        policy: RetryPolicy,
        max_generated_tier: QualityTier,
    ) -> Self {
        Self {
            generation,
            retry_decision,
            engine,
            policy,
            max_generated_tier,
        }
    }

    pub fn engine(&self) -> &CommandEngine {
        &self.engine
    }

    /// Run one narrative turn against `state`. The state changes only when a
    /// usable reply arrives.
    pub async fn converse(
        &self,
        input: &str,
        state: &mut SaveState,
        options: &ConverseOptions,
    ) -> Result<TurnOutcome, ConverseError> {
        let request = GenerationRequest {
            system_prompt: prompt::system_prompt(self.max_generated_tier),
            user_prompt: prompt::user_prompt(state, input, &options.pending_actions),
            options: options.generation.clone(),
        };
        let mut machine = RetryMachine::new(self.policy.clone());

        loop {
            let failure = match self.generation.generate(request.clone()).await {
                Err(e) => e.to_string(),
                Ok(raw) => match self.assess(parse_response(&raw)) {
                    Ok(reply) => {
                        let report = self.engine.apply_validated(reply.validated, state);
                        tracing::info!(
                            attempts = machine.total_attempts(),
                            applied = report.applied(),
                            rejected = report.rejected(),
                            gated = report.gated(),
                            "Narrative turn complete"
                        );
                        return Ok(TurnOutcome {
                            narrative: reply.text,
                            summary: reply.summary,
                            changelog: report.changelog.clone(),
                            report,
                            attempts: machine.total_attempts(),
                        });
                    }
                    Err(reason) => reason,
                },
            };

            match machine.record_failure(failure.clone()) {
                NextStep::RetryAfter(delay) => {
                    tracing::warn!(
                        attempt = machine.total_attempts(),
                        delay_ms = delay.as_millis() as u64,
                        error = %failure,
                        "Unusable generation response, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    machine.begin_attempt();
                }
                NextStep::AskUser(summary) => {
                    let choice = self.retry_decision.ask(&summary).await;
                    if machine.resolve(choice) {
                        tracing::info!(attempts = summary.attempts, "User asked for another round of retries");
                        machine.begin_attempt();
                    } else {
                        tracing::warn!(attempts = summary.attempts, error = %summary.reason, "Narrative turn aborted");
                        return Err(ConverseError::RetryExhausted {
                            attempts: summary.attempts,
                            last_error: summary.reason,
                        });
                    }
                }
            }
        }
    }

    /// A reply is unusable when its narrative is empty or every command it
    /// carries fails validation.
    fn assess(&self, parsed: ParsedResponse) -> Result<UsableReply, String> {
        if parsed.text.trim().is_empty() {
            return Err("empty narrative".to_string());
        }

        let validated: Vec<_> = parsed.commands.into_iter().map(|wire| self.validate(wire)).collect();
        if !validated.is_empty() && validated.iter().all(Result::is_err) {
            return Err(format!("all {} commands were rejected", validated.len()));
        }

        Ok(UsableReply {
            text: parsed.text,
            summary: parsed.summary,
            validated,
        })
    }

    fn validate(&self, wire: WireCommand) -> Result<ValidatedCommand, ValidationRejected> {
        let label = format!("{} {}", wire.action, wire.key);
        let command = Command::try_from(wire).map_err(|e| ValidationRejected {
            command: label,
            errors: vec![e.to_string()],
        })?;
        self.engine.validate(&command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{
        FailureSummary, GenerationError, MockGenerationPort, MockRetryDecisionPort, RawResponse,
        RetryChoice,
    };
    use crate::test_fixtures::{seeded_state, ScriptedGeneration};
    use mockall::predicate::*;
    use serde_json::json;
    use std::time::Duration;

    fn fast_policy(max: u32) -> RetryPolicy {
        RetryPolicy {
            max_auto_attempts: max,
            base_delay: Duration::ZERO,
            jitter_factor: 0.0,
        }
    }

    fn orchestrator(
        generation: Arc<dyn GenerationPort>,
        decision: MockRetryDecisionPort,
        max: u32,
    ) -> NarrativeOrchestrator {
        NarrativeOrchestrator::new(
            generation,
            Arc::new(decision),
            CommandEngine::default(),
            fast_policy(max),
            QualityTier::Heavenly,
        )
    }

    const GOOD: &str = r#"{"text": "An hour passes in meditation.", "mid_term_summary": "Meditated",
        "commands": [{"action": "add", "key": "gameTime.minute", "value": 60}]}"#;

    #[tokio::test]
    async fn usable_reply_is_applied() {
        let generation = Arc::new(ScriptedGeneration::text(&[GOOD]));
        let mut decision = MockRetryDecisionPort::new();
        decision.expect_ask().never();
        let orch = orchestrator(generation.clone(), decision, 3);
        let mut state = seeded_state();

        let outcome = orch
            .converse("meditate", &mut state, &ConverseOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.narrative, "An hour passes in meditation.");
        assert_eq!(outcome.summary.as_deref(), Some("Meditated"));
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.changelog.len(), 1);
        assert_eq!(state.game_time().hour, 9);
        assert!(generation.requests()[0].user_prompt.ends_with("meditate"));
    }

    #[tokio::test]
    async fn empty_and_all_rejected_replies_are_retried() {
        let generation = Arc::new(ScriptedGeneration::text(&[
            r#"{"text": "   "}"#,
            r#"{"text": "Nothing", "commands": [{"action": "set", "key": "player.location", "value": 1}]}"#,
            GOOD,
        ]));
        let mut decision = MockRetryDecisionPort::new();
        decision.expect_ask().never();
        let orch = orchestrator(generation.clone(), decision, 3);
        let mut state = seeded_state();
        let before = state.clone();

        let outcome = orch.converse("", &mut state, &ConverseOptions::default()).await.unwrap();

        assert_eq!(outcome.attempts, 3);
        assert_eq!(generation.requests().len(), 3);
        assert_ne!(state, before);
    }

    #[tokio::test]
    async fn abort_after_the_bound_is_retry_exhausted() {
        let mut generation = MockGenerationPort::new();
        generation
            .expect_generate()
            .times(2)
            .returning(|_| Err(GenerationError::RequestFailed("connection refused".into())));
        let mut decision = MockRetryDecisionPort::new();
        decision
            .expect_ask()
            .with(eq(FailureSummary {
                attempts: 2,
                reason: "Generation request failed: connection refused".into(),
            }))
            .times(1)
            .returning(|_| RetryChoice::Abort);
        let orch = orchestrator(Arc::new(generation), decision, 2);
        let mut state = seeded_state();
        let before = state.clone();

        let err = orch
            .converse("look around", &mut state, &ConverseOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ConverseError::RetryExhausted { attempts: 2, .. }));
        assert_eq!(state, before);
    }

    #[tokio::test]
    async fn user_retry_starts_a_new_round() {
        let generation = Arc::new(ScriptedGeneration::new([
            Err(GenerationError::InvalidResponse("garbled".into())),
            Ok(RawResponse::Text(GOOD.into())),
        ]));
        let mut decision = MockRetryDecisionPort::new();
        decision.expect_ask().times(1).returning(|_| RetryChoice::Retry);
        let orch = orchestrator(generation, decision, 1);
        let mut state = seeded_state();

        let outcome = orch.converse("wait", &mut state, &ConverseOptions::default()).await.unwrap();
        assert_eq!(outcome.attempts, 2);
    }

    #[tokio::test]
    async fn malformed_reply_is_narrative_only() {
        let generation = Arc::new(ScriptedGeneration::text(&[r#"Some chatter { "text": "hi", "commands": [}"#]));
        let orch = orchestrator(generation, MockRetryDecisionPort::new(), 3);
        let mut state = seeded_state();
        let before = state.clone();

        let outcome = orch.converse("hello", &mut state, &ConverseOptions::default()).await.unwrap();

        assert_eq!(outcome.narrative, r#"Some chatter { "text": "hi", "commands": [}"#);
        assert!(outcome.changelog.is_empty());
        assert_eq!(state, before);
    }

    #[tokio::test]
    async fn partially_rejected_batches_keep_the_valid_commands() {
        let reply = json!({
            "text": "You find a pill and lose track of time.",
            "commands": [
                {"action": "teleport", "key": "player.location"},
                {"action": "add", "key": "gameTime.minute", "value": 30}
            ]
        })
        .to_string();
        let generation = Arc::new(ScriptedGeneration::text(&[&reply]));
        let orch = orchestrator(generation, MockRetryDecisionPort::new(), 3);
        let mut state = seeded_state();

        let outcome = orch.converse("search", &mut state, &ConverseOptions::default()).await.unwrap();

        assert_eq!(outcome.report.rejected(), 1);
        assert_eq!(outcome.report.applied(), 1);
    }

    #[tokio::test]
    async fn pending_actions_reach_the_prompt() {
        let generation = Arc::new(ScriptedGeneration::text(&[GOOD]));
        let orch = orchestrator(generation.clone(), MockRetryDecisionPort::new(), 3);
        let mut state = seeded_state();
        let options = ConverseOptions {
            pending_actions: vec!["equip Jade Sword".into()],
            ..Default::default()
        };

        orch.converse("", &mut state, &options).await.unwrap();

        let prompt = &generation.requests()[0].user_prompt;
        assert!(prompt.contains("[Actions already taken] equip Jade Sword"));
        assert!(prompt.ends_with(prompt::CONTINUE_INPUT));
    }
}
