//! One character session: the single owner of its save tree.
//!
//! Every mutation source (narrative turns and panel actions) goes through
//! the session mutex. A turn holds the lock for the whole exchange, including
//! the generation call, so panel actions issued meanwhile wait for it.

use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tianji_domain::{paths, ChangeLogEntry, SaveState, SessionId};
use tianji_shared::{DisplayEvent, QueueEntry};
use tokio::sync::Mutex;

use crate::infrastructure::ports::{
    ClockPort, DisplayPort, GenerationOptions, PersistenceError, SaveStorePort,
};
use crate::infrastructure::settings::EngineConfig;
use crate::use_cases::actions::{ActionError, ActionOutcome, ActionQueueManager};
use crate::use_cases::narrative::{ConverseError, ConverseOptions, NarrativeOrchestrator, TurnOutcome};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Converse(#[from] ConverseError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Action(#[from] ActionError),

    /// The turn went through but the autosave did not
    #[error("turn applied but autosave failed: {source}")]
    AutosaveFailed {
        outcome: Box<TurnOutcome>,
        source: PersistenceError,
    },
}

/// Per-session bookkeeping limits.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub short_term_memory_cap: usize,
    pub changelog_history_cap: usize,
    pub changelog_history_keep: usize,
    pub autosave_after_turn: bool,
    pub action_queue_cap: usize,
}

impl From<&EngineConfig> for SessionSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            short_term_memory_cap: config.short_term_memory_cap,
            changelog_history_cap: config.changelog_history_cap,
            changelog_history_keep: config.changelog_history_keep,
            autosave_after_turn: config.autosave_after_turn,
            action_queue_cap: config.action_queue_cap,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

struct SessionInner {
    state: SaveState,
    actions: ActionQueueManager,
    history: VecDeque<Vec<ChangeLogEntry>>,
}

pub struct GameSession {
    id: SessionId,
    inner: Mutex<SessionInner>,
    orchestrator: Arc<NarrativeOrchestrator>,
    store: Arc<dyn SaveStorePort>,
    display: Arc<dyn DisplayPort>,
    settings: SessionSettings,
}

impl GameSession {
    pub fn new(
        id: SessionId,
        state: SaveState,
        orchestrator: Arc<NarrativeOrchestrator>,
        store: Arc<dyn SaveStorePort>,
        display: Arc<dyn DisplayPort>,
        clock: Arc<dyn ClockPort>,
        settings: SessionSettings,
    ) -> Self {
        let actions = ActionQueueManager::new(settings.action_queue_cap, display.clone(), clock);
        Self {
            id,
            inner: Mutex::new(SessionInner {
                state,
                actions,
                history: VecDeque::new(),
            }),
            orchestrator,
            store,
            display,
            settings,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub async fn snapshot(&self) -> SaveState {
        self.inner.lock().await.state.clone()
    }

    pub async fn pending_actions(&self) -> Vec<QueueEntry> {
        self.inner.lock().await.actions.pending().map(|p| p.entry.clone()).collect()
    }

    /// Turn changelogs, oldest first.
    pub async fn history(&self) -> Vec<Vec<ChangeLogEntry>> {
        self.inner.lock().await.history.iter().cloned().collect()
    }

    // =========================================================================
    // Narrative
    // =========================================================================

    /// Run one narrative turn. Pending panel actions are handed to the
    /// generation service and, once the turn is usable, cleared along with
    /// their undo records.
    pub async fn converse(
        &self,
        input: &str,
        generation: GenerationOptions,
    ) -> Result<TurnOutcome, SessionError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        let options = ConverseOptions {
            pending_actions: inner.actions.pending_descriptions(),
            generation,
        };
        let outcome = self
            .orchestrator
            .converse(input, &mut inner.state, &options)
            .await?;

        remember_turn(&mut inner.state, &outcome, self.settings.short_term_memory_cap);
        inner.actions.clear_pending();
        self.record_history(&mut inner.history, outcome.changelog.clone());
        self.display.notify(DisplayEvent::Changelog {
            entries: outcome.changelog.clone(),
        });

        if self.settings.autosave_after_turn {
            if let Err(source) = self.store.save(self.id, &inner.state).await {
                tracing::error!(session = %self.id, error = %source, "Autosave failed");
                return Err(SessionError::AutosaveFailed {
                    outcome: Box::new(outcome),
                    source,
                });
            }
            tracing::debug!(session = %self.id, "Autosaved after turn");
        }
        Ok(outcome)
    }

    fn record_history(&self, history: &mut VecDeque<Vec<ChangeLogEntry>>, changelog: Vec<ChangeLogEntry>) {
        history.push_back(changelog);
        if history.len() > self.settings.changelog_history_cap {
            let keep = self.settings.changelog_history_keep.min(self.settings.changelog_history_cap);
            let excess = history.len().saturating_sub(keep);
            history.drain(..excess);
            tracing::debug!(kept = history.len(), "Changelog history trimmed");
        }
    }

    // =========================================================================
    // Panel actions
    // =========================================================================

    pub async fn equip(&self, item_id: &str) -> Result<ActionOutcome, SessionError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        let outcome = inner.actions.equip(&mut inner.state, item_id)?;
        Ok(self.announce(outcome))
    }

    pub async fn unequip(&self, item_id: &str) -> Result<ActionOutcome, SessionError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        let outcome = inner.actions.unequip(&mut inner.state, item_id)?;
        Ok(self.announce(outcome))
    }

    pub async fn use_item(&self, item_id: &str, quantity: u32) -> Result<ActionOutcome, SessionError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        let outcome = inner.actions.use_item(&mut inner.state, item_id, quantity)?;
        Ok(self.announce(outcome))
    }

    pub async fn cultivate(&self, item_id: &str) -> Result<ActionOutcome, SessionError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        let outcome = inner.actions.cultivate(&mut inner.state, item_id)?;
        Ok(self.announce(outcome))
    }

    pub async fn stop_cultivation(&self, item_id: &str) -> Result<ActionOutcome, SessionError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        let outcome = inner.actions.stop_cultivation(&mut inner.state, item_id)?;
        Ok(self.announce(outcome))
    }

    pub async fn undo_last(&self) -> Result<ActionOutcome, SessionError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        let outcome = inner.actions.undo_last(&mut inner.state)?;
        Ok(self.announce(outcome))
    }

    fn announce(&self, outcome: ActionOutcome) -> ActionOutcome {
        if !outcome.changelog.is_empty() {
            self.display.notify(DisplayEvent::Changelog {
                entries: outcome.changelog.clone(),
            });
        }
        outcome
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    pub async fn save(&self) -> Result<(), SessionError> {
        let guard = self.inner.lock().await;
        self.store.save(self.id, &guard.state).await?;
        tracing::info!(session = %self.id, "Session saved");
        Ok(())
    }
}

/// Push the narrative onto short-term memory (bounded) and the summary, if
/// any, onto mid-term memory. Both entries carry the game-time stamp.
fn remember_turn(state: &mut SaveState, outcome: &TurnOutcome, short_term_cap: usize) {
    let stamp = state.game_time().stamp();

    append_memory(state, paths::MEMORY_SHORT_TERM, format!("{stamp} {}", outcome.narrative), Some(short_term_cap));
    if let Some(summary) = outcome.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        append_memory(state, paths::MEMORY_MID_TERM, format!("{stamp} {summary}"), None);
    }
}

fn append_memory(state: &mut SaveState, path: &str, entry: String, cap: Option<usize>) {
    let mut entries = match state.get_at(path) {
        Some(Value::Array(entries)) => entries.clone(),
        _ => Vec::new(),
    };
    entries.push(Value::String(entry));
    if let Some(cap) = cap {
        let excess = entries.len().saturating_sub(cap);
        entries.drain(..excess);
    }
    if let Err(e) = state.set_at(path, Value::Array(entries)) {
        tracing::warn!(path, error = %e, "Could not record turn memory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::memory_store::InMemorySaveStore;
    use crate::infrastructure::ports::{
        GenerationError, GenerationPort, GenerationRequest, MockRetryDecisionPort,
        MockSaveStorePort, RawResponse, RetryChoice,
    };
    use crate::test_fixtures::{seeded_state, RecordingDisplay, ScriptedGeneration};
    use crate::use_cases::commands::CommandEngine;
    use crate::use_cases::narrative::RetryPolicy;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;
    use tianji_domain::{Item, QualityTier};

    const TURN: &str = r#"{"text": "You rest by the spring.", "mid_term_summary": "Rested",
        "commands": [{"action": "add", "key": "gameTime.minute", "value": 30}]}"#;

    fn orchestrator(generation: Arc<dyn GenerationPort>) -> Arc<NarrativeOrchestrator> {
        let mut decision = MockRetryDecisionPort::new();
        decision.expect_ask().returning(|_| RetryChoice::Abort);
        Arc::new(NarrativeOrchestrator::new(
            generation,
            Arc::new(decision),
            CommandEngine::default(),
            RetryPolicy {
                max_auto_attempts: 1,
                base_delay: Duration::ZERO,
                jitter_factor: 0.0,
            },
            QualityTier::Heavenly,
        ))
    }

    fn session_with(
        generation: Arc<dyn GenerationPort>,
        store: Arc<dyn SaveStorePort>,
        settings: SessionSettings,
    ) -> (GameSession, Arc<RecordingDisplay>) {
        let display = Arc::new(RecordingDisplay::default());
        let mut state = seeded_state();
        state
            .put_item(
                &Item::from_value(&json!({
                    "id": "sword", "name": "Jade Sword", "category": "equipment",
                    "quality": {"tier": "common", "grade": 4}, "quantity": 1, "description": ""
                }))
                .unwrap(),
            )
            .unwrap();
        let session = GameSession::new(
            SessionId::new(),
            state,
            orchestrator(generation),
            store,
            display.clone(),
            Arc::new(SystemClock),
            settings,
        );
        (session, display)
    }

    #[tokio::test]
    async fn usable_turn_updates_memory_and_hands_off_pending_actions() {
        let generation = Arc::new(ScriptedGeneration::text(&[TURN]));
        let store = Arc::new(InMemorySaveStore::new());
        let (session, display) = session_with(generation.clone(), store.clone(), SessionSettings::default());

        session.equip("sword").await.unwrap();
        assert_eq!(session.pending_actions().await.len(), 1);

        let outcome = session.converse("rest", GenerationOptions::default()).await.unwrap();

        assert_eq!(outcome.narrative, "You rest by the spring.");
        assert!(generation.requests()[0].user_prompt.contains("equip Jade Sword"));
        assert!(session.pending_actions().await.is_empty());
        assert!(matches!(session.undo_last().await, Err(SessionError::Action(ActionError::NothingToUndo))));

        let state = session.snapshot().await;
        assert_eq!(
            state.get_at("memory.shortTerm"),
            Some(&json!(["[Year 1000, Month 1, Day 1 08:30] You rest by the spring."]))
        );
        assert_eq!(state.get_at("memory.midTerm"), Some(&json!(["[Year 1000, Month 1, Day 1 08:30] Rested"])));

        assert_eq!(store.load(session.id()).await.unwrap(), state);
        assert!(display.events().iter().any(|e| matches!(e, DisplayEvent::QueueCleared)));
        assert!(matches!(display.events().last(), Some(DisplayEvent::Changelog { .. })));
    }

    #[tokio::test]
    async fn short_term_memory_is_bounded() {
        let generation = Arc::new(ScriptedGeneration::text(&[TURN, TURN, TURN]));
        let settings = SessionSettings {
            short_term_memory_cap: 2,
            ..SessionSettings::default()
        };
        let (session, _) = session_with(generation, Arc::new(InMemorySaveStore::new()), settings);

        for _ in 0..3 {
            session.converse("", GenerationOptions::default()).await.unwrap();
        }

        let state = session.snapshot().await;
        let short_term = state.get_at("memory.shortTerm").and_then(Value::as_array).unwrap();
        assert_eq!(short_term.len(), 2);
        assert!(short_term[1].as_str().unwrap().starts_with("[Year 1000, Month 1, Day 1 09:30]"));
    }

    #[tokio::test]
    async fn changelog_history_trims_to_the_keep_size() {
        let generation = Arc::new(ScriptedGeneration::text(&[TURN; 4]));
        let settings = SessionSettings {
            changelog_history_cap: 3,
            changelog_history_keep: 2,
            ..SessionSettings::default()
        };
        let (session, _) = session_with(generation, Arc::new(InMemorySaveStore::new()), settings);

        for _ in 0..4 {
            session.converse("", GenerationOptions::default()).await.unwrap();
        }

        assert_eq!(session.history().await.len(), 2);
    }

    #[tokio::test]
    async fn keep_size_above_the_cap_is_clamped_to_the_cap() {
        let generation = Arc::new(ScriptedGeneration::text(&[TURN; 4]));
        let settings = SessionSettings {
            changelog_history_cap: 2,
            changelog_history_keep: 5,
            ..SessionSettings::default()
        };
        let (session, _) = session_with(generation, Arc::new(InMemorySaveStore::new()), settings);

        for _ in 0..4 {
            session.converse("", GenerationOptions::default()).await.unwrap();
        }

        assert_eq!(session.history().await.len(), 2);
    }

    #[tokio::test]
    async fn failed_turn_leaves_state_and_queue_alone() {
        let generation = Arc::new(ScriptedGeneration::new([Err(GenerationError::RequestFailed(
            "offline".into(),
        ))]));
        let mut store = MockSaveStorePort::new();
        store.expect_save().never();
        let (session, _) = session_with(generation, Arc::new(store), SessionSettings::default());
        session.equip("sword").await.unwrap();
        let before = session.snapshot().await;

        let err = session.converse("rest", GenerationOptions::default()).await.unwrap_err();

        assert!(matches!(err, SessionError::Converse(ConverseError::RetryExhausted { .. })));
        assert_eq!(session.snapshot().await, before);
        assert_eq!(session.pending_actions().await.len(), 1);
    }

    #[tokio::test]
    async fn autosave_failure_keeps_the_turn() {
        let generation = Arc::new(ScriptedGeneration::text(&[TURN]));
        let mut store = MockSaveStorePort::new();
        store
            .expect_save()
            .times(1)
            .returning(|_, _| Err(PersistenceError::Unavailable("disk full".into())));
        let (session, _) = session_with(generation, Arc::new(store), SessionSettings::default());

        let err = session.converse("rest", GenerationOptions::default()).await.unwrap_err();

        let SessionError::AutosaveFailed { outcome, .. } = err else {
            panic!("expected autosave failure");
        };
        assert_eq!(outcome.narrative, "You rest by the spring.");
        assert_eq!(session.snapshot().await.game_time().minute, 30);
    }

    #[tokio::test]
    async fn autosave_can_be_disabled() {
        let generation = Arc::new(ScriptedGeneration::text(&[TURN]));
        let mut store = MockSaveStorePort::new();
        store.expect_save().never();
        let settings = SessionSettings {
            autosave_after_turn: false,
            ..SessionSettings::default()
        };
        let (session, _) = session_with(generation, Arc::new(store), settings);

        session.converse("rest", GenerationOptions::default()).await.unwrap();
    }

    /// Blocks inside `generate` until released.
    struct HeldGeneration {
        entered: tokio::sync::Notify,
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl GenerationPort for HeldGeneration {
        async fn generate(&self, _request: GenerationRequest) -> Result<RawResponse, GenerationError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(RawResponse::Text(TURN.into()))
        }
    }

    #[tokio::test]
    async fn panel_actions_wait_for_the_turn_in_flight() {
        let generation = Arc::new(HeldGeneration {
            entered: tokio::sync::Notify::new(),
            release: tokio::sync::Notify::new(),
        });
        let (session, _) = session_with(generation.clone(), Arc::new(InMemorySaveStore::new()), SessionSettings::default());
        let session = Arc::new(session);

        let turn = tokio::spawn({
            let session = session.clone();
            async move { session.converse("rest", GenerationOptions::default()).await }
        });
        generation.entered.notified().await;

        let equip = tokio::spawn({
            let session = session.clone();
            async move { session.equip("sword").await }
        });
        tokio::task::yield_now().await;
        assert!(!equip.is_finished());

        generation.release.notify_one();
        turn.await.unwrap().unwrap();
        equip.await.unwrap().unwrap();

        // The equip ran after the turn cleared the queue, so it is still pending.
        assert_eq!(session.pending_actions().await.len(), 1);
    }
}
