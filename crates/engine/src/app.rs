//! Application state and composition.

use std::sync::Arc;

use tianji_domain::{NewCharacter, SaveState, SessionId};

use crate::infrastructure::{
    ports::{ClockPort, DisplayPort, GenerationPort, RetryDecisionPort, SaveStorePort},
    settings::EngineConfig,
};
use crate::use_cases::commands::CommandEngine;
use crate::use_cases::narrative::NarrativeOrchestrator;
use crate::use_cases::{GameSession, SessionError, SessionSettings};

/// Main application state.
///
/// Holds the shared orchestrator and the adapters every session is wired to.
pub struct App {
    pub config: EngineConfig,
    pub orchestrator: Arc<NarrativeOrchestrator>,
    pub store: Arc<dyn SaveStorePort>,
    pub display: Arc<dyn DisplayPort>,
    pub clock: Arc<dyn ClockPort>,
}

impl App {
    pub fn new(
        config: EngineConfig,
        generation: Arc<dyn GenerationPort>,
        retry_decision: Arc<dyn RetryDecisionPort>,
        display: Arc<dyn DisplayPort>,
        store: Arc<dyn SaveStorePort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        let orchestrator = Arc::new(NarrativeOrchestrator::new(
            generation,
            retry_decision,
            CommandEngine::default(),
            config.retry.clone(),
            config.max_generated_tier,
        ));

        Self {
            config,
            orchestrator,
            store,
            display,
            clock,
        }
    }

    /// Open a session. With a character, a fresh tree is seeded and saved;
    /// without one, the last save for `id` is loaded.
    pub async fn open_session(
        &self,
        id: SessionId,
        character: Option<NewCharacter>,
    ) -> Result<GameSession, SessionError> {
        let state = match character {
            Some(character) => {
                let state = SaveState::new_character(&character);
                self.store.save(id, &state).await?;
                tracing::info!(session = %id, name = %character.name, "New character seeded");
                state
            }
            None => {
                let state = self.store.load(id).await?;
                tracing::info!(session = %id, "Save loaded");
                state
            }
        };

        Ok(GameSession::new(
            id,
            state,
            self.orchestrator.clone(),
            self.store.clone(),
            self.display.clone(),
            self.clock.clone(),
            SessionSettings::from(&self.config),
        ))
    }
}
