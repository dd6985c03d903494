//! Hand-written fakes for stateful collaborators, shared by unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use tianji_domain::{NewCharacter, SaveState, SixAttributes};
use tianji_shared::DisplayEvent;

use crate::infrastructure::ports::{
    DisplayPort, GenerationError, GenerationPort, GenerationRequest, RawResponse,
};

/// Replays a fixed script of generation results and records every request.
#[derive(Default)]
pub struct ScriptedGeneration {
    script: Mutex<VecDeque<Result<RawResponse, GenerationError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGeneration {
    pub fn new(script: impl IntoIterator<Item = Result<RawResponse, GenerationError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn text(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(RawResponse::Text((*r).to_string()))))
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationPort for ScriptedGeneration {
    async fn generate(&self, request: GenerationRequest) -> Result<RawResponse, GenerationError> {
        self.requests.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::RequestFailed("script exhausted".into())))
    }
}

/// Collects display notifications.
#[derive(Default)]
pub struct RecordingDisplay {
    events: Mutex<Vec<DisplayEvent>>,
}

impl RecordingDisplay {
    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl DisplayPort for RecordingDisplay {
    fn notify(&self, event: DisplayEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// A freshly seeded character with average attributes.
pub fn seeded_state() -> SaveState {
    SaveState::new_character(&NewCharacter::new(
        "Lin Feng",
        "male",
        16,
        SixAttributes::new(5, 5, 5, 5, 5, 5),
    ))
}
