//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - The generation service (could swap Ollama -> any OpenAI-compatible host)
//! - Save persistence (in-memory today, a file or database later)
//! - The retry decision and UI display (terminal today)
//! - Clock (for testing)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tianji_domain::{SaveState, SessionId};
use tianji_shared::DisplayEvent;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("Generation request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PersistenceError {
    #[error("Save store unavailable: {0}")]
    Unavailable(String),
    #[error("No save found for session {0}")]
    NotFound(SessionId),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

// =============================================================================
// Generation Service
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// One call to the generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub options: GenerationOptions,
}

/// What came back: free text, or a record some hosts pre-parse for us.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    Text(String),
    Structured(Value),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationPort: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<RawResponse, GenerationError>;
}

// =============================================================================
// Retry Decision
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureSummary {
    pub attempts: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryChoice {
    Retry,
    Abort,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RetryDecisionPort: Send + Sync {
    /// Ask the user whether to keep trying after automatic retries ran out.
    async fn ask(&self, failure: &FailureSummary) -> RetryChoice;
}

// =============================================================================
// Save Persistence
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SaveStorePort: Send + Sync {
    async fn load(&self, session: SessionId) -> Result<SaveState, PersistenceError>;
    async fn save(&self, session: SessionId, state: &SaveState) -> Result<(), PersistenceError>;
}

// =============================================================================
// UI Display
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait DisplayPort: Send + Sync {
    fn notify(&self, event: DisplayEvent);
}

// =============================================================================
// Clock
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
