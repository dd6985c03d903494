//! Narrative turns against the external generation service.

pub mod orchestrator;
pub mod prompt;
pub mod response_parser;
pub mod retry;

pub use orchestrator::{ConverseError, ConverseOptions, NarrativeOrchestrator, TurnOutcome};
pub use response_parser::{parse_response, ParsedResponse, ResponseFormat};
pub use retry::{RetryMachine, RetryPolicy, RetryState};
