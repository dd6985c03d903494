//! The command pipeline: validate, gate, execute, recalculate.

pub mod error;
pub mod executor;
pub mod gating;
pub mod hooks;
pub mod matcher;
pub mod payload;
pub mod validator;

pub use error::ExecutionError;
pub use executor::{ApplyReport, CommandEngine, CommandExecutor, CommandOutcome, CommandReport};
pub use gating::{GatingLayer, GatingViolation};
pub use hooks::HookTable;
pub use payload::CommandPayload;
pub use validator::{CommandValidator, ValidatedCommand, ValidationRejected};
