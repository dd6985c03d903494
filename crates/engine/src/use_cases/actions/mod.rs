//! Direct-manipulation actions and their undo queue.

pub mod error;
pub mod manager;
pub mod undo;

pub use error::ActionError;
pub use manager::{ActionOutcome, ActionQueueManager, ActionStatus, PendingAction, DEFAULT_QUEUE_CAP};
pub use undo::{RestoreData, UndoAction};
