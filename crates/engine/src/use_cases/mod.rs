//! Use cases - orchestration over the save tree.
//!
//! - `commands` - validate, gate and execute mutation commands, then run derived hooks
//! - `derived` - recalculations shared by hooks and panel actions
//! - `narrative` - prompt building, response parsing and the retrying turn loop
//! - `actions` - panel actions with an undo stack and the pending-action queue
//! - `session` - the per-session owner that serializes every mutation source

pub mod actions;
pub mod commands;
pub mod derived;
pub mod narrative;
pub mod session;

pub use session::{GameSession, SessionError, SessionSettings};
