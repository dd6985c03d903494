//! Tianji Shared - wire shapes shared by the engine and its outer surfaces
//!
//! - `commands` - the `{action, key, value}` command shape produced by the generation service
//! - `envelope` - the response envelope the generation service is asked to return
//! - `events` - notifications pushed to the UI display
//!
//! No business logic lives here; conversion into domain types is the only
//! behavior these types carry.

pub mod commands;
pub mod envelope;
pub mod events;

pub use commands::WireCommand;
pub use envelope::GenerationEnvelope;
pub use events::{ActionKind, DisplayEvent, QueueEntry};
