//! Tianji Engine library.
//!
//! Everything that touches a character's save tree at runtime.
//!
//! ## Structure
//!
//! - `use_cases/` - command engine, narrative turns, panel actions, sessions
//! - `infrastructure/` - port traits and their adapters (generation service, store, terminal)
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod use_cases;

/// Fakes shared by unit tests.
#[cfg(test)]
mod test_fixtures;

pub use app::App;
