//! Core library for LiveEdit (slots, persistence, actions, edit sessions).

/// Live-edit entry points and target documents.
pub mod actions;
/// Configuration loading and defaults.
pub mod config;
/// Shared constants (ports, env names, messages).
pub mod constants;
/// Application error types.
pub mod error;
/// Route invalidation after saves.
pub mod invalidate;
/// Request and response payloads.
pub mod models;
/// Local and GitHub document storage.
pub mod persist;
/// Client-side edit session state machine.
pub mod session;
/// Marker location, literal rendering and patch application.
pub mod slots;
/// String helpers shared by slots and config.
pub mod text;

#[cfg(test)]
mod test_support;

pub use actions::{ActionOutcome, EditTarget, SlotEditor};
pub use config::Config;
pub use constants::DEFAULT_PORT;
pub use error::{AppError, ErrorClass};
pub use invalidate::ViewInvalidator;
pub use models::PatchResult;
pub use persist::{BackendKind, Persistence};
pub use session::{EditSession, SessionError, SessionState, SlotKey};
