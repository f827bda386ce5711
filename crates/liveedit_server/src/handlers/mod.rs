//! HTTP request handlers.

/// Live-edit action endpoints.
pub mod actions;
pub(crate) mod auth;
/// Read-only slot and view endpoints.
pub mod slots;
