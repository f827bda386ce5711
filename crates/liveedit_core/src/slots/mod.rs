//! Marker-delimited slots inside source documents.
//!
//! A slot is the text between a start and an end comment token. The locator
//! finds it, the renderer produces its replacement literal, and the applier
//! splices a batch of replacements into a document in order.

mod apply;
mod marker;
mod value;

pub use apply::{apply, read_slots, Assignment, PatchOutcome, SlotRequirement};
pub use marker::{locate, MarkerPair, Span};
pub use value::{format_scale, render, round_int, Position, SlotValue, Transform};
