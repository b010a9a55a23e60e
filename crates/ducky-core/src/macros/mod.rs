//! Macro data model: timestamped actions, the named [`Macro`], and the JSON
//! document used for storage and export/import.
//!
//! The recorder/player state machine that produces and consumes these types
//! lives in the server crate; this module has no notion of time or I/O.

pub mod action;
pub mod document;

pub use action::{ActionKind, ActionRecord, MacroAction, MouseButton};
pub use document::{DocumentError, Macro};
