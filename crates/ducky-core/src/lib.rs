//! # ducky-core
//!
//! Shared library for the Ducky HID bridge: keyboard layout tables, the macro
//! data model, and the MCP wire protocol.
//!
//! It has no dependencies on sockets, files, clocks or HID devices; those live
//! in `ducky-server`.
//!
//! # Architecture overview (for beginners)
//!
//! The bridge receives JSON-RPC "tool calls" (type this text, press Ctrl+C,
//! move the mouse) and turns them into USB HID keyboard and mouse reports for
//! a host computer.  It can also record such actions as a *macro* and replay
//! them later with the original timing.
//!
//! - **`keymap`** – HID usage IDs, the modifier bitmask, and the per-locale
//!   translator that answers "which key and modifiers make the host type
//!   this character?".  Also the key-name and shortcut parsers.
//!
//! - **`macros`** – The timestamped action list and its JSON document form,
//!   shared by on-disk storage and export/import.
//!
//! - **`protocol`** – JSON-RPC envelopes, method names, and the seven-tool
//!   catalog returned by `tools/list`.

pub mod keymap;
pub mod macros;
pub mod protocol;

pub use keymap::{
    convert_string, parse_shortcut, resolve_key, translate, HidKeyCode, KeyCode, KeyTarget,
    KeyboardLayout, Modifiers, Shortcut,
};
pub use macros::{ActionKind, DocumentError, Macro, MacroAction, MouseButton};
pub use protocol::{Method, Request, Response, Tool};
