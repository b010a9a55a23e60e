//! The HID Sink port: primitive keyboard and mouse actions.
//!
//! The dispatcher (direct tool calls) and the macro engine (playback) both
//! drive the host exclusively through this trait.  Implementations live in
//! `infrastructure::hid_sink`: a USB boot-report encoder for real hardware
//! and a recording mock for tests.
//!
//! Some primitives take real time on the wire (a key stroke is held for a
//! few tens of milliseconds, a click for its `duration`).  That pacing is the
//! implementation's concern; callers only see a completed `Result`.

use std::time::Duration;

use ducky_core::{Modifiers, MouseButton};
use thiserror::Error;

/// Error type for HID sink operations.
#[derive(Debug, Error)]
pub enum HidError {
    #[error("HID device not ready")]
    NotReady,
    #[error("Unknown key: {0}")]
    UnknownKey(String),
    #[error("unsupported HID operation: {0}")]
    Unsupported(&'static str),
    #[error("HID report write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability set of a keyboard + mouse HID device.
pub trait HidSink: Send + Sync {
    /// `true` once the underlying device can accept reports.
    fn is_ready(&self) -> bool;

    /// Types `text` character by character using the sink's keyboard layout.
    fn type_text(&self, text: &str) -> Result<(), HidError>;

    /// Holds down `key` (a HID usage) together with `modifiers`.
    fn press_key(&self, key: u8, modifiers: Modifiers) -> Result<(), HidError>;

    /// Releases `key`.  Modifiers are released with the last held key.
    fn release_key(&self, key: u8) -> Result<(), HidError>;

    /// Presses and releases a named key (`"Enter"`, `"F5"`, `"a"`) while
    /// holding the modifiers named in `modifiers` (`"ctrl shift"`).
    fn send_key_stroke(&self, key_name: &str, modifiers: &str) -> Result<(), HidError>;

    /// Moves the pointer.  Only relative movement is supported.
    fn move_mouse(&self, x: i16, y: i16, relative: bool) -> Result<(), HidError>;

    /// Presses `button`, holds it for `duration`, and releases it.
    fn click_mouse(&self, button: MouseButton, duration: Duration) -> Result<(), HidError>;

    /// Turns the wheel; positive is up.
    fn scroll_mouse(&self, amount: i8) -> Result<(), HidError>;
}
