//! Recording HID sink.
//!
//! Captures every primitive in call order instead of touching hardware.
//! Used by the unit and integration tests, and usable as a stand-in sink when
//! exercising the protocol without a gadget.

use std::sync::Mutex;
use std::time::Duration;

use ducky_core::{Modifiers, MouseButton};

use crate::application::hid_sink::{HidError, HidSink};

/// One recorded call into the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HidCall {
    TypeText(String),
    PressKey { key: u8, modifiers: Modifiers },
    ReleaseKey { key: u8 },
    KeyStroke { key: String, modifiers: String },
    MoveMouse { x: i16, y: i16, relative: bool },
    ClickMouse { button: MouseButton, duration: Duration },
    ScrollMouse { amount: i8 },
}

/// A [`HidSink`] that records calls.
#[derive(Debug)]
pub struct MockHidSink {
    calls: Mutex<Vec<HidCall>>,
    should_fail: bool,
    ready: bool,
}

impl MockHidSink {
    /// A ready sink whose calls all succeed.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            should_fail: false,
            ready: true,
        }
    }

    /// A ready sink whose calls are recorded and then fail.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new()
        }
    }

    /// A sink that reports `is_ready() == false`.
    pub fn not_ready() -> Self {
        Self {
            ready: false,
            ..Self::new()
        }
    }

    /// Snapshot of the calls so far.
    pub fn calls(&self) -> Vec<HidCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn push(&self, call: HidCall) -> Result<(), HidError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if self.should_fail {
            Err(HidError::NotReady)
        } else {
            Ok(())
        }
    }
}

impl Default for MockHidSink {
    fn default() -> Self {
        Self::new()
    }
}

impl HidSink for MockHidSink {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn type_text(&self, text: &str) -> Result<(), HidError> {
        self.push(HidCall::TypeText(text.to_string()))
    }

    fn press_key(&self, key: u8, modifiers: Modifiers) -> Result<(), HidError> {
        self.push(HidCall::PressKey { key, modifiers })
    }

    fn release_key(&self, key: u8) -> Result<(), HidError> {
        self.push(HidCall::ReleaseKey { key })
    }

    fn send_key_stroke(&self, key_name: &str, modifiers: &str) -> Result<(), HidError> {
        self.push(HidCall::KeyStroke {
            key: key_name.to_string(),
            modifiers: modifiers.to_string(),
        })
    }

    fn move_mouse(&self, x: i16, y: i16, relative: bool) -> Result<(), HidError> {
        self.push(HidCall::MoveMouse { x, y, relative })
    }

    fn click_mouse(&self, button: MouseButton, duration: Duration) -> Result<(), HidError> {
        self.push(HidCall::ClickMouse { button, duration })
    }

    fn scroll_mouse(&self, amount: i8) -> Result<(), HidError> {
        self.push(HidCall::ScrollMouse { amount })
    }
}
