//! Timestamped HID primitives that make up a macro.
//!
//! In memory each action is a sum type with one case per primitive, each case
//! carrying only its own fields.  On disk (and in exported strings) the same
//! action is a flat JSON object with an integer `type` code:
//!
//! | `type` | Action      | Fields               |
//! |--------|-------------|----------------------|
//! | 0      | KeyPress    | `modifiers`, `key`   |
//! | 1      | KeyRelease  | `modifiers`, `key`   |
//! | 2      | MouseMove   | `x`, `y`             |
//! | 3      | MouseClick  | `button`             |
//! | 4      | MouseScroll | `amount`             |
//! | 5      | Delay       | `duration`           |
//!
//! The conversion between the two lives in [`ActionRecord`].

use serde::{Deserialize, Serialize};

use crate::keymap::Modifiers;

use super::document::DocumentError;

// ── Mouse buttons ─────────────────────────────────────────────────────────────

/// Mouse button, valued as its bit in a HID mouse report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum MouseButton {
    #[default]
    Left = 0x01,
    Right = 0x02,
    Middle = 0x04,
}

impl MouseButton {
    /// Maps a tool argument to a button.  Anything unrecognised is `Left`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "right" => MouseButton::Right,
            "middle" => MouseButton::Middle,
            _ => MouseButton::Left,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MouseButton {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(MouseButton::Left),
            0x02 => Ok(MouseButton::Right),
            0x04 => Ok(MouseButton::Middle),
            _ => Err(()),
        }
    }
}

// ── Actions ───────────────────────────────────────────────────────────────────

/// The primitive a [`MacroAction`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    KeyPress { modifiers: Modifiers, key: u8 },
    KeyRelease { key: u8 },
    MouseMove { x: i16, y: i16 },
    MouseClick { button: MouseButton },
    MouseScroll { amount: i8 },
    /// Pacing marker; playback performs no HID call for it.
    Delay { duration: u32 },
}

impl ActionKind {
    /// Integer code used in the persisted document.
    pub fn type_code(&self) -> u8 {
        match self {
            ActionKind::KeyPress { .. } => 0,
            ActionKind::KeyRelease { .. } => 1,
            ActionKind::MouseMove { .. } => 2,
            ActionKind::MouseClick { .. } => 3,
            ActionKind::MouseScroll { .. } => 4,
            ActionKind::Delay { .. } => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::KeyPress { .. } => "KeyPress",
            ActionKind::KeyRelease { .. } => "KeyRelease",
            ActionKind::MouseMove { .. } => "MouseMove",
            ActionKind::MouseClick { .. } => "MouseClick",
            ActionKind::MouseScroll { .. } => "MouseScroll",
            ActionKind::Delay { .. } => "Delay",
        }
    }
}

/// One step of a macro, `timestamp` milliseconds after recording started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ActionRecord", into = "ActionRecord")]
pub struct MacroAction {
    pub timestamp: u32,
    pub kind: ActionKind,
}

impl MacroAction {
    pub fn new(timestamp: u32, kind: ActionKind) -> Self {
        Self { timestamp, kind }
    }
}

// ── Persisted form ────────────────────────────────────────────────────────────

/// Flat JSON shape of a [`MacroAction`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionRecord {
    #[serde(rename = "type")]
    pub action_type: u8,
    pub timestamp: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

impl From<MacroAction> for ActionRecord {
    fn from(action: MacroAction) -> Self {
        let mut record = ActionRecord {
            action_type: action.kind.type_code(),
            timestamp: action.timestamp,
            ..ActionRecord::default()
        };
        match action.kind {
            ActionKind::KeyPress { modifiers, key } => {
                record.modifiers = Some(modifiers.0);
                record.key = Some(key);
            }
            ActionKind::KeyRelease { key } => {
                record.modifiers = Some(0);
                record.key = Some(key);
            }
            ActionKind::MouseMove { x, y } => {
                record.x = Some(x);
                record.y = Some(y);
            }
            ActionKind::MouseClick { button } => record.button = Some(button.as_u8()),
            ActionKind::MouseScroll { amount } => record.amount = Some(amount),
            ActionKind::Delay { duration } => record.duration = Some(duration),
        }
        record
    }
}

impl TryFrom<ActionRecord> for MacroAction {
    type Error = DocumentError;

    fn try_from(record: ActionRecord) -> Result<Self, Self::Error> {
        let type_code = record.action_type;
        let kind = match type_code {
            0 => ActionKind::KeyPress {
                modifiers: Modifiers(record.modifiers.unwrap_or(0)),
                key: need(record.key, type_code, "key")?,
            },
            1 => ActionKind::KeyRelease {
                key: need(record.key, type_code, "key")?,
            },
            2 => ActionKind::MouseMove {
                x: need(record.x, type_code, "x")?,
                y: need(record.y, type_code, "y")?,
            },
            3 => {
                let raw = need(record.button, type_code, "button")?;
                ActionKind::MouseClick {
                    button: MouseButton::try_from(raw)
                        .map_err(|()| DocumentError::InvalidButton(raw))?,
                }
            }
            4 => ActionKind::MouseScroll {
                amount: need(record.amount, type_code, "amount")?,
            },
            5 => ActionKind::Delay {
                duration: need(record.duration, type_code, "duration")?,
            },
            other => return Err(DocumentError::UnknownActionType(other)),
        };
        Ok(MacroAction::new(record.timestamp, kind))
    }
}

fn need<T>(value: Option<T>, type_code: u8, field: &'static str) -> Result<T, DocumentError> {
    value.ok_or(DocumentError::MissingField { type_code, field })
}
