//! A named macro and its JSON document form.
//!
//! The same document shape is used for files in the macro directory and for
//! the export/import string, so a macro exported from one device can be
//! dropped straight into another device's storage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::action::MacroAction;

/// Errors produced while reading a macro document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed macro document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown action type {0}")]
    UnknownActionType(u8),

    #[error("action type {type_code} is missing field `{field}`")]
    MissingField { type_code: u8, field: &'static str },

    #[error("invalid mouse button value {0}")]
    InvalidButton(u8),
}

/// A named, replayable sequence of timestamped actions.
///
/// Field order matches the persisted document:
/// `{name, description, totalDuration, loop, actions}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Macro {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub total_duration: u32,
    #[serde(default, rename = "loop")]
    pub looping: bool,
    #[serde(default)]
    pub actions: Vec<MacroAction>,
}

impl Macro {
    /// An empty draft with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            total_duration: 0,
            looping: false,
            actions: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// `true` if timestamps never decrease along the action list.
    pub fn is_ordered(&self) -> bool {
        self.actions
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp)
    }

    /// Serialises to the transferable document string.
    pub fn export(&self) -> String {
        // A Macro contains only strings, integers and booleans, so encoding
        // cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Pretty-printed document, used for files on disk.
    pub fn to_document(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a document produced by [`Macro::export`] or read from storage.
    ///
    /// Actions whose timestamps go backwards are re-ordered (stable), since
    /// playback consumes them strictly in timestamp order.
    pub fn import(document: &str) -> Result<Self, DocumentError> {
        let mut parsed: Macro = serde_json::from_str(document)?;
        if !parsed.is_ordered() {
            tracing::warn!(
                name = %parsed.name,
                "macro actions out of timestamp order; sorting"
            );
            parsed.actions.sort_by_key(|a| a.timestamp);
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::Modifiers;
    use crate::macros::action::{ActionKind, MouseButton};

    fn sample() -> Macro {
        let mut m = Macro::new("login").with_description("types credentials");
        m.total_duration = 900;
        m.looping = true;
        m.actions = vec![
            MacroAction::new(
                0,
                ActionKind::KeyPress {
                    modifiers: Modifiers(Modifiers::SHIFT),
                    key: 0x04,
                },
            ),
            MacroAction::new(40, ActionKind::KeyRelease { key: 0x04 }),
            MacroAction::new(100, ActionKind::MouseMove { x: -20, y: 300 }),
            MacroAction::new(
                400,
                ActionKind::MouseClick {
                    button: MouseButton::Right,
                },
            ),
            MacroAction::new(500, ActionKind::MouseScroll { amount: -3 }),
            MacroAction::new(800, ActionKind::Delay { duration: 100 }),
        ];
        m
    }

    #[test]
    fn test_export_then_import_reproduces_macro() {
        // Arrange
        let original = sample();

        // Act
        let restored = Macro::import(&original.export()).unwrap();

        // Assert
        assert_eq!(restored, original);
    }

    #[test]
    fn test_document_uses_camel_case_and_loop_key() {
        // Arrange
        let m = Macro::new("x");

        // Act
        let json = m.export();

        // Assert
        assert_eq!(
            json,
            r#"{"name":"x","description":"","totalDuration":0,"loop":false,"actions":[]}"#
        );
    }

    #[test]
    fn test_import_defaults_optional_fields() {
        // Arrange
        let doc = r#"{"name":"bare"}"#;

        // Act
        let m = Macro::import(doc).unwrap();

        // Assert
        assert_eq!(m, Macro::new("bare"));
    }

    #[test]
    fn test_import_rejects_missing_name() {
        let result = Macro::import(r#"{"actions":[]}"#);
        assert!(matches!(result, Err(DocumentError::Json(_))));
    }

    #[test]
    fn test_import_rejects_garbage() {
        assert!(Macro::import("not json").is_err());
    }

    #[test]
    fn test_import_sorts_out_of_order_actions() {
        // Arrange
        let doc = r#"{"name":"m","actions":[
            {"type":5,"timestamp":50,"duration":1},
            {"type":5,"timestamp":10,"duration":2}
        ]}"#;

        // Act
        let m = Macro::import(doc).unwrap();

        // Assert
        assert!(m.is_ordered());
        assert_eq!(m.actions[0].timestamp, 10);
    }
}
