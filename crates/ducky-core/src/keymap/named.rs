//! Key-name resolution for the `keyboard_key` and `keyboard_shortcut` tools.
//!
//! A small closed vocabulary of names maps to fixed HID usages.  Any other
//! single character is passed through as a character and left for the layout
//! translator.  Names are matched case-insensitively so that the lower-cased
//! key of a shortcut like `"ctrl+alt+delete"` still resolves.

use thiserror::Error;

use super::hid::HidKeyCode;
use super::layout::{translate, KeyCode, KeyboardLayout};
use super::modifiers::Modifiers;

/// What a key name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTarget {
    /// A named non-printing key (Enter, F5, arrows...).
    Usage(HidKeyCode),
    /// A single literal character.
    Char(char),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown key: {0}")]
pub struct UnknownKey(pub String);

/// Resolves a key name to a [`KeyTarget`].
pub fn resolve_key(name: &str) -> Result<KeyTarget, UnknownKey> {
    if let Some(usage) = named_usage(name) {
        return Ok(KeyTarget::Usage(usage));
    }
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(KeyTarget::Char(ch)),
        _ => Err(UnknownKey(name.to_string())),
    }
}

fn named_usage(name: &str) -> Option<HidKeyCode> {
    let lower = name.to_ascii_lowercase();
    let usage = match lower.as_str() {
        "enter" | "return" => HidKeyCode::Enter,
        "escape" | "esc" => HidKeyCode::Escape,
        "tab" => HidKeyCode::Tab,
        "space" => HidKeyCode::Space,
        "backspace" => HidKeyCode::Backspace,
        "delete" | "del" => HidKeyCode::Delete,
        "up" => HidKeyCode::ArrowUp,
        "down" => HidKeyCode::ArrowDown,
        "left" => HidKeyCode::ArrowLeft,
        "right" => HidKeyCode::ArrowRight,
        _ => return function_key(&lower),
    };
    Some(usage)
}

/// `f1`..`f12`.
fn function_key(lower: &str) -> Option<HidKeyCode> {
    let number: usize = lower.strip_prefix('f')?.parse().ok()?;
    HidKeyCode::FUNCTION_KEYS.get(number.checked_sub(1)?).copied()
}

impl KeyTarget {
    /// Scancode and modifiers needed to produce this key on `layout`.
    ///
    /// `extra` modifiers are merged with any Shift the layout requires.
    /// Returns [`KeyCode::UNSUPPORTED`] for characters the layout lacks.
    pub fn key_code(self, layout: KeyboardLayout, extra: Modifiers) -> KeyCode {
        let base = match self {
            KeyTarget::Usage(usage) => KeyCode {
                scancode: usage.as_u8(),
                modifiers: Modifiers::NONE,
            },
            KeyTarget::Char(ch) => translate(ch, layout),
        };
        if !base.is_supported() {
            return KeyCode::UNSUPPORTED;
        }
        KeyCode {
            scancode: base.scancode,
            modifiers: base.modifiers.with(extra),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keys_resolve_with_synonyms() {
        assert_eq!(resolve_key("Enter"), Ok(KeyTarget::Usage(HidKeyCode::Enter)));
        assert_eq!(resolve_key("Return"), Ok(KeyTarget::Usage(HidKeyCode::Enter)));
        assert_eq!(resolve_key("Esc"), Ok(KeyTarget::Usage(HidKeyCode::Escape)));
        assert_eq!(resolve_key("Del"), Ok(KeyTarget::Usage(HidKeyCode::Delete)));
        assert_eq!(resolve_key("Up"), Ok(KeyTarget::Usage(HidKeyCode::ArrowUp)));
    }

    #[test]
    fn test_named_keys_are_case_insensitive() {
        assert_eq!(resolve_key("delete"), Ok(KeyTarget::Usage(HidKeyCode::Delete)));
        assert_eq!(resolve_key("TAB"), Ok(KeyTarget::Usage(HidKeyCode::Tab)));
    }

    #[test]
    fn test_function_keys_f1_through_f12() {
        assert_eq!(resolve_key("F1"), Ok(KeyTarget::Usage(HidKeyCode::F1)));
        assert_eq!(resolve_key("f12"), Ok(KeyTarget::Usage(HidKeyCode::F12)));
        assert!(resolve_key("F13").is_err());
        assert!(resolve_key("F0").is_err());
    }

    #[test]
    fn test_single_character_passes_through() {
        assert_eq!(resolve_key("a"), Ok(KeyTarget::Char('a')));
        assert_eq!(resolve_key("F"), Ok(KeyTarget::Char('F')));
        assert_eq!(resolve_key("é"), Ok(KeyTarget::Char('é')));
    }

    #[test]
    fn test_unknown_names_are_rejected() {
        // Arrange / Act
        let result = resolve_key("Hyper");

        // Assert
        assert_eq!(result, Err(UnknownKey("Hyper".to_string())));
        assert_eq!(
            resolve_key("").map_err(|e| e.to_string()),
            Err("Unknown key: ".to_string())
        );
    }

    #[test]
    fn test_key_code_merges_layout_shift_with_extra_modifiers() {
        // Arrange
        let target = KeyTarget::Char('A');

        // Act
        let code = target.key_code(KeyboardLayout::Us, Modifiers(Modifiers::CTRL));

        // Assert
        assert_eq!(code.scancode, 0x04);
        assert_eq!(code.modifiers.0, Modifiers::CTRL | Modifiers::SHIFT);
    }

    #[test]
    fn test_key_code_for_unsupported_char_is_sentinel() {
        let code = KeyTarget::Char('€').key_code(KeyboardLayout::Us, Modifiers(Modifiers::CTRL));
        assert_eq!(code, KeyCode::UNSUPPORTED);
    }
}
