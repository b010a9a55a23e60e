//! Keyboard tables: HID usages, modifier bits, locale translation, and the
//! key-name and shortcut parsers used by the keyboard tools.

pub mod hid;
pub mod layout;
pub mod modifiers;
pub mod named;
pub mod shortcut;

pub use hid::HidKeyCode;
pub use layout::{convert_string, translate, KeyCode, KeyCodes, KeyboardLayout, LayoutParseError};
pub use modifiers::Modifiers;
pub use named::{resolve_key, KeyTarget, UnknownKey};
pub use shortcut::{parse_shortcut, Shortcut};
