//! Character → scancode translation for the supported keyboard locales.
//!
//! The host decides which character a HID usage produces, based on the
//! keyboard layout configured *on the host*.  To make the host type `z`, a
//! US host needs usage 0x1D while a German host needs 0x1C.  This module
//! answers "which usage and which modifiers produce character X on a host
//! set to layout L?".
//!
//! # How the tables are built (for beginners)
//!
//! The US table is the base.  Most other locales are expressed as a small
//! set of overrides on top of it (UK moves `"`, `#`, `@` and adds `£`;
//! Spanish adds `ñ` and accented vowels; ...).  German and French re-arrange
//! the letters themselves and so are defined as complete tables:
//!
//! - German (QWERTZ) swaps the Y and Z positions.
//! - French (AZERTY) swaps A/Q and W/Z, moves M next to L, and needs Shift
//!   for the digit row.
//!
//! Portuguese and the Nordic locales currently reuse the US table.
//!
//! [`translate`] is total: characters a locale cannot produce map to
//! [`KeyCode::UNSUPPORTED`] (scancode 0).  Callers building a key sequence
//! must drop those; [`convert_string`] does so.

use std::fmt;
use std::str::{Chars, FromStr};

use thiserror::Error;

use super::hid::HidKeyCode;
use super::modifiers::Modifiers;

// ── Types ─────────────────────────────────────────────────────────────────────

/// Keyboard locale configured on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyboardLayout {
    #[default]
    Us,
    Uk,
    De,
    Fr,
    Es,
    It,
    Pt,
    Se,
    No,
    Dk,
}

/// Error returned when a layout code is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown keyboard layout: {0}")]
pub struct LayoutParseError(pub String);

/// A scancode plus the modifiers that must be held while it is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode {
    pub scancode: u8,
    pub modifiers: Modifiers,
}

impl KeyCode {
    /// Sentinel for characters the locale cannot produce.
    pub const UNSUPPORTED: KeyCode = KeyCode {
        scancode: 0,
        modifiers: Modifiers::NONE,
    };

    fn plain(code: HidKeyCode) -> Self {
        KeyCode {
            scancode: code.as_u8(),
            modifiers: Modifiers::NONE,
        }
    }

    fn shifted(code: HidKeyCode) -> Self {
        KeyCode {
            scancode: code.as_u8(),
            modifiers: Modifiers::shift_only(),
        }
    }

    /// `false` for the zero-scancode sentinel.
    pub fn is_supported(&self) -> bool {
        self.scancode != 0
    }
}

impl KeyboardLayout {
    /// Every supported locale, in menu order.
    pub const ALL: [KeyboardLayout; 10] = [
        KeyboardLayout::Us,
        KeyboardLayout::Uk,
        KeyboardLayout::De,
        KeyboardLayout::Fr,
        KeyboardLayout::Es,
        KeyboardLayout::It,
        KeyboardLayout::Pt,
        KeyboardLayout::Se,
        KeyboardLayout::No,
        KeyboardLayout::Dk,
    ];

    /// Two-letter code used in configuration files and on the command line.
    pub fn code(self) -> &'static str {
        match self {
            KeyboardLayout::Us => "US",
            KeyboardLayout::Uk => "UK",
            KeyboardLayout::De => "DE",
            KeyboardLayout::Fr => "FR",
            KeyboardLayout::Es => "ES",
            KeyboardLayout::It => "IT",
            KeyboardLayout::Pt => "PT",
            KeyboardLayout::Se => "SE",
            KeyboardLayout::No => "NO",
            KeyboardLayout::Dk => "DK",
        }
    }

    /// Human-readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            KeyboardLayout::Us => "US (QWERTY)",
            KeyboardLayout::Uk => "UK (QWERTY)",
            KeyboardLayout::De => "German (QWERTZ)",
            KeyboardLayout::Fr => "French (AZERTY)",
            KeyboardLayout::Es => "Spanish",
            KeyboardLayout::It => "Italian",
            KeyboardLayout::Pt => "Portuguese",
            KeyboardLayout::Se => "Swedish",
            KeyboardLayout::No => "Norwegian",
            KeyboardLayout::Dk => "Danish",
        }
    }
}

impl fmt::Display for KeyboardLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for KeyboardLayout {
    type Err = LayoutParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        KeyboardLayout::ALL
            .iter()
            .copied()
            .find(|layout| layout.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LayoutParseError(s.to_string()))
    }
}

// ── Translation ───────────────────────────────────────────────────────────────

/// Translates one character for a host configured with `layout`.
///
/// Never fails; unsupported characters yield [`KeyCode::UNSUPPORTED`].
pub fn translate(ch: char, layout: KeyboardLayout) -> KeyCode {
    let code = match layout {
        KeyboardLayout::Us => us(ch),
        KeyboardLayout::Uk => uk(ch),
        KeyboardLayout::De => de(ch),
        KeyboardLayout::Fr => fr(ch),
        KeyboardLayout::Es => es(ch),
        KeyboardLayout::It => it(ch),
        KeyboardLayout::Pt | KeyboardLayout::Se | KeyboardLayout::No | KeyboardLayout::Dk => us(ch),
    };
    code.unwrap_or(KeyCode::UNSUPPORTED)
}

/// Lazily translates `text`, skipping characters the locale cannot produce.
///
/// The returned iterator is `Clone`, so a sequence can be replayed from the
/// start without re-reading the source text.
pub fn convert_string(text: &str, layout: KeyboardLayout) -> KeyCodes<'_> {
    KeyCodes {
        chars: text.chars(),
        layout,
    }
}

/// Iterator returned by [`convert_string`].
#[derive(Debug, Clone)]
pub struct KeyCodes<'a> {
    chars: Chars<'a>,
    layout: KeyboardLayout,
}

impl Iterator for KeyCodes<'_> {
    type Item = KeyCode;

    fn next(&mut self) -> Option<KeyCode> {
        let layout = self.layout;
        self.chars
            .by_ref()
            .map(|ch| translate(ch, layout))
            .find(KeyCode::is_supported)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.chars.size_hint().1)
    }
}

/// Letters in the natural position, uppercase adds Shift.
fn letter(ch: char, position: impl Fn(char) -> HidKeyCode) -> Option<KeyCode> {
    if ch.is_ascii_lowercase() {
        Some(KeyCode::plain(position(ch)))
    } else if ch.is_ascii_uppercase() {
        Some(KeyCode::shifted(position(ch.to_ascii_lowercase())))
    } else {
        None
    }
}

fn qwerty_position(ch: char) -> HidKeyCode {
    HidKeyCode::letter(ch).unwrap_or(HidKeyCode::Unknown)
}

/// Space, newline and tab are identical on every locale.
fn whitespace(ch: char) -> Option<KeyCode> {
    match ch {
        ' ' => Some(KeyCode::plain(HidKeyCode::Space)),
        '\n' => Some(KeyCode::plain(HidKeyCode::Enter)),
        '\t' => Some(KeyCode::plain(HidKeyCode::Tab)),
        _ => None,
    }
}

fn us(ch: char) -> Option<KeyCode> {
    use HidKeyCode::*;

    if let Some(code) = letter(ch, qwerty_position) {
        return Some(code);
    }
    if let Some(digit) = HidKeyCode::digit(ch) {
        return Some(KeyCode::plain(digit));
    }
    if let Some(code) = whitespace(ch) {
        return Some(code);
    }
    let code = match ch {
        '-' => KeyCode::plain(Minus),
        '=' => KeyCode::plain(Equal),
        '[' => KeyCode::plain(BracketLeft),
        ']' => KeyCode::plain(BracketRight),
        '\\' => KeyCode::plain(Backslash),
        ';' => KeyCode::plain(Semicolon),
        '\'' => KeyCode::plain(Quote),
        '`' => KeyCode::plain(Backquote),
        ',' => KeyCode::plain(Comma),
        '.' => KeyCode::plain(Period),
        '/' => KeyCode::plain(Slash),

        '!' => KeyCode::shifted(Digit1),
        '@' => KeyCode::shifted(Digit2),
        '#' => KeyCode::shifted(Digit3),
        '$' => KeyCode::shifted(Digit4),
        '%' => KeyCode::shifted(Digit5),
        '^' => KeyCode::shifted(Digit6),
        '&' => KeyCode::shifted(Digit7),
        '*' => KeyCode::shifted(Digit8),
        '(' => KeyCode::shifted(Digit9),
        ')' => KeyCode::shifted(Digit0),
        '_' => KeyCode::shifted(Minus),
        '+' => KeyCode::shifted(Equal),
        '{' => KeyCode::shifted(BracketLeft),
        '}' => KeyCode::shifted(BracketRight),
        '|' => KeyCode::shifted(Backslash),
        ':' => KeyCode::shifted(Semicolon),
        '"' => KeyCode::shifted(Quote),
        '~' => KeyCode::shifted(Backquote),
        '<' => KeyCode::shifted(Comma),
        '>' => KeyCode::shifted(Period),
        '?' => KeyCode::shifted(Slash),
        _ => return None,
    };
    Some(code)
}

fn uk(ch: char) -> Option<KeyCode> {
    use HidKeyCode::*;

    match ch {
        '"' => Some(KeyCode::shifted(Digit2)),
        '#' => Some(KeyCode::plain(Digit3)),
        '£' => Some(KeyCode::shifted(Digit3)),
        '@' => Some(KeyCode::shifted(Quote)),
        _ => us(ch),
    }
}

fn de(ch: char) -> Option<KeyCode> {
    use HidKeyCode::*;

    let qwertz = |c: char| match c {
        'y' => KeyZ,
        'z' => KeyY,
        other => qwerty_position(other),
    };
    if let Some(code) = letter(ch, qwertz) {
        return Some(code);
    }
    if let Some(digit) = HidKeyCode::digit(ch) {
        return Some(KeyCode::plain(digit));
    }
    if let Some(code) = whitespace(ch) {
        return Some(code);
    }
    let code = match ch {
        'ä' => KeyCode::plain(Quote),
        'Ä' => KeyCode::shifted(Quote),
        'ö' => KeyCode::plain(Semicolon),
        'Ö' => KeyCode::shifted(Semicolon),
        'ü' => KeyCode::plain(BracketLeft),
        'Ü' => KeyCode::shifted(BracketLeft),
        'ß' => KeyCode::plain(Minus),
        '.' => KeyCode::plain(Period),
        ',' => KeyCode::plain(Comma),
        '-' => KeyCode::plain(Slash),
        '+' => KeyCode::plain(BracketRight),
        '#' => KeyCode::plain(Backslash),
        _ => return None,
    };
    Some(code)
}

fn fr(ch: char) -> Option<KeyCode> {
    use HidKeyCode::*;

    let azerty = |c: char| match c {
        'a' => KeyQ,
        'q' => KeyA,
        'w' => KeyZ,
        'z' => KeyW,
        'm' => Semicolon,
        other => qwerty_position(other),
    };
    if let Some(code) = letter(ch, azerty) {
        return Some(code);
    }
    if let Some(digit) = HidKeyCode::digit(ch) {
        return Some(KeyCode::shifted(digit));
    }
    if let Some(code) = whitespace(ch) {
        return Some(code);
    }
    let code = match ch {
        '.' => KeyCode::shifted(Period),
        ',' => KeyCode::plain(KeyM),
        ';' => KeyCode::plain(Comma),
        ':' => KeyCode::plain(Period),
        'é' => KeyCode::plain(Digit2),
        'è' => KeyCode::plain(Digit7),
        'ç' => KeyCode::plain(Digit9),
        'à' => KeyCode::plain(Digit0),
        _ => return None,
    };
    Some(code)
}

fn es(ch: char) -> Option<KeyCode> {
    use HidKeyCode::*;

    match ch {
        'ñ' => Some(KeyCode::plain(Semicolon)),
        'Ñ' => Some(KeyCode::shifted(Semicolon)),
        'á' | 'í' | 'ú' => Some(KeyCode::plain(Quote)),
        'é' | 'ó' => Some(KeyCode::shifted(Quote)),
        '¿' => Some(KeyCode::shifted(Slash)),
        '¡' => Some(KeyCode::shifted(Digit1)),
        _ => us(ch),
    }
}

fn it(ch: char) -> Option<KeyCode> {
    use HidKeyCode::*;

    match ch {
        'à' => Some(KeyCode::plain(Quote)),
        'è' => Some(KeyCode::plain(BracketLeft)),
        'é' => Some(KeyCode::shifted(BracketLeft)),
        'ì' => Some(KeyCode::plain(Equal)),
        'ò' => Some(KeyCode::plain(Semicolon)),
        'ù' => Some(KeyCode::plain(BracketRight)),
        _ => us(ch),
    }
}
