//! USB HID Usage IDs (page 0x07, Keyboard/Keypad page).
//!
//! Every keyboard report the bridge sends carries these numbers.  They name
//! **physical key positions**, not characters: the character a host produces
//! for a given usage depends on the host's configured keyboard layout.  That
//! is why the layout translator in [`super::layout`] exists at all.
//!
//! Reference: USB HID Usage Tables 1.3, Section 10.
//!
//! # What is a HID Usage ID? (for beginners)
//!
//! | Key          | HID Usage ID |
//! |--------------|-------------|
//! | Letter A     | 0x04        |
//! | Digit 1      | 0x1E        |
//! | Enter        | 0x28        |
//! | F1           | 0x3A        |
//!
//! Letters start at 0x04 (not at 'A'=0x41 like ASCII).  A boot-protocol
//! keyboard report holds usages as single bytes, so the enum is `repr(u8)`.
//!
//! # The `Unknown` sentinel
//!
//! [`HidKeyCode::Unknown`] (0x00) means "no key".  A zero usage in a report
//! slot is how the boot protocol encodes an empty slot, so a zero scancode is
//! never sent as a key press.

/// USB HID Usage ID for keyboard keys (page 0x07).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HidKeyCode {
    // Letters (HID 0x04–0x1D)
    KeyA = 0x04,
    KeyB = 0x05,
    KeyC = 0x06,
    KeyD = 0x07,
    KeyE = 0x08,
    KeyF = 0x09,
    KeyG = 0x0A,
    KeyH = 0x0B,
    KeyI = 0x0C,
    KeyJ = 0x0D,
    KeyK = 0x0E,
    KeyL = 0x0F,
    KeyM = 0x10,
    KeyN = 0x11,
    KeyO = 0x12,
    KeyP = 0x13,
    KeyQ = 0x14,
    KeyR = 0x15,
    KeyS = 0x16,
    KeyT = 0x17,
    KeyU = 0x18,
    KeyV = 0x19,
    KeyW = 0x1A,
    KeyX = 0x1B,
    KeyY = 0x1C,
    KeyZ = 0x1D,

    // Digits (HID 0x1E–0x27)
    Digit1 = 0x1E,
    Digit2 = 0x1F,
    Digit3 = 0x20,
    Digit4 = 0x21,
    Digit5 = 0x22,
    Digit6 = 0x23,
    Digit7 = 0x24,
    Digit8 = 0x25,
    Digit9 = 0x26,
    Digit0 = 0x27,

    // Control and punctuation keys (HID 0x28–0x38)
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    Minus = 0x2D,
    Equal = 0x2E,
    BracketLeft = 0x2F,
    BracketRight = 0x30,
    Backslash = 0x31,
    Semicolon = 0x33,
    Quote = 0x34,
    Backquote = 0x35,
    Comma = 0x36,
    Period = 0x37,
    Slash = 0x38,

    // Function keys (HID 0x3A–0x45)
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,

    // Navigation cluster
    Delete = 0x4C,
    ArrowRight = 0x4F,
    ArrowLeft = 0x50,
    ArrowDown = 0x51,
    ArrowUp = 0x52,

    /// Sentinel for "no key".
    Unknown = 0x00,
}

impl HidKeyCode {
    /// The 26 letter usages in alphabetical order.
    pub const LETTERS: [HidKeyCode; 26] = [
        HidKeyCode::KeyA,
        HidKeyCode::KeyB,
        HidKeyCode::KeyC,
        HidKeyCode::KeyD,
        HidKeyCode::KeyE,
        HidKeyCode::KeyF,
        HidKeyCode::KeyG,
        HidKeyCode::KeyH,
        HidKeyCode::KeyI,
        HidKeyCode::KeyJ,
        HidKeyCode::KeyK,
        HidKeyCode::KeyL,
        HidKeyCode::KeyM,
        HidKeyCode::KeyN,
        HidKeyCode::KeyO,
        HidKeyCode::KeyP,
        HidKeyCode::KeyQ,
        HidKeyCode::KeyR,
        HidKeyCode::KeyS,
        HidKeyCode::KeyT,
        HidKeyCode::KeyU,
        HidKeyCode::KeyV,
        HidKeyCode::KeyW,
        HidKeyCode::KeyX,
        HidKeyCode::KeyY,
        HidKeyCode::KeyZ,
    ];

    /// Function keys F1–F12 in order.
    pub const FUNCTION_KEYS: [HidKeyCode; 12] = [
        HidKeyCode::F1,
        HidKeyCode::F2,
        HidKeyCode::F3,
        HidKeyCode::F4,
        HidKeyCode::F5,
        HidKeyCode::F6,
        HidKeyCode::F7,
        HidKeyCode::F8,
        HidKeyCode::F9,
        HidKeyCode::F10,
        HidKeyCode::F11,
        HidKeyCode::F12,
    ];

    /// Returns the usage for an ASCII letter (either case), or `None`.
    pub fn letter(ch: char) -> Option<Self> {
        if ch.is_ascii_alphabetic() {
            let index = (ch.to_ascii_lowercase() as u8 - b'a') as usize;
            Some(Self::LETTERS[index])
        } else {
            None
        }
    }

    /// Returns the usage for an ASCII digit, or `None`.
    ///
    /// The digit row runs 1..9 then 0, so '0' sits after '9'.
    pub fn digit(ch: char) -> Option<Self> {
        match ch {
            '1' => Some(HidKeyCode::Digit1),
            '2' => Some(HidKeyCode::Digit2),
            '3' => Some(HidKeyCode::Digit3),
            '4' => Some(HidKeyCode::Digit4),
            '5' => Some(HidKeyCode::Digit5),
            '6' => Some(HidKeyCode::Digit6),
            '7' => Some(HidKeyCode::Digit7),
            '8' => Some(HidKeyCode::Digit8),
            '9' => Some(HidKeyCode::Digit9),
            '0' => Some(HidKeyCode::Digit0),
            _ => None,
        }
    }

    /// Returns the raw HID Usage ID value for this key code.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
