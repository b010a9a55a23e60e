//! Modifier bitmask carried alongside every scancode.
//!
//! The bit layout matches byte 0 of a USB boot-protocol keyboard report for
//! the left-hand modifiers, so the value can be written to the wire as-is.

use std::fmt;

/// Bitmask of held modifier keys (bit0=Ctrl, bit1=Shift, bit2=Alt, bit3=GUI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(pub u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const CTRL: u8 = 1 << 0;
    pub const SHIFT: u8 = 1 << 1;
    pub const ALT: u8 = 1 << 2;
    pub const GUI: u8 = 1 << 3;

    /// Shorthand for a Shift-only mask.
    pub const fn shift_only() -> Self {
        Modifiers(Self::SHIFT)
    }

    /// Parses a modifier string such as `"ctrl shift"` or `"Ctrl+Alt"`.
    ///
    /// Tokens are separated by whitespace, `+` or `,` and compared
    /// case-insensitively.  `gui`, `cmd` and `win` all set the GUI bit.
    /// Unrecognised tokens are ignored.
    pub fn parse(text: &str) -> Self {
        let mut bits = 0u8;
        for token in text
            .split(|c: char| c.is_whitespace() || c == '+' || c == ',')
            .filter(|t| !t.is_empty())
        {
            match token.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => bits |= Self::CTRL,
                "shift" => bits |= Self::SHIFT,
                "alt" => bits |= Self::ALT,
                "gui" | "cmd" | "win" => bits |= Self::GUI,
                other => tracing::debug!(token = other, "ignoring unrecognised modifier token"),
            }
        }
        Modifiers(bits)
    }

    pub fn ctrl(&self) -> bool {
        self.0 & Self::CTRL != 0
    }

    pub fn shift(&self) -> bool {
        self.0 & Self::SHIFT != 0
    }

    pub fn alt(&self) -> bool {
        self.0 & Self::ALT != 0
    }

    pub fn gui(&self) -> bool {
        self.0 & Self::GUI != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns the union of both masks.
    pub fn with(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }
}

/// Space-separated lower-case names in Ctrl, Shift, Alt, GUI order.
impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (self.ctrl(), "ctrl"),
            (self.shift(), "shift"),
            (self.alt(), "alt"),
            (self.gui(), "gui"),
        ];
        let mut first = true;
        for (_, name) in names.iter().filter(|(held, _)| *held) {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(name)?;
            first = false;
        }
        Ok(())
    }
}
