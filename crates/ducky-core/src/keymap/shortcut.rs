//! Parsing of `keyboard_shortcut` strings such as `"ctrl+alt+delete"`.

/// A shortcut split into its modifier string and key name.
///
/// `modifiers` is space-delimited and lower-cased (`"ctrl alt"`), the form
/// accepted by [`super::Modifiers::parse`] and by the HID sink's
/// key-stroke primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    pub modifiers: String,
    pub key: String,
}

/// Splits `text` on `'+'`: the last token is the key, the rest are modifiers.
///
/// Modifier tokens are trimmed and lower-cased; empty ones are dropped.  The
/// key is trimmed but keeps its case.  Text without any `'+'` is a bare key.
/// A trailing `"++"` (or `"+"` on its own) names the `+` key itself.
pub fn parse_shortcut(text: &str) -> Shortcut {
    let trimmed = text.trim();
    if trimmed == "+" {
        return Shortcut {
            modifiers: String::new(),
            key: "+".to_string(),
        };
    }
    if let Some(mods) = trimmed.strip_suffix("++") {
        return Shortcut {
            modifiers: join_modifiers(mods),
            key: "+".to_string(),
        };
    }
    match text.rsplit_once('+') {
        Some((mods, key)) => Shortcut {
            modifiers: join_modifiers(mods),
            key: key.trim().to_string(),
        },
        None => Shortcut {
            modifiers: String::new(),
            key: trimmed.to_string(),
        },
    }
}

fn join_modifiers(mods: &str) -> String {
    mods.split('+')
        .map(|m| m.trim().to_lowercase())
        .filter(|m| !m.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
