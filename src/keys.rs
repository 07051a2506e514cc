//! Logical keys and the fixed tables that map them to DOM key data.
//!
//! Strings handed to [`send_keys`](crate::atoms::send_keys) mix literal
//! characters with WebDriver special-key code points (`U+E000`..`U+E03D`);
//! [`parse_key_sequence`] splits them into [`KeyToken`]s.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// A key on the virtual keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyId {
    Cancel,
    Help,
    Backspace,
    Tab,
    Clear,
    Enter,
    Shift,
    Control,
    Alt,
    Meta,
    Pause,
    Escape,
    Space,
    PageUp,
    PageDown,
    End,
    Home,
    Left,
    Up,
    Right,
    Down,
    Insert,
    Delete,
    /// Numeric keypad digit, 0 to 9.
    Numpad(u8),
    Multiply,
    Add,
    Separator,
    Subtract,
    Decimal,
    Divide,
    /// Function key, 1 to 12.
    F(u8),
    /// A printable key, named by its unshifted character.
    Char(char),
}

/// Modifier keys that may be held across presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Shift,
    Control,
    Alt,
    Meta,
}

impl Modifier {
    pub fn key(self) -> KeyId {
        match self {
            Self::Shift => KeyId::Shift,
            Self::Control => KeyId::Control,
            Self::Alt => KeyId::Alt,
            Self::Meta => KeyId::Meta,
        }
    }
}

/// Static data for one physical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDescriptor {
    /// Legacy `keyCode`.
    pub key_code: u32,
    /// DOM `code`, e.g. `KeyA` or `ArrowLeft`.
    pub code: &'static str,
    pub unmodified_char: Option<char>,
    pub shifted_char: Option<char>,
}

impl KeyDescriptor {
    const fn named(key_code: u32, code: &'static str) -> Self {
        Self {
            key_code,
            code,
            unmodified_char: None,
            shifted_char: None,
        }
    }

    /// Character produced with the given shift state, if any.
    pub fn char_for(&self, shift: bool) -> Option<char> {
        if shift {
            self.shifted_char.or(self.unmodified_char)
        } else {
            self.unmodified_char
        }
    }
}

impl KeyId {
    pub fn modifier(self) -> Option<Modifier> {
        match self {
            Self::Shift => Some(Modifier::Shift),
            Self::Control => Some(Modifier::Control),
            Self::Alt => Some(Modifier::Alt),
            Self::Meta => Some(Modifier::Meta),
            _ => None,
        }
    }

    pub fn is_modifier(self) -> bool {
        self.modifier().is_some()
    }

    /// Looks up the key's entry in the key table.
    pub fn descriptor(self) -> KeyDescriptor {
        match self {
            Self::Char(ch) => CHAR_KEYS
                .get(&ch)
                .map(|(_, descriptor)| *descriptor)
                .unwrap_or(KeyDescriptor {
                    key_code: 0,
                    code: "",
                    unmodified_char: Some(ch),
                    shifted_char: None,
                }),
            Self::Numpad(digit) => {
                let digit = digit.min(9);
                KeyDescriptor {
                    key_code: 96 + u32::from(digit),
                    code: NUMPAD_CODES[usize::from(digit)],
                    unmodified_char: char::from_digit(u32::from(digit), 10),
                    shifted_char: None,
                }
            }
            Self::F(n) => {
                let n = n.clamp(1, 12);
                KeyDescriptor::named(111 + u32::from(n), FUNCTION_CODES[usize::from(n - 1)])
            }
            Self::Cancel => KeyDescriptor::named(3, "Cancel"),
            Self::Help => KeyDescriptor::named(6, "Help"),
            Self::Backspace => KeyDescriptor::named(8, "Backspace"),
            Self::Tab => KeyDescriptor::named(9, "Tab"),
            Self::Clear => KeyDescriptor::named(12, "NumpadClear"),
            Self::Enter => KeyDescriptor::named(13, "Enter"),
            Self::Shift => KeyDescriptor::named(16, "ShiftLeft"),
            Self::Control => KeyDescriptor::named(17, "ControlLeft"),
            Self::Alt => KeyDescriptor::named(18, "AltLeft"),
            Self::Meta => KeyDescriptor::named(91, "MetaLeft"),
            Self::Pause => KeyDescriptor::named(19, "Pause"),
            Self::Escape => KeyDescriptor::named(27, "Escape"),
            Self::Space => KeyDescriptor {
                unmodified_char: Some(' '),
                shifted_char: Some(' '),
                ..KeyDescriptor::named(32, "Space")
            },
            Self::PageUp => KeyDescriptor::named(33, "PageUp"),
            Self::PageDown => KeyDescriptor::named(34, "PageDown"),
            Self::End => KeyDescriptor::named(35, "End"),
            Self::Home => KeyDescriptor::named(36, "Home"),
            Self::Left => KeyDescriptor::named(37, "ArrowLeft"),
            Self::Up => KeyDescriptor::named(38, "ArrowUp"),
            Self::Right => KeyDescriptor::named(39, "ArrowRight"),
            Self::Down => KeyDescriptor::named(40, "ArrowDown"),
            Self::Insert => KeyDescriptor::named(45, "Insert"),
            Self::Delete => KeyDescriptor::named(46, "Delete"),
            Self::Multiply => KeyDescriptor {
                unmodified_char: Some('*'),
                ..KeyDescriptor::named(106, "NumpadMultiply")
            },
            Self::Add => KeyDescriptor {
                unmodified_char: Some('+'),
                ..KeyDescriptor::named(107, "NumpadAdd")
            },
            Self::Separator => KeyDescriptor {
                unmodified_char: Some(','),
                ..KeyDescriptor::named(108, "NumpadComma")
            },
            Self::Subtract => KeyDescriptor {
                unmodified_char: Some('-'),
                ..KeyDescriptor::named(109, "NumpadSubtract")
            },
            Self::Decimal => KeyDescriptor {
                unmodified_char: Some('.'),
                ..KeyDescriptor::named(110, "NumpadDecimal")
            },
            Self::Divide => KeyDescriptor {
                unmodified_char: Some('/'),
                ..KeyDescriptor::named(111, "NumpadDivide")
            },
        }
    }

    /// DOM `key` value with the given shift state.
    pub fn dom_key(self, shift: bool) -> String {
        if let Some(ch) = self.descriptor().char_for(shift) {
            return ch.to_string();
        }
        match self {
            Self::Left => "ArrowLeft".into(),
            Self::Right => "ArrowRight".into(),
            Self::Up => "ArrowUp".into(),
            Self::Down => "ArrowDown".into(),
            Self::F(n) => format!("F{}", n.clamp(1, 12)),
            Self::Escape => "Escape".into(),
            Self::Clear => "Clear".into(),
            other => format!("{other:?}"),
        }
    }
}

/// One step of a typed key string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyToken {
    /// Press and release, or toggle if it is a modifier.
    Key(KeyId),
    /// A printable character whose key needs shift held.
    Shifted(KeyId),
    /// `U+E000`: release every held modifier.
    ReleaseAll,
}

/// Splits typed text into key tokens. Special-key code points map through
/// the WebDriver table; `\n` is Enter and `\t` is Tab.
pub fn parse_key_sequence(keys: &str) -> Vec<KeyToken> {
    keys.chars()
        .map(|ch| {
            if let Some(token) = special_key(ch) {
                return token;
            }
            match ch {
                '\n' | '\r' => KeyToken::Key(KeyId::Enter),
                '\t' => KeyToken::Key(KeyId::Tab),
                ' ' => KeyToken::Key(KeyId::Space),
                _ => match CHAR_KEYS.get(&ch) {
                    Some((key, descriptor)) if descriptor.unmodified_char != Some(ch) => {
                        KeyToken::Shifted(*key)
                    }
                    Some((key, _)) => KeyToken::Key(*key),
                    None => KeyToken::Key(KeyId::Char(ch)),
                },
            }
        })
        .collect()
}

fn special_key(ch: char) -> Option<KeyToken> {
    let code = u32::from(ch);
    if !(0xE000..=0xE03D).contains(&code) {
        return None;
    }
    let key = match code - 0xE000 {
        0x00 => return Some(KeyToken::ReleaseAll),
        0x01 => KeyId::Cancel,
        0x02 => KeyId::Help,
        0x03 => KeyId::Backspace,
        0x04 => KeyId::Tab,
        0x05 => KeyId::Clear,
        0x06 | 0x07 => KeyId::Enter,
        0x08 => KeyId::Shift,
        0x09 => KeyId::Control,
        0x0A => KeyId::Alt,
        0x0B => KeyId::Pause,
        0x0C => KeyId::Escape,
        0x0D => KeyId::Space,
        0x0E => KeyId::PageUp,
        0x0F => KeyId::PageDown,
        0x10 => KeyId::End,
        0x11 => KeyId::Home,
        0x12 => KeyId::Left,
        0x13 => KeyId::Up,
        0x14 => KeyId::Right,
        0x15 => KeyId::Down,
        0x16 => KeyId::Insert,
        0x17 => KeyId::Delete,
        0x18 => KeyId::Char(';'),
        0x19 => KeyId::Char('='),
        offset @ 0x1A..=0x23 => KeyId::Numpad(u8::try_from(offset - 0x1A).ok()?),
        0x24 => KeyId::Multiply,
        0x25 => KeyId::Add,
        0x26 => KeyId::Separator,
        0x27 => KeyId::Subtract,
        0x28 => KeyId::Decimal,
        0x29 => KeyId::Divide,
        offset @ 0x31..=0x3C => KeyId::F(u8::try_from(offset - 0x30).ok()?),
        0x3D => KeyId::Meta,
        _ => return None,
    };
    Some(KeyToken::Key(key))
}

/// WebDriver code points for the special keys, for building key strings.
pub mod special {
    pub const NULL: char = '\u{E000}';
    pub const BACKSPACE: char = '\u{E003}';
    pub const TAB: char = '\u{E004}';
    pub const ENTER: char = '\u{E007}';
    pub const SHIFT: char = '\u{E008}';
    pub const CONTROL: char = '\u{E009}';
    pub const ALT: char = '\u{E00A}';
    pub const ESCAPE: char = '\u{E00C}';
    pub const END: char = '\u{E010}';
    pub const HOME: char = '\u{E011}';
    pub const LEFT: char = '\u{E012}';
    pub const RIGHT: char = '\u{E014}';
    pub const DELETE: char = '\u{E017}';
    pub const META: char = '\u{E03D}';
}

const NUMPAD_CODES: [&str; 10] = [
    "Numpad0", "Numpad1", "Numpad2", "Numpad3", "Numpad4", "Numpad5", "Numpad6", "Numpad7",
    "Numpad8", "Numpad9",
];

const FUNCTION_CODES: [&str; 12] = [
    "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12",
];

/// US layout punctuation: (unshifted, shifted, keyCode, code).
const PUNCTUATION: &[(char, char, u32, &str)] = &[
    ('`', '~', 192, "Backquote"),
    ('-', '_', 189, "Minus"),
    ('=', '+', 187, "Equal"),
    ('[', '{', 219, "BracketLeft"),
    (']', '}', 221, "BracketRight"),
    ('\\', '|', 220, "Backslash"),
    (';', ':', 186, "Semicolon"),
    ('\'', '"', 222, "Quote"),
    (',', '<', 188, "Comma"),
    ('.', '>', 190, "Period"),
    ('/', '?', 191, "Slash"),
];

const DIGIT_SHIFTED: [char; 10] = [')', '!', '@', '#', '$', '%', '^', '&', '*', '('];

const DIGIT_CODES: [&str; 10] = [
    "Digit0", "Digit1", "Digit2", "Digit3", "Digit4", "Digit5", "Digit6", "Digit7", "Digit8",
    "Digit9",
];

const LETTER_CODES: [&str; 26] = [
    "KeyA", "KeyB", "KeyC", "KeyD", "KeyE", "KeyF", "KeyG", "KeyH", "KeyI", "KeyJ", "KeyK",
    "KeyL", "KeyM", "KeyN", "KeyO", "KeyP", "KeyQ", "KeyR", "KeyS", "KeyT", "KeyU", "KeyV",
    "KeyW", "KeyX", "KeyY", "KeyZ",
];

/// Both characters of every printable key, pointing at the key.
static CHAR_KEYS: LazyLock<HashMap<char, (KeyId, KeyDescriptor)>> = LazyLock::new(|| {
    let mut table = HashMap::new();
    let mut insert = |unmodified: char, shifted: char, key_code: u32, code: &'static str| {
        let key = KeyId::Char(unmodified);
        let descriptor = KeyDescriptor {
            key_code,
            code,
            unmodified_char: Some(unmodified),
            shifted_char: Some(shifted),
        };
        table.insert(unmodified, (key, descriptor));
        table.entry(shifted).or_insert((key, descriptor));
    };
    for (offset, lower) in ('a'..='z').enumerate() {
        let upper = lower.to_ascii_uppercase();
        insert(lower, upper, 65 + offset as u32, LETTER_CODES[offset]);
    }
    for (digit, shifted) in DIGIT_SHIFTED.iter().enumerate() {
        let ch = char::from(b'0' + digit as u8);
        insert(ch, *shifted, 48 + digit as u32, DIGIT_CODES[digit]);
    }
    for (unmodified, shifted, key_code, code) in PUNCTUATION {
        insert(*unmodified, *shifted, *key_code, code);
    }
    table
});
