//! USB HID keyboard usage codes
//!
//! Key names accepted in macro definitions map onto HID usage ids from the
//! Keyboard/Keypad usage page (0x07).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// HID keyboard usage id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyCode(pub u8);

impl KeyCode {
    /// No key (never emitted)
    pub const NONE: KeyCode = KeyCode(0x00);

    pub const A: KeyCode = KeyCode(0x04);
    pub const B: KeyCode = KeyCode(0x05);
    pub const C: KeyCode = KeyCode(0x06);
    pub const V: KeyCode = KeyCode(0x19);
    pub const Y: KeyCode = KeyCode(0x1C);
    pub const Z: KeyCode = KeyCode(0x1D);
    pub const ENTER: KeyCode = KeyCode(0x28);
    pub const ESCAPE: KeyCode = KeyCode(0x29);
    pub const BACKSPACE: KeyCode = KeyCode(0x2A);
    pub const TAB: KeyCode = KeyCode(0x2B);
    pub const SPACE: KeyCode = KeyCode(0x2C);
    pub const F1: KeyCode = KeyCode(0x3A);
    pub const INSERT: KeyCode = KeyCode(0x49);
    pub const HOME: KeyCode = KeyCode(0x4A);
    pub const PAGE_UP: KeyCode = KeyCode(0x4B);
    pub const DELETE: KeyCode = KeyCode(0x4C);
    pub const END: KeyCode = KeyCode(0x4D);
    pub const PAGE_DOWN: KeyCode = KeyCode(0x4E);
    pub const RIGHT: KeyCode = KeyCode(0x4F);
    pub const LEFT: KeyCode = KeyCode(0x50);
    pub const DOWN: KeyCode = KeyCode(0x51);
    pub const UP: KeyCode = KeyCode(0x52);

    pub const LEFT_CTRL: KeyCode = KeyCode(0xE0);
    pub const LEFT_SHIFT: KeyCode = KeyCode(0xE1);
    pub const LEFT_ALT: KeyCode = KeyCode(0xE2);
    pub const LEFT_GUI: KeyCode = KeyCode(0xE3);
    pub const RIGHT_CTRL: KeyCode = KeyCode(0xE4);
    pub const RIGHT_SHIFT: KeyCode = KeyCode(0xE5);
    pub const RIGHT_ALT: KeyCode = KeyCode(0xE6);
    pub const RIGHT_GUI: KeyCode = KeyCode(0xE7);

    /// Returns true if this is a usage the firmware can send
    ///
    /// Covers letters through the keypad/editing block (0x04..=0x65) and
    /// the eight modifiers.
    pub fn is_valid(self) -> bool {
        matches!(self.0, 0x04..=0x65 | 0xE0..=0xE7)
    }

    /// Returns true for the eight modifier keys
    pub fn is_modifier(self) -> bool {
        matches!(self.0, 0xE0..=0xE7)
    }

    /// Bit for this key in the boot report modifier byte (0 for non-modifiers)
    pub fn modifier_bit(self) -> u8 {
        if self.is_modifier() {
            1 << (self.0 - 0xE0)
        } else {
            0
        }
    }

    /// Look up a key by name (case-insensitive)
    ///
    /// Accepts single letters and digits, `F1`-`F12`, and the named keys and
    /// aliases in [`NAMED_KEYS`].
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        let bytes = name.as_bytes();

        if bytes.len() == 1 {
            let c = bytes[0].to_ascii_uppercase();
            return match c {
                b'A'..=b'Z' => Some(KeyCode(0x04 + (c - b'A'))),
                b'1'..=b'9' => Some(KeyCode(0x1E + (c - b'1'))),
                b'0' => Some(KeyCode(0x27)),
                _ => None,
            };
        }

        if (bytes.len() == 2 || bytes.len() == 3) && bytes[0].eq_ignore_ascii_case(&b'F') {
            if let Ok(n) = name[1..].parse::<u8>() {
                if (1..=12).contains(&n) {
                    return Some(KeyCode(Self::F1.0 + n - 1));
                }
            }
        }

        NAMED_KEYS
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, code)| *code)
    }
}

/// Named keys and their aliases
pub const NAMED_KEYS: &[(&str, KeyCode)] = &[
    // Modifiers
    ("LEFT_CONTROL", KeyCode::LEFT_CTRL),
    ("CONTROL", KeyCode::LEFT_CTRL),
    ("CTRL", KeyCode::LEFT_CTRL),
    ("LEFT_SHIFT", KeyCode::LEFT_SHIFT),
    ("SHIFT", KeyCode::LEFT_SHIFT),
    ("LEFT_ALT", KeyCode::LEFT_ALT),
    ("ALT", KeyCode::LEFT_ALT),
    ("LEFT_GUI", KeyCode::LEFT_GUI),
    ("GUI", KeyCode::LEFT_GUI),
    ("WIN", KeyCode::LEFT_GUI),
    ("CMD", KeyCode::LEFT_GUI),
    ("COMMAND", KeyCode::LEFT_GUI),
    ("RIGHT_CONTROL", KeyCode::RIGHT_CTRL),
    ("RCTRL", KeyCode::RIGHT_CTRL),
    ("RIGHT_SHIFT", KeyCode::RIGHT_SHIFT),
    ("RSHIFT", KeyCode::RIGHT_SHIFT),
    ("RIGHT_ALT", KeyCode::RIGHT_ALT),
    ("RALT", KeyCode::RIGHT_ALT),
    ("ALT_GR", KeyCode::RIGHT_ALT),
    ("RIGHT_GUI", KeyCode::RIGHT_GUI),
    ("RWIN", KeyCode::RIGHT_GUI),
    ("RCMD", KeyCode::RIGHT_GUI),
    // Common keys
    ("ENTER", KeyCode::ENTER),
    ("RETURN", KeyCode::ENTER),
    ("ESCAPE", KeyCode::ESCAPE),
    ("ESC", KeyCode::ESCAPE),
    ("BACKSPACE", KeyCode::BACKSPACE),
    ("TAB", KeyCode::TAB),
    ("SPACE", KeyCode::SPACE),
    ("SPACEBAR", KeyCode::SPACE),
    ("DELETE", KeyCode::DELETE),
    ("DEL", KeyCode::DELETE),
    // Arrows
    ("UP_ARROW", KeyCode::UP),
    ("UP", KeyCode::UP),
    ("DOWN_ARROW", KeyCode::DOWN),
    ("DOWN", KeyCode::DOWN),
    ("LEFT_ARROW", KeyCode::LEFT),
    ("LEFT", KeyCode::LEFT),
    ("RIGHT_ARROW", KeyCode::RIGHT),
    ("RIGHT", KeyCode::RIGHT),
    // Navigation
    ("PAGE_UP", KeyCode::PAGE_UP),
    ("PGUP", KeyCode::PAGE_UP),
    ("PAGE_DOWN", KeyCode::PAGE_DOWN),
    ("PGDN", KeyCode::PAGE_DOWN),
    ("HOME", KeyCode::HOME),
    ("END", KeyCode::END),
    ("INSERT", KeyCode::INSERT),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_and_digits() {
        assert_eq!(KeyCode::from_name("a"), Some(KeyCode::A));
        assert_eq!(KeyCode::from_name("Z"), Some(KeyCode::Z));
        assert_eq!(KeyCode::from_name("1"), Some(KeyCode(0x1E)));
        assert_eq!(KeyCode::from_name("0"), Some(KeyCode(0x27)));
    }

    #[test]
    fn test_function_keys() {
        assert_eq!(KeyCode::from_name("F1"), Some(KeyCode::F1));
        assert_eq!(KeyCode::from_name("f12"), Some(KeyCode(0x45)));
        assert_eq!(KeyCode::from_name("F13"), None);
        assert_eq!(KeyCode::from_name("F0"), None);
    }

    #[test]
    fn test_aliases() {
        assert_eq!(KeyCode::from_name("ctrl"), Some(KeyCode::LEFT_CTRL));
        assert_eq!(KeyCode::from_name("CMD"), Some(KeyCode::LEFT_GUI));
        assert_eq!(KeyCode::from_name("alt_gr"), Some(KeyCode::RIGHT_ALT));
        assert_eq!(KeyCode::from_name("PgDn"), Some(KeyCode::PAGE_DOWN));
        assert_eq!(KeyCode::from_name("  enter "), Some(KeyCode::ENTER));
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(KeyCode::from_name(""), None);
        assert_eq!(KeyCode::from_name("HYPER"), None);
        assert_eq!(KeyCode::from_name("!"), None);
    }

    #[test]
    fn test_validity_and_modifiers() {
        assert!(KeyCode::A.is_valid());
        assert!(KeyCode::RIGHT_GUI.is_valid());
        assert!(!KeyCode::NONE.is_valid());
        assert!(!KeyCode(0x80).is_valid());
        assert_eq!(KeyCode::LEFT_CTRL.modifier_bit(), 0x01);
        assert_eq!(KeyCode::RIGHT_GUI.modifier_bit(), 0x80);
        assert_eq!(KeyCode::A.modifier_bit(), 0);
    }
}
