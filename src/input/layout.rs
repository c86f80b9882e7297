//! US-QWERTY keyboard layout and key name mappings
//! Keysym names: X11 `keysymdef.h` (xorgproto)
//!
//! Only printable ASCII (plus tab) is mapped. Symbols that sit on different
//! keys in other layouts (e.g. `@`, `"`, `#` on UK/DE boards) will be typed as
//! their US-QWERTY key, which is a known limitation.

use crate::keystroke::{KeyCode, KeyLayout, KeyStroke};

/// Keysym name and shift state for a non-alphanumeric character.
fn punctuation_key(ch: char) -> Option<(&'static str, bool)> {
    let mapped = match ch {
        ' ' => ("space", false),
        '\t' => ("Tab", false),

        // Unshifted punctuation
        '`' => ("grave", false),
        '-' => ("minus", false),
        '=' => ("equal", false),
        '[' => ("bracketleft", false),
        ']' => ("bracketright", false),
        '\\' => ("backslash", false),
        ';' => ("semicolon", false),
        '\'' => ("apostrophe", false),
        ',' => ("comma", false),
        '.' => ("period", false),
        '/' => ("slash", false),

        // Shifted number row
        '~' => ("grave", true),
        '!' => ("1", true),
        '@' => ("2", true),
        '#' => ("3", true),
        '$' => ("4", true),
        '%' => ("5", true),
        '^' => ("6", true),
        '&' => ("7", true),
        '*' => ("8", true),
        '(' => ("9", true),
        ')' => ("0", true),
        '_' => ("minus", true),
        '+' => ("equal", true),

        // Shifted punctuation
        '{' => ("bracketleft", true),
        '}' => ("bracketright", true),
        '|' => ("backslash", true),
        ':' => ("semicolon", true),
        '"' => ("apostrophe", true),
        '<' => ("comma", true),
        '>' => ("period", true),
        '?' => ("slash", true),

        _ => return None,
    };
    Some(mapped)
}

const LETTERS: [&str; 26] = [
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s",
    "t", "u", "v", "w", "x", "y", "z",
];

const DIGITS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

/// US-QWERTY character lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsLayout;

impl KeyLayout for UsLayout {
    fn lookup(&self, ch: char) -> Option<KeyStroke> {
        let (name, shift) = if ch.is_ascii_lowercase() {
            (LETTERS[(ch as u8 - b'a') as usize], false)
        } else if ch.is_ascii_uppercase() {
            (LETTERS[(ch as u8 - b'A') as usize], true)
        } else if ch.is_ascii_digit() {
            (DIGITS[(ch as u8 - b'0') as usize], false)
        } else {
            punctuation_key(ch)?
        };

        Some(KeyStroke {
            code: KeyCode::from_static(name),
            shift,
        })
    }
}

/// Map a configured key name to a key code
///
/// Accepts common aliases ("enter", "esc", "f5") and single printable
/// characters, which resolve through the US layout.
pub fn key_name_to_code(name: &str) -> Option<KeyCode> {
    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return UsLayout.lookup(ch.to_ascii_lowercase()).map(|stroke| stroke.code);
    }

    let code = match name.to_lowercase().as_str() {
        "return" | "enter" => KeyCode::ENTER,
        "escape" | "esc" => KeyCode::from_static("Escape"),
        "tab" => KeyCode::from_static("Tab"),
        "space" => KeyCode::from_static("space"),
        "slash" => KeyCode::from_static("slash"),
        "grave" | "backtick" => KeyCode::from_static("grave"),
        "shift" => KeyCode::SHIFT,

        // Function keys
        k if k.starts_with('f') => {
            let num: u32 = k[1..].parse().ok()?;
            if !(1..=12).contains(&num) {
                return None;
            }
            KeyCode::new(format!("F{}", num))
        }

        _ => return None,
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke(ch: char) -> (String, bool) {
        let s = UsLayout.lookup(ch).unwrap();
        (s.code.name().to_string(), s.shift)
    }

    #[test]
    fn letters_use_shift_for_uppercase() {
        assert_eq!(stroke('a'), ("a".to_string(), false));
        assert_eq!(stroke('Z'), ("z".to_string(), true));
    }

    #[test]
    fn number_row_symbols_are_shifted() {
        assert_eq!(stroke('1'), ("1".to_string(), false));
        assert_eq!(stroke('!'), ("1".to_string(), true));
        assert_eq!(stroke(')'), ("0".to_string(), true));
    }

    #[test]
    fn punctuation_maps_to_keysyms() {
        assert_eq!(stroke('.'), ("period".to_string(), false));
        assert_eq!(stroke('?'), ("slash".to_string(), true));
        assert_eq!(stroke(' '), ("space".to_string(), false));
        assert_eq!(stroke('"'), ("apostrophe".to_string(), true));
    }

    #[test]
    fn every_printable_ascii_character_is_mapped() {
        for byte in 0x20u8..0x7f {
            assert!(UsLayout.lookup(byte as char).is_some(), "{:?}", byte as char);
        }
    }

    #[test]
    fn non_ascii_is_not_found() {
        assert!(UsLayout.lookup('é').is_none());
        assert!(UsLayout.lookup('\n').is_none());
    }

    #[test]
    fn key_names_resolve() {
        assert_eq!(key_name_to_code("t").unwrap().name(), "t");
        assert_eq!(key_name_to_code("T").unwrap().name(), "t");
        assert_eq!(key_name_to_code("Enter").unwrap(), KeyCode::ENTER);
        assert_eq!(key_name_to_code("f5").unwrap().name(), "F5");
        assert!(key_name_to_code("f13").is_none());
        assert!(key_name_to_code("hyper").is_none());
    }
}
