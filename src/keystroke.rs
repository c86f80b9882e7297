//! Keystroke Translator
//!
//! Turns a macro's text into the ordered press/release sequence handed to the
//! input injector. Each character is looked up once in the active keyboard
//! layout; shifted characters are bracketed by their own Shift press/release,
//! and every sequence ends with an Enter tap to submit the line.

use std::borrow::Cow;
use std::fmt;

use tracing::debug;

/// Platform key identifier (an X11 keysym name for the xdotool backend).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCode(Cow<'static, str>);

impl KeyCode {
    pub const SHIFT: KeyCode = KeyCode(Cow::Borrowed("Shift_L"));
    pub const ENTER: KeyCode = KeyCode(Cow::Borrowed("Return"));

    pub const fn from_static(name: &'static str) -> Self {
        KeyCode(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        KeyCode(Cow::Owned(name.into()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single synthetic key transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    Press(KeyCode),
    Release(KeyCode),
}

/// Layout lookup result for one character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStroke {
    pub code: KeyCode,
    pub shift: bool,
}

/// Character-to-keycode mapping supplied by the keyboard layout.
pub trait KeyLayout {
    /// Returns `None` when the character cannot be typed on this layout.
    fn lookup(&self, ch: char) -> Option<KeyStroke>;
}

/// Press then release of a single key.
pub fn tap(code: KeyCode) -> [KeyEvent; 2] {
    [KeyEvent::Press(code.clone()), KeyEvent::Release(code)]
}

/// Translate `text` into key events, followed by a trailing Enter tap.
///
/// Characters the layout cannot map are skipped; the rest of the text is
/// still translated.
pub fn translate<L: KeyLayout + ?Sized>(text: &str, layout: &L) -> Vec<KeyEvent> {
    let mut events = Vec::with_capacity(text.len() * 2 + 2);

    for ch in text.chars() {
        let Some(stroke) = layout.lookup(ch) else {
            debug!("[Keystroke] No key for {:?}, skipping", ch);
            continue;
        };

        if stroke.shift {
            events.push(KeyEvent::Press(KeyCode::SHIFT));
        }
        events.extend(tap(stroke.code));
        if stroke.shift {
            events.push(KeyEvent::Release(KeyCode::SHIFT));
        }
    }

    events.extend(tap(KeyCode::ENTER));
    events
}

/// Number of events [`translate`] produces for `text`: 4 per shifted
/// character, 2 per plain character, 2 for the trailing Enter.
pub fn expected_len<L: KeyLayout + ?Sized>(text: &str, layout: &L) -> usize {
    text.chars()
        .filter_map(|ch| layout.lookup(ch))
        .map(|stroke| if stroke.shift { 4 } else { 2 })
        .sum::<usize>()
        + 2
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lowercase letters plain, uppercase shifted, digits plain, nothing else.
    struct TestLayout;

    impl KeyLayout for TestLayout {
        fn lookup(&self, ch: char) -> Option<KeyStroke> {
            if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
                Some(KeyStroke {
                    code: KeyCode::new(ch.to_string()),
                    shift: false,
                })
            } else if ch.is_ascii_uppercase() {
                Some(KeyStroke {
                    code: KeyCode::new(ch.to_ascii_lowercase().to_string()),
                    shift: true,
                })
            } else {
                None
            }
        }
    }

    fn key(name: &str) -> KeyCode {
        KeyCode::new(name)
    }

    #[test]
    fn translates_mixed_case() {
        let events = translate("Ab", &TestLayout);
        assert_eq!(
            events,
            vec![
                KeyEvent::Press(KeyCode::SHIFT),
                KeyEvent::Press(key("a")),
                KeyEvent::Release(key("a")),
                KeyEvent::Release(KeyCode::SHIFT),
                KeyEvent::Press(key("b")),
                KeyEvent::Release(key("b")),
                KeyEvent::Press(KeyCode::ENTER),
                KeyEvent::Release(KeyCode::ENTER),
            ]
        );
    }

    #[test]
    fn empty_text_is_just_enter() {
        assert_eq!(translate("", &TestLayout), tap(KeyCode::ENTER).to_vec());
    }

    #[test]
    fn length_follows_shift_count() {
        for text in ["", "abc", "ABC", "HeLLo123", "x"] {
            let shifted = text.chars().filter(char::is_ascii_uppercase).count();
            let plain = text.chars().count() - shifted;
            let events = translate(text, &TestLayout);
            assert_eq!(events.len(), 4 * shifted + 2 * plain + 2, "text {text:?}");
            assert_eq!(events.len(), expected_len(text, &TestLayout));
        }
    }

    #[test]
    fn unmapped_characters_are_skipped() {
        let events = translate("a?b", &TestLayout);
        assert_eq!(events.len(), 6);
        assert_eq!(events, translate("ab", &TestLayout));
        assert_eq!(expected_len("a?b", &TestLayout), 6);
    }

    #[test]
    fn shift_is_never_held_across_characters() {
        let events = translate("ABcD", &TestLayout);
        let mut held = false;
        let mut keys_while_held = 0;
        for event in &events {
            match event {
                KeyEvent::Press(code) if *code == KeyCode::SHIFT => {
                    assert!(!held);
                    held = true;
                    keys_while_held = 0;
                }
                KeyEvent::Release(code) if *code == KeyCode::SHIFT => {
                    assert!(held);
                    assert_eq!(keys_while_held, 2);
                    held = false;
                }
                _ if held => keys_while_held += 1,
                _ => {}
            }
        }
        assert!(!held);
    }
}
