//! Hotkey Dispatch Table
//!
//! A fixed, ordered table of bindings from global triggers to actions. Two
//! bindings (toggle and quit) are always on: registered at startup and never
//! touched again. Every other binding can be switched on and off as a group by
//! the toggle action, which is how the user parks the macro keys while
//! typing normally.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, info, warn};

pub mod global;

/// Keys usable as global triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Numpad digit 0-9.
    Numpad(u8),
    NumpadDecimal,
    NumpadAdd,
    NumpadSubtract,
    NumpadMultiply,
    NumpadDivide,
    /// Function key F1-F12.
    Function(u8),
    /// Letter key A-Z, stored uppercase.
    Letter(char),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Numpad(n) => write!(f, "Numpad{}", n),
            Key::NumpadDecimal => f.write_str("NumpadDecimal"),
            Key::NumpadAdd => f.write_str("NumpadAdd"),
            Key::NumpadSubtract => f.write_str("NumpadSubtract"),
            Key::NumpadMultiply => f.write_str("NumpadMultiply"),
            Key::NumpadDivide => f.write_str("NumpadDivide"),
            Key::Function(n) => write!(f, "F{}", n),
            Key::Letter(c) => write!(f, "{}", c),
        }
    }
}

impl FromStr for Key {
    type Err = TriggerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let key = match lower.as_str() {
            "numpaddecimal" | "numpad." | "decimal" => Key::NumpadDecimal,
            "numpadadd" | "numpad+" => Key::NumpadAdd,
            "numpadsubtract" | "numpad-" => Key::NumpadSubtract,
            "numpadmultiply" | "numpad*" => Key::NumpadMultiply,
            "numpaddivide" | "numpad/" => Key::NumpadDivide,
            k if k.len() == 1 && k.as_bytes()[0].is_ascii_lowercase() => {
                Key::Letter(k.as_bytes()[0].to_ascii_uppercase() as char)
            }
            k if k.starts_with("numpad") => match k["numpad".len()..].parse::<u8>() {
                Ok(n) if n <= 9 => Key::Numpad(n),
                _ => return Err(TriggerParseError::UnknownKey(s.to_string())),
            },
            k if k.starts_with('f') => match k[1..].parse::<u8>() {
                Ok(n) if (1..=12).contains(&n) => Key::Function(n),
                _ => return Err(TriggerParseError::UnknownKey(s.to_string())),
            },
            _ => return Err(TriggerParseError::UnknownKey(s.to_string())),
        };
        Ok(key)
    }
}

/// Modifier keys that must be held for a trigger to fire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

/// A key plus modifier combination recognised by the hotkey service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Trigger {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl Trigger {
    pub const fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.modifiers;
        let held_names = [
            (m.ctrl, "Ctrl"),
            (m.alt, "Alt"),
            (m.shift, "Shift"),
            (m.meta, "Meta"),
        ];
        for (held, name) in held_names {
            if held {
                write!(f, "{}+", name)?;
            }
        }
        write!(f, "{}", self.key)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TriggerParseError {
    #[error("unknown trigger key {0:?}")]
    UnknownKey(String),

    #[error("unknown modifier {0:?}")]
    UnknownModifier(String),
}

impl FromStr for Trigger {
    type Err = TriggerParseError;

    /// Parses `"Ctrl+Alt+Numpad0"` style strings; the last segment is the key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let key_part = parts.pop().unwrap_or_default();
        let key: Key = key_part.parse()?;

        let mut modifiers = Modifiers::NONE;
        for part in parts {
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => modifiers.ctrl = true,
                "alt" | "option" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "meta" | "super" | "cmd" | "win" => modifiers.meta = true,
                _ => return Err(TriggerParseError::UnknownModifier(part.to_string())),
            }
        }

        Ok(Trigger { key, modifiers })
    }
}

/// What a binding does when its trigger fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Flip every toggleable binding on/off.
    Toggle,
    Quit,
    ShiftBank(i32),
    ShiftMacro(i32),
    /// Type the selected macro into the focused window.
    Say,
    /// Re-read the macro file.
    Reload,
}

impl Action {
    /// Toggle and quit stay registered for the whole session.
    pub fn is_always_on(&self) -> bool {
        matches!(self, Action::Toggle | Action::Quit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyBinding {
    pub trigger: Trigger,
    pub action: Action,
    pub always_on: bool,
    pub registered: bool,
}

impl HotkeyBinding {
    pub fn new(trigger: Trigger, action: Action) -> Self {
        Self {
            trigger,
            action,
            always_on: action.is_always_on(),
            registered: false,
        }
    }
}

/// Trigger assignment for every action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyTriggers {
    pub toggle: Trigger,
    pub quit: Trigger,
    pub bank_prev: Trigger,
    pub bank_next: Trigger,
    pub macro_prev: Trigger,
    pub macro_next: Trigger,
    pub say: Trigger,
    pub reload: Trigger,
}

impl Default for HotkeyTriggers {
    fn default() -> Self {
        Self {
            toggle: Trigger::new(Key::Numpad(0)),
            quit: Trigger::new(Key::NumpadDecimal),
            bank_prev: Trigger::new(Key::Numpad(1)),
            bank_next: Trigger::new(Key::Numpad(2)),
            macro_prev: Trigger::new(Key::Numpad(4)),
            macro_next: Trigger::new(Key::Numpad(5)),
            say: Trigger::new(Key::Numpad(8)),
            reload: Trigger::new(Key::Numpad(9)),
        }
    }
}

impl HotkeyTriggers {
    /// Every trigger paired with its config key, in table order.
    pub fn named(&self) -> [(&'static str, Trigger); 8] {
        [
            ("toggle", self.toggle),
            ("quit", self.quit),
            ("bank_prev", self.bank_prev),
            ("bank_next", self.bank_next),
            ("macro_prev", self.macro_prev),
            ("macro_next", self.macro_next),
            ("say", self.say),
            ("reload", self.reload),
        ]
    }

    pub fn all(&self) -> [Trigger; 8] {
        self.named().map(|(_, trigger)| trigger)
    }
}

/// Whether toggleable bindings are live right after startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StartupPolicy {
    /// Only always-on bindings are registered; the first toggle enables the rest.
    #[default]
    AlwaysOnOnly,
    /// Every binding is registered at startup.
    AllEnabled,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("failed to register {trigger}: {reason}")]
    Register { trigger: Trigger, reason: String },

    #[error("failed to unregister {trigger}: {reason}")]
    Unregister { trigger: Trigger, reason: String },
}

/// OS-level global hotkey registration.
pub trait HotkeyService {
    fn register(&mut self, trigger: &Trigger) -> Result<(), RegistrationError>;
    fn unregister(&mut self, trigger: &Trigger) -> Result<(), RegistrationError>;
}

/// Result of a group toggle.
#[derive(Debug, Default)]
pub struct ToggleReport {
    pub flipped: usize,
    pub failures: Vec<RegistrationError>,
}

/// A dispatched trigger: the binding that fired and its action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatched {
    pub index: usize,
    pub action: Action,
}

/// Ordered table of hotkey bindings.
#[derive(Debug, Clone)]
pub struct BindingTable {
    bindings: Vec<HotkeyBinding>,
}

impl BindingTable {
    pub fn new(bindings: Vec<HotkeyBinding>) -> Self {
        Self { bindings }
    }

    /// The standard table: toggle, quit, bank and macro navigation, say, reload.
    pub fn from_triggers(triggers: &HotkeyTriggers) -> Self {
        Self::new(vec![
            HotkeyBinding::new(triggers.toggle, Action::Toggle),
            HotkeyBinding::new(triggers.quit, Action::Quit),
            HotkeyBinding::new(triggers.bank_prev, Action::ShiftBank(-1)),
            HotkeyBinding::new(triggers.bank_next, Action::ShiftBank(1)),
            HotkeyBinding::new(triggers.macro_prev, Action::ShiftMacro(-1)),
            HotkeyBinding::new(triggers.macro_next, Action::ShiftMacro(1)),
            HotkeyBinding::new(triggers.say, Action::Say),
            HotkeyBinding::new(triggers.reload, Action::Reload),
        ])
    }

    pub fn bindings(&self) -> &[HotkeyBinding] {
        &self.bindings
    }

    /// Whether the toggleable group is currently live.
    pub fn toggleables_enabled(&self) -> bool {
        self.bindings
            .iter()
            .filter(|b| !b.always_on)
            .any(|b| b.registered)
    }

    /// Register the always-on bindings and, under [`StartupPolicy::AllEnabled`],
    /// the toggleable ones too. Failures are returned, not fatal.
    pub fn register_initial(
        &mut self,
        service: &mut dyn HotkeyService,
        policy: StartupPolicy,
    ) -> Vec<RegistrationError> {
        let mut failures = Vec::new();

        for binding in &mut self.bindings {
            if !binding.always_on && policy == StartupPolicy::AlwaysOnOnly {
                continue;
            }
            match service.register(&binding.trigger) {
                Ok(()) => {
                    binding.registered = true;
                    debug!("[Hotkeys] Registered {} -> {:?}", binding.trigger, binding.action);
                }
                Err(e) => {
                    warn!("[Hotkeys] {}", e);
                    failures.push(e);
                }
            }
        }

        info!(
            "[Hotkeys] Startup registration done ({:?}, {} failures)",
            policy,
            failures.len()
        );
        failures
    }

    /// Flip registration of every toggleable binding other than `idx`.
    ///
    /// A failed (un)registration leaves that binding's state unchanged and is
    /// recorded in the report; the remaining bindings are still processed.
    pub fn toggle_all_but(&mut self, idx: usize, service: &mut dyn HotkeyService) -> ToggleReport {
        let mut report = ToggleReport::default();

        for (i, binding) in self.bindings.iter_mut().enumerate() {
            if i == idx || binding.always_on {
                continue;
            }

            let result = if binding.registered {
                service.unregister(&binding.trigger)
            } else {
                service.register(&binding.trigger)
            };

            match result {
                Ok(()) => {
                    binding.registered = !binding.registered;
                    report.flipped += 1;
                }
                Err(e) => {
                    warn!("[Hotkeys] {}", e);
                    report.failures.push(e);
                }
            }
        }

        report
    }

    /// Look up the action for a delivered trigger.
    ///
    /// Unknown or currently unregistered triggers yield `None`.
    pub fn dispatch(&self, trigger: &Trigger) -> Option<Dispatched> {
        self.bindings
            .iter()
            .position(|b| b.registered && b.trigger == *trigger)
            .map(|index| Dispatched {
                index,
                action: self.bindings[index].action,
            })
    }

    /// Unregister everything still registered. Used at shutdown.
    pub fn unregister_all(&mut self, service: &mut dyn HotkeyService) -> Vec<RegistrationError> {
        let mut failures = Vec::new();
        for binding in self.bindings.iter_mut().filter(|b| b.registered) {
            match service.unregister(&binding.trigger) {
                Ok(()) => binding.registered = false,
                Err(e) => {
                    warn!("[Hotkeys] {}", e);
                    failures.push(e);
                }
            }
        }
        failures
    }
}
