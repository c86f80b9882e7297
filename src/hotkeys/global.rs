//! Global hotkey service backed by the `global-hotkey` crate.
//!
//! Registration happens on the thread that owns [`GlobalHotkeys`]. Pressed
//! events arrive on the crate's process-wide receiver; a forwarding thread
//! maps them back to [`Trigger`]s and pushes them onto the runtime channel.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use global_hotkey::{
    hotkey::{Code, HotKey, Modifiers as HkModifiers},
    Error as HotkeyError, GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use super::{HotkeyService, Key, RegistrationError, Trigger};

fn key_code(key: Key) -> Option<Code> {
    let code = match key {
        Key::Numpad(0) => Code::Numpad0,
        Key::Numpad(1) => Code::Numpad1,
        Key::Numpad(2) => Code::Numpad2,
        Key::Numpad(3) => Code::Numpad3,
        Key::Numpad(4) => Code::Numpad4,
        Key::Numpad(5) => Code::Numpad5,
        Key::Numpad(6) => Code::Numpad6,
        Key::Numpad(7) => Code::Numpad7,
        Key::Numpad(8) => Code::Numpad8,
        Key::Numpad(9) => Code::Numpad9,
        Key::NumpadDecimal => Code::NumpadDecimal,
        Key::NumpadAdd => Code::NumpadAdd,
        Key::NumpadSubtract => Code::NumpadSubtract,
        Key::NumpadMultiply => Code::NumpadMultiply,
        Key::NumpadDivide => Code::NumpadDivide,
        Key::Function(1) => Code::F1,
        Key::Function(2) => Code::F2,
        Key::Function(3) => Code::F3,
        Key::Function(4) => Code::F4,
        Key::Function(5) => Code::F5,
        Key::Function(6) => Code::F6,
        Key::Function(7) => Code::F7,
        Key::Function(8) => Code::F8,
        Key::Function(9) => Code::F9,
        Key::Function(10) => Code::F10,
        Key::Function(11) => Code::F11,
        Key::Function(12) => Code::F12,
        Key::Letter(c) => letter_code(c.to_ascii_uppercase())?,
        Key::Numpad(_) | Key::Function(_) => return None,
    };
    Some(code)
}

fn letter_code(c: char) -> Option<Code> {
    let code = match c {
        'A' => Code::KeyA,
        'B' => Code::KeyB,
        'C' => Code::KeyC,
        'D' => Code::KeyD,
        'E' => Code::KeyE,
        'F' => Code::KeyF,
        'G' => Code::KeyG,
        'H' => Code::KeyH,
        'I' => Code::KeyI,
        'J' => Code::KeyJ,
        'K' => Code::KeyK,
        'L' => Code::KeyL,
        'M' => Code::KeyM,
        'N' => Code::KeyN,
        'O' => Code::KeyO,
        'P' => Code::KeyP,
        'Q' => Code::KeyQ,
        'R' => Code::KeyR,
        'S' => Code::KeyS,
        'T' => Code::KeyT,
        'U' => Code::KeyU,
        'V' => Code::KeyV,
        'W' => Code::KeyW,
        'X' => Code::KeyX,
        'Y' => Code::KeyY,
        'Z' => Code::KeyZ,
        _ => return None,
    };
    Some(code)
}

/// Convert a trigger into the crate's hotkey description.
///
/// `None` for keys outside the supported ranges (e.g. `Key::Function(20)`).
pub fn to_hotkey(trigger: &Trigger) -> Option<HotKey> {
    let m = &trigger.modifiers;
    let mods = if m.is_empty() {
        None
    } else {
        let mut mods = HkModifiers::empty();
        if m.ctrl {
            mods |= HkModifiers::CONTROL;
        }
        if m.alt {
            mods |= HkModifiers::ALT;
        }
        if m.shift {
            mods |= HkModifiers::SHIFT;
        }
        if m.meta {
            mods |= HkModifiers::SUPER;
        }
        Some(mods)
    };
    Some(HotKey::new(mods, key_code(trigger.key)?))
}

/// Failures creating the OS hotkey service.
#[derive(Debug, Error)]
pub enum GlobalHotkeysError {
    #[error("no OS key code for trigger {0}")]
    UnsupportedKey(Trigger),

    #[error("trigger {0} is listed twice")]
    DuplicateTrigger(Trigger),

    #[error("hotkey manager unavailable: {0}")]
    Manager(#[from] HotkeyError),
}

fn describe(e: HotkeyError) -> String {
    match e {
        HotkeyError::AlreadyRegistered(hk) => {
            format!("already registered by another application (id {})", hk.id())
        }
        HotkeyError::FailedToRegister(msg) => format!("rejected by the system: {}", msg),
        HotkeyError::OsError(os_err) => format!("OS error: {}", os_err),
        other => other.to_string(),
    }
}

/// OS hotkey registration plus the id → trigger map used by the forwarder.
pub struct GlobalHotkeys {
    manager: GlobalHotKeyManager,
    ids: Arc<HashMap<u32, Trigger>>,
}

impl GlobalHotkeys {
    /// Create the manager. Must be called on the main thread.
    ///
    /// `triggers` lists every trigger that may ever be registered so events
    /// can be mapped back regardless of when they were enabled. Each must map
    /// to a distinct OS hotkey.
    pub fn new(triggers: impl IntoIterator<Item = Trigger>) -> Result<Self, GlobalHotkeysError> {
        let ids = id_map(triggers)?;
        let manager = GlobalHotKeyManager::new()?;

        info!("[Hotkeys] Global hotkey manager ready ({} triggers)", ids.len());
        Ok(Self {
            manager,
            ids: Arc::new(ids),
        })
    }

    /// Forward pressed hotkey events to `tx` until the receiver side closes.
    pub fn spawn_forwarder(&self, tx: UnboundedSender<Trigger>) -> std::io::Result<JoinHandle<()>> {
        let ids = Arc::clone(&self.ids);

        thread::Builder::new()
            .name("hotkey-forwarder".into())
            .spawn(move || {
                let receiver = GlobalHotKeyEvent::receiver();
                while let Ok(event) = receiver.recv() {
                    // Only respond to key PRESS, not release
                    if event.state != HotKeyState::Pressed {
                        continue;
                    }

                    let Some(trigger) = ids.get(&event.id) else {
                        debug!("[Hotkeys] Ignoring unknown hotkey id {}", event.id);
                        continue;
                    };

                    if tx.send(*trigger).is_err() {
                        debug!("[Hotkeys] Trigger channel closed, forwarder exiting");
                        break;
                    }
                }
            })
    }
}

fn id_map(
    triggers: impl IntoIterator<Item = Trigger>,
) -> Result<HashMap<u32, Trigger>, GlobalHotkeysError> {
    let mut ids = HashMap::new();
    for trigger in triggers {
        let hotkey = to_hotkey(&trigger).ok_or(GlobalHotkeysError::UnsupportedKey(trigger))?;
        if ids.insert(hotkey.id(), trigger).is_some() {
            return Err(GlobalHotkeysError::DuplicateTrigger(trigger));
        }
    }
    Ok(ids)
}

const NO_KEY_CODE: &str = "no OS key code for this key";

impl HotkeyService for GlobalHotkeys {
    fn register(&mut self, trigger: &Trigger) -> Result<(), RegistrationError> {
        let hotkey = to_hotkey(trigger).ok_or_else(|| RegistrationError::Register {
            trigger: *trigger,
            reason: NO_KEY_CODE.into(),
        })?;
        self.manager
            .register(hotkey)
            .map_err(|e| RegistrationError::Register {
                trigger: *trigger,
                reason: describe(e),
            })?;
        debug!("[Hotkeys] OS registered {}", trigger);
        Ok(())
    }

    fn unregister(&mut self, trigger: &Trigger) -> Result<(), RegistrationError> {
        let hotkey = to_hotkey(trigger).ok_or_else(|| RegistrationError::Unregister {
            trigger: *trigger,
            reason: NO_KEY_CODE.into(),
        })?;
        if let Err(e) = self.manager.unregister(hotkey) {
            warn!("[Hotkeys] Failed to unregister {}", trigger);
            return Err(RegistrationError::Unregister {
                trigger: *trigger,
                reason: describe(e),
            });
        }
        debug!("[Hotkeys] OS unregistered {}", trigger);
        Ok(())
    }
}
