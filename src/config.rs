//! Runtime configuration.
//!
//! Sources, lowest to highest precedence: built-in defaults, the optional INI
//! file (`$CHATMACRO_CONFIG`, else `<config dir>/chatmacro/config.ini`),
//! environment overrides, and the positional macro-file argument.
//!
//! ```ini
//! [macros]
//! file = macros.txt
//!
//! [say]
//! open_key = t
//! settle_delay_ms = 50
//! key_delay_ms = 0
//!
//! [hotkeys]
//! start_enabled = false
//! toggle = Numpad0
//! quit = NumpadDecimal
//! bank_prev = Numpad1
//! bank_next = Numpad2
//! macro_prev = Numpad4
//! macro_next = Numpad5
//! say = Numpad8
//! reload = Numpad9
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use configparser::ini::Ini;
use thiserror::Error;
use tracing::{debug, info};

use crate::hotkeys::{HotkeyTriggers, StartupPolicy, Trigger};
use crate::input::key_name_to_code;
use crate::keystroke::KeyCode;

pub const DEFAULT_MACRO_FILE: &str = "macros.txt";
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 50;
pub const CONFIG_ENV: &str = "CHATMACRO_CONFIG";
pub const SETTLE_ENV: &str = "CHATMACRO_SETTLE_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config file {}: {reason}", .path.display())]
    Load { path: PathBuf, reason: String },

    #[error("invalid value {value:?} for [{section}] {key}: {reason}")]
    Invalid {
        section: &'static str,
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Macro file to load at startup and on reload.
    pub macro_file: PathBuf,
    /// Key tapped before typing a macro to open the target's chat box.
    pub open_key: KeyCode,
    /// Wait between the open key and the macro text.
    pub settle_delay: Duration,
    /// Delay between individual injected key events.
    pub key_delay_ms: u32,
    pub startup: StartupPolicy,
    pub triggers: HotkeyTriggers,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            macro_file: PathBuf::from(DEFAULT_MACRO_FILE),
            open_key: KeyCode::from_static("t"),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            key_delay_ms: 0,
            startup: StartupPolicy::default(),
            triggers: HotkeyTriggers::default(),
        }
    }
}

fn invalid(
    section: &'static str,
    key: &'static str,
    value: impl Into<String>,
    reason: impl Into<String>,
) -> ConfigError {
    ConfigError::Invalid {
        section,
        key,
        value: value.into(),
        reason: reason.into(),
    }
}

impl Config {
    /// Parse INI text on top of the defaults.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let mut ini = Ini::new();
        ini.read(text.to_string())
            .map_err(|reason| ConfigError::Load {
                path: PathBuf::from("<inline>"),
                reason,
            })?;
        Self::from_ini(&ini)
    }

    /// Load an INI file on top of the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut ini = Ini::new();
        ini.load(path).map_err(|reason| ConfigError::Load {
            path: path.to_path_buf(),
            reason,
        })?;
        info!("[Config] Loaded {}", path.display());
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(file) = ini.get("macros", "file") {
            config.macro_file = PathBuf::from(file);
        }

        if let Some(name) = ini.get("say", "open_key") {
            config.open_key = key_name_to_code(&name)
                .ok_or_else(|| invalid("say", "open_key", &name, "unknown key name"))?;
        }

        if let Some(ms) = get_uint(ini, "say", "settle_delay_ms")? {
            config.settle_delay = Duration::from_millis(ms);
        }

        if let Some(ms) = get_uint(ini, "say", "key_delay_ms")? {
            config.key_delay_ms = u32::try_from(ms)
                .map_err(|_| invalid("say", "key_delay_ms", ms.to_string(), "too large"))?;
        }

        let start_enabled = ini
            .getboolcoerce("hotkeys", "start_enabled")
            .map_err(|reason| {
                let value = raw(ini, "hotkeys", "start_enabled");
                invalid("hotkeys", "start_enabled", value, reason)
            })?;
        if let Some(enabled) = start_enabled {
            config.startup = if enabled {
                StartupPolicy::AllEnabled
            } else {
                StartupPolicy::AlwaysOnOnly
            };
        }

        let t = &mut config.triggers;
        for (key, slot) in [
            ("toggle", &mut t.toggle),
            ("quit", &mut t.quit),
            ("bank_prev", &mut t.bank_prev),
            ("bank_next", &mut t.bank_next),
            ("macro_prev", &mut t.macro_prev),
            ("macro_next", &mut t.macro_next),
            ("say", &mut t.say),
            ("reload", &mut t.reload),
        ] {
            if let Some(value) = ini.get("hotkeys", key) {
                *slot = value
                    .parse::<Trigger>()
                    .map_err(|e| invalid("hotkeys", key, &value, e.to_string()))?;
            }
        }

        // Each trigger may drive a single action
        let named = config.triggers.named();
        for (i, (key, trigger)) in named.iter().enumerate() {
            if let Some((other, _)) = named[..i].iter().find(|(_, t)| t == trigger) {
                let reason = format!("already bound to {}", other);
                return Err(invalid("hotkeys", *key, trigger.to_string(), reason));
            }
        }

        Ok(config)
    }

    /// Build the effective configuration for this process.
    pub fn resolve(cli_macro_file: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = match config_file_path() {
            Some(path) => Self::load(&path)?,
            None => {
                debug!("[Config] No config file, using defaults");
                Self::default()
            }
        };

        if let Ok(value) = std::env::var(SETTLE_ENV) {
            let ms: u64 = value.parse().map_err(|_| {
                let reason = format!("{} is not a number", SETTLE_ENV);
                invalid("say", "settle_delay_ms", &value, reason)
            })?;
            config.settle_delay = Duration::from_millis(ms);
        }

        if let Some(path) = cli_macro_file {
            config.macro_file = path;
        }

        Ok(config)
    }
}

fn raw(ini: &Ini, section: &str, key: &str) -> String {
    ini.get(section, key).unwrap_or_default()
}

fn get_uint(
    ini: &Ini,
    section: &'static str,
    key: &'static str,
) -> Result<Option<u64>, ConfigError> {
    ini.getuint(section, key)
        .map_err(|reason| invalid(section, key, raw(ini, section, key), reason))
}

/// Config file location: `$CHATMACRO_CONFIG` if set, else the per-user file if it exists.
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|dir| dir.join("chatmacro").join("config.ini"))
        .filter(|path| path.is_file())
}
