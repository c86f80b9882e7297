/*!
 * Linux Input Injection
 *
 * Uses xdotool to push key press/release events into the X11 input queue.
 * A whole event sequence goes out as one chained xdotool invocation so the
 * keystrokes of a macro cannot interleave with anything else we send.
 */

use std::process::Command;

use tracing::{debug, info, warn};

use super::{InjectError, Injector};
use crate::keystroke::KeyEvent;

const XDOTOOL: &str = "xdotool";

/// Default delay between chained key events (milliseconds)
const KEY_DELAY_MS: u32 = 0;

/// Injector backed by `xdotool keydown` / `xdotool keyup`.
#[derive(Debug, Clone)]
pub struct XdotoolInjector {
    delay_ms: u32,
}

impl XdotoolInjector {
    pub fn new() -> Self {
        Self {
            delay_ms: KEY_DELAY_MS,
        }
    }

    /// Injector that waits `delay_ms` after every key event.
    pub fn with_delay(delay_ms: u32) -> Self {
        Self { delay_ms }
    }

    /// Build the chained argument list for one event sequence.
    fn build_args(&self, events: &[KeyEvent]) -> Vec<String> {
        let mut args = Vec::with_capacity(events.len() * 4);
        for event in events {
            let (verb, code) = match event {
                KeyEvent::Press(code) => ("keydown", code),
                KeyEvent::Release(code) => ("keyup", code),
            };
            args.push(verb.to_string());
            if self.delay_ms > 0 {
                args.push("--delay".to_string());
                args.push(self.delay_ms.to_string());
            }
            args.push(code.name().to_string());
        }
        args
    }
}

impl Default for XdotoolInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl Injector for XdotoolInjector {
    fn inject(&mut self, events: &[KeyEvent]) -> Result<usize, InjectError> {
        if events.is_empty() {
            return Ok(0);
        }

        let args = self.build_args(events);
        debug!("xdotool command: {} args", args.len());

        let output = Command::new(XDOTOOL)
            .args(&args)
            .output()
            .map_err(|source| InjectError::Spawn {
                program: XDOTOOL,
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("xdotool key chain failed: {}", stderr.trim());
            return Ok(0);
        }

        info!("Injected {} key events", events.len());
        Ok(events.len())
    }
}

/// Report whether xdotool is usable in this session.
pub fn xdotool_available() -> bool {
    let session_type = std::env::var("XDG_SESSION_TYPE").unwrap_or_else(|_| "unknown".to_string());
    if session_type == "wayland" {
        warn!("Wayland session detected; xdotool only reaches XWayland windows");
    }

    Command::new("which")
        .arg(XDOTOOL)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
