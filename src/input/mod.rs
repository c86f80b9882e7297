//! Synthetic keyboard input: layout lookup and event injection

use thiserror::Error;

use crate::keystroke::KeyEvent;

pub mod layout;

pub use layout::{key_name_to_code, UsLayout};

// Linux implementation
#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "linux")]
pub use linux::XdotoolInjector as PlatformInjector;

/// Injection failures that prevented any event from being submitted.
#[derive(Debug, Error)]
pub enum InjectError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("input injection is not implemented on {0}")]
    Unsupported(&'static str),
}

/// Hands key events to the OS input queue.
pub trait Injector {
    /// Submit `events` in order and return how many were accepted.
    fn inject(&mut self, events: &[KeyEvent]) -> Result<usize, InjectError>;
}

// Stub for platforms without an injection backend yet
#[cfg(not(target_os = "linux"))]
#[derive(Debug, Default)]
pub struct PlatformInjector;

#[cfg(not(target_os = "linux"))]
impl PlatformInjector {
    pub fn new() -> Self {
        Self
    }

    pub fn with_delay(_delay_ms: u32) -> Self {
        Self
    }
}

#[cfg(not(target_os = "linux"))]
impl Injector for PlatformInjector {
    fn inject(&mut self, _events: &[KeyEvent]) -> Result<usize, InjectError> {
        Err(InjectError::Unsupported(std::env::consts::OS))
    }
}
