/*!
 * Chatmacro Library
 *
 * Banks of pre-written chat lines, cycled and typed into the focused window
 * through global hotkeys.
 */

pub mod config;
pub mod hotkeys;
pub mod input;
pub mod keystroke;
pub mod runtime;
pub mod store;
pub mod text;

// Re-export commonly used types
pub use config::Config;
pub use hotkeys::{Action, BindingTable, HotkeyService, Trigger};
pub use input::{Injector, UsLayout};
pub use keystroke::{translate, KeyCode, KeyEvent, KeyLayout};
pub use runtime::{ActionOutcome, App};
pub use store::{MacroStore, ParseError};
