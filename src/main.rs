//! chatmacro: type pre-written chat lines into the focused window from global hotkeys.
//!
//! Usage: `chatmacro [MACRO_FILE]` (default `macros.txt`).
//!
//! Default hotkeys:
//!   NUMPAD .  quit
//!   NUMPAD 0  toggle the macro hotkeys on / off
//!   NUMPAD 1  previous bank
//!   NUMPAD 2  next bank
//!   NUMPAD 4  previous macro
//!   NUMPAD 5  next macro
//!   NUMPAD 8  say the selected macro
//!   NUMPAD 9  reload the macro file

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatmacro::hotkeys::global::GlobalHotkeys;
use chatmacro::input::PlatformInjector;
use chatmacro::{App, Config, MacroStore, UsLayout};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run() -> Result<()> {
    info!("chatmacro v{}", env!("CARGO_PKG_VERSION"));

    let cli_macro_file = std::env::args_os().nth(1).map(PathBuf::from);
    let config = Config::resolve(cli_macro_file).context("Failed to load configuration")?;

    let store = MacroStore::load(&config.macro_file).context("Couldn't parse macro file")?;
    if store.is_empty() {
        warn!("[Main] {} has no banks", config.macro_file.display());
    }

    #[cfg(target_os = "linux")]
    {
        if !chatmacro::input::linux::xdotool_available() {
            warn!("[Main] xdotool not found; macros cannot be typed");
        }
    }

    let hotkeys = GlobalHotkeys::new(config.triggers.all())
        .context("Failed to create global hotkey manager")?;

    let (tx, rx) = mpsc::unbounded_channel();
    hotkeys
        .spawn_forwarder(tx)
        .context("Failed to start hotkey forwarder")?;

    let (toggle, quit) = (config.triggers.toggle, config.triggers.quit);
    let injector = PlatformInjector::with_delay(config.key_delay_ms);
    let mut app = App::new(store, hotkeys, injector, UsLayout, config);

    for failure in app.start() {
        warn!("[Main] {}", failure);
    }

    info!("[Main] Toggle macro hotkeys with {}, quit with {}", toggle, quit);

    app.run(rx).await;

    info!("[Main] Bye");
    Ok(())
}
