//! Runtime Loop
//!
//! [`App`] is the single owner of all mutable state: the macro store, the
//! binding table and the OS-facing services. The loop receives triggers from
//! a channel and handles each one to completion before reading the next, so
//! nothing here needs locking.

use std::future::Future;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::hotkeys::{Action, BindingTable, Dispatched, HotkeyService, RegistrationError, Trigger};
use crate::input::{InjectError, Injector};
use crate::keystroke::{expected_len, tap, translate, KeyLayout};
use crate::store::{MacroStore, ParseError};

/// What handling one trigger did. Consumed by the loop for logging only.
#[derive(Debug)]
pub enum ActionOutcome {
    /// Unknown or disabled trigger.
    Ignored,
    Toggled {
        enabled: bool,
        failures: Vec<RegistrationError>,
    },
    Quit,
    BankSelected(usize),
    /// New macro index, or `None` if the bank is empty.
    MacroSelected(Option<usize>),
    Said {
        submitted: usize,
        accepted: usize,
    },
    NothingToSay,
    Reloaded,
    ReloadFailed(ParseError),
    InjectionFailed(InjectError),
}

/// Application context handed every trigger.
pub struct App<S, I, L> {
    store: MacroStore,
    bindings: BindingTable,
    hotkeys: S,
    injector: I,
    layout: L,
    config: Config,
    running: bool,
}

impl<S, I, L> App<S, I, L>
where
    S: HotkeyService,
    I: Injector,
    L: KeyLayout,
{
    pub fn new(store: MacroStore, hotkeys: S, injector: I, layout: L, config: Config) -> Self {
        let bindings = BindingTable::from_triggers(&config.triggers);
        Self {
            store,
            bindings,
            hotkeys,
            injector,
            layout,
            config,
            running: true,
        }
    }

    pub fn store(&self) -> &MacroStore {
        &self.store
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    pub fn hotkeys(&self) -> &S {
        &self.hotkeys
    }

    pub fn injector(&self) -> &I {
        &self.injector
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Register startup hotkeys according to the configured policy.
    pub fn start(&mut self) -> Vec<RegistrationError> {
        self.bindings
            .register_initial(&mut self.hotkeys, self.config.startup)
    }

    /// Dispatch one trigger and run its action.
    pub async fn handle(&mut self, trigger: Trigger) -> ActionOutcome {
        match self.bindings.dispatch(&trigger) {
            Some(dispatched) => self.perform(dispatched).await,
            None => {
                debug!("[Runtime] Ignoring trigger {}", trigger);
                ActionOutcome::Ignored
            }
        }
    }

    async fn perform(&mut self, dispatched: Dispatched) -> ActionOutcome {
        match dispatched.action {
            Action::Toggle => {
                let report = self
                    .bindings
                    .toggle_all_but(dispatched.index, &mut self.hotkeys);
                ActionOutcome::Toggled {
                    enabled: self.bindings.toggleables_enabled(),
                    failures: report.failures,
                }
            }
            Action::Quit => {
                self.running = false;
                ActionOutcome::Quit
            }
            Action::ShiftBank(delta) => {
                ActionOutcome::BankSelected(self.store.shift_bank(delta))
            }
            Action::ShiftMacro(delta) => {
                ActionOutcome::MacroSelected(self.store.shift_macro(delta))
            }
            Action::Say => self.say().await,
            Action::Reload => match self.store.reload(&self.config.macro_file) {
                Ok(()) => ActionOutcome::Reloaded,
                Err(e) => ActionOutcome::ReloadFailed(e),
            },
        }
    }

    /// Type the selected macro: open key, settle delay, text, Enter.
    async fn say(&mut self) -> ActionOutcome {
        let Some(text) = self.store.current_text().map(str::to_owned) else {
            return ActionOutcome::NothingToSay;
        };

        let open = tap(self.config.open_key.clone());
        match self.injector.inject(&open) {
            Ok(accepted) if accepted < open.len() => {
                warn!(
                    "[Runtime] Open key only partially injected ({}/{})",
                    accepted,
                    open.len()
                );
            }
            Ok(_) => {}
            Err(e) => return ActionOutcome::InjectionFailed(e),
        }

        tokio::time::sleep(self.config.settle_delay).await;

        let events = translate(&text, &self.layout);
        let submitted = expected_len(&text, &self.layout);
        debug_assert_eq!(events.len(), submitted);
        match self.injector.inject(&events) {
            Ok(accepted) => ActionOutcome::Said {
                submitted,
                accepted,
            },
            Err(e) => ActionOutcome::InjectionFailed(e),
        }
    }

    fn log_outcome(&self, outcome: &ActionOutcome) {
        match outcome {
            ActionOutcome::Ignored => {}
            ActionOutcome::Toggled { enabled, failures } => {
                info!(
                    "[Runtime] Macro hotkeys {}",
                    if *enabled { "enabled" } else { "disabled" }
                );
                for failure in failures {
                    warn!("[Runtime] {}", failure);
                }
            }
            ActionOutcome::Quit => info!("[Runtime] Quit requested"),
            ActionOutcome::BankSelected(_) | ActionOutcome::MacroSelected(_) => {
                info!("[Runtime] Selected {}", self.store.position());
            }
            ActionOutcome::Said {
                submitted,
                accepted,
            } if accepted < submitted => {
                warn!(
                    "[Runtime] Only put {} of {} key events on the input queue",
                    accepted, submitted
                );
            }
            ActionOutcome::Said { submitted, .. } => {
                info!("[Runtime] Said macro ({} key events)", submitted);
            }
            ActionOutcome::NothingToSay => {
                warn!("[Runtime] Nothing to say: {}", self.store.position());
            }
            ActionOutcome::Reloaded => {
                info!(
                    "[Runtime] Reloaded {}: {}",
                    self.config.macro_file.display(),
                    self.store.position()
                );
            }
            ActionOutcome::ReloadFailed(e) => {
                error!("[Runtime] Reload failed, keeping previous macros: {}", e);
            }
            ActionOutcome::InjectionFailed(e) => error!("[Runtime] {}", e),
        }
    }

    /// Handle triggers until quit, channel close, or `shutdown` resolves.
    ///
    /// All still-registered hotkeys are released before returning.
    pub async fn run_until<F>(&mut self, mut triggers: UnboundedReceiver<Trigger>, shutdown: F)
    where
        F: Future,
    {
        tokio::pin!(shutdown);

        info!("[Runtime] Waiting for hotkeys ({})", self.store.position());

        while self.running {
            tokio::select! {
                received = triggers.recv() => match received {
                    Some(trigger) => {
                        let outcome = self.handle(trigger).await;
                        self.log_outcome(&outcome);
                    }
                    None => {
                        warn!("[Runtime] Trigger channel closed");
                        break;
                    }
                },
                _ = &mut shutdown => {
                    info!("[Runtime] Shutdown signal received");
                    break;
                }
            }
        }

        self.shutdown();
    }

    /// Handle triggers until quit or Ctrl-C.
    pub async fn run(&mut self, triggers: UnboundedReceiver<Trigger>) {
        self.run_until(triggers, tokio::signal::ctrl_c()).await
    }

    fn shutdown(&mut self) {
        self.running = false;
        let failures = self.bindings.unregister_all(&mut self.hotkeys);
        for failure in &failures {
            warn!("[Runtime] {}", failure);
        }
        info!("[Runtime] Hotkeys released");
    }
}
