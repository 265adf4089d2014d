//! # TUI Adapter
//!
//! The ratatui-specific layer. Owns the terminal, turns crossterm input into
//! [`Event`]s, feeds them to the [`Controller`] and hands the resulting
//! effects to the [`EffectRunner`].
//!
//! ```text
//!  crossterm ──▶ Event ──▶ Controller::update ──▶ Effect ──▶ EffectRunner
//!                  ▲                                              │
//!                  └──────── Event::Client / Event::Sync ◀────────┘
//! ```
//!
//! ## Redraw Strategy
//!
//! The loop only redraws after something happened: terminal input or a
//! background result. When idle it sleeps in the input poll.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call, making blinking cursors appear erratic during redraws.

pub mod component;
pub mod components;
pub mod controller;
pub mod effect;
pub mod event;
pub mod login;
pub mod modes;
pub mod registry;
pub mod runner;

use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use log::{debug, info, warn};

use crate::client::ChatClient;
use crate::client::gateway::spawn_gateway;
use crate::core::config::ResolvedConfig;
use crate::core::state::SessionState;
use controller::Controller;
use event::{Event, poll_event_immediate, poll_event_timeout};
use modes::Mode;
use modes::server::ServerAction;
use modes::server_selection::ServerSelectionAction;
use registry::ModeRegistry;
use runner::{EffectRunner, Flow};

const POLL_TIMEOUT: Duration = Duration::from_millis(100);

pub(crate) struct TerminalModeGuard;

impl TerminalModeGuard {
    pub(crate) fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol is enabled unconditionally; terminals that
        // don't support it ignore it.
        execute!(
            stdout(),
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (bracketed paste, steady block cursor, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// One action per mode, created once for the whole program.
pub fn build_registry(state: &Arc<SessionState>) -> ModeRegistry {
    let mut registry = ModeRegistry::new();
    registry.register(
        Mode::ServerSelection,
        Box::new(ServerSelectionAction::new(state.clone())),
    );
    registry.register(Mode::Server, Box::new(ServerAction::new(state.clone())));
    registry
}

/// Runs the main UI until the user quits.
///
/// Must be called from within a tokio runtime.
pub fn run(
    client: Arc<dyn ChatClient>,
    token: String,
    config: ResolvedConfig,
) -> std::io::Result<()> {
    let state = Arc::new(SessionState::new());
    let (tx, rx) = mpsc::channel::<Event>();
    let gateway = spawn_gateway(
        config.gateway_url.clone(),
        token,
        state.clone(),
        tx.clone(),
    );

    let mut terminal = ratatui::init();
    let guard = TerminalModeGuard::new();
    if let Err(e) = &guard {
        warn!("Failed to enable terminal modes: {}", e);
    }

    let result = (|| -> std::io::Result<()> {
        let size = terminal.size()?;
        state.set_dimensions(size.width, size.height);

        let mut controller = Controller::initial(build_registry(&state), state.clone());
        let mut runner = EffectRunner::new(client, state.clone(), tx, config.sync);
        if runner.run(controller.init()) == Flow::Quit {
            return Ok(());
        }

        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| controller.render(f))?;
                needs_redraw = false;
            }

            let mut events = Vec::new();
            if let Some(event) = poll_event_timeout(POLL_TIMEOUT)? {
                events.push(event);
                while let Some(event) = poll_event_immediate()? {
                    events.push(event);
                }
            }
            events.extend(rx.try_iter());

            for event in events {
                needs_redraw = true;
                if event.is_background() {
                    debug!("Event loop received: {:?}", event);
                }
                let effect = controller.update(&event);
                if runner.run(effect) == Flow::Quit || controller.quitting() {
                    info!("Quitting");
                    return Ok(());
                }
            }
        }
    })();

    gateway.abort();
    drop(guard);
    ratatui::restore();
    result
}
