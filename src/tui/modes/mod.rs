//! # Modes
//!
//! A mode is a full-screen interaction context. Exactly one is active at a
//! time; the [`Controller`](crate::tui::controller::Controller) routes every
//! event to it and swaps modes when it asks to.
//!
//! ```text
//!   ServerSelection ──(server fetched)──▶ Server
//!          ▲                                 │
//!          └────────────(Esc)────────────────┘
//! ```

pub mod server;
pub mod server_selection;

use std::fmt;

use ratatui::Frame;
use ratatui::layout::Rect;

use crate::tui::effect::Effect;
use crate::tui::event::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    ServerSelection,
    Server,
}

/// Why a mode refused to become active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnterError {
    /// Server mode was entered before a server was selected.
    NoServerSelected,
}

impl fmt::Display for EnterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnterError::NoServerSelected => write!(f, "no server selected"),
        }
    }
}

impl std::error::Error for EnterError {}

/// The behavior bound to a mode.
///
/// One instance per mode lives for the whole program and is re-entered every
/// time its mode becomes active.
pub trait Action {
    /// (Re)initializes the mode as it becomes active.
    fn enter(&mut self) -> Result<Effect, EnterError>;

    fn update(&mut self, event: &Event) -> Effect;

    /// Takes the pending transition request, if any.
    fn wants_mode_change(&mut self) -> Option<Mode>;

    fn render(&mut self, frame: &mut Frame, area: Rect);
}
