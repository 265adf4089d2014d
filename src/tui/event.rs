use std::io;
use std::time::Duration;

use crossterm::event::{self, KeyCode, KeyEventKind, KeyModifiers};

use crate::client::ClientEvent;
use crate::core::sync::SyncEvent;

/// Everything the controller reacts to: terminal input plus results of
/// background work.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Ctrl+C. Always ends the program.
    Interrupt,
    NextTab,
    PrevTab,
    Submit,
    Escape,
    InputChar(char),
    Paste(String), // Bracketed paste
    Backspace,
    Delete,
    CursorLeft,
    CursorRight,
    CursorUp,
    CursorDown,
    PageUp,
    PageDown,
    Home,
    End,
    Resize(u16, u16),
    Client(ClientEvent),
    Sync(SyncEvent),
}

impl Event {
    /// Results of background work (as opposed to terminal input).
    pub fn is_background(&self) -> bool {
        matches!(self, Event::Client(_) | Event::Sync(_))
    }
}

impl From<ClientEvent> for Event {
    fn from(event: ClientEvent) -> Self {
        Event::Client(event)
    }
}

impl From<SyncEvent> for Event {
    fn from(event: SyncEvent) -> Self {
        Event::Sync(event)
    }
}

/// Poll for a terminal event without blocking (returns immediately)
pub fn poll_event_immediate() -> io::Result<Option<Event>> {
    poll_event_timeout(Duration::ZERO)
}

/// Poll for a terminal event, blocking up to `timeout`.
pub fn poll_event_timeout(timeout: Duration) -> io::Result<Option<Event>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }
    Ok(translate(event::read()?))
}

/// Maps a raw crossterm event onto an [`Event`]. Key releases are dropped.
pub fn translate(raw: event::Event) -> Option<Event> {
    match raw {
        event::Event::Key(key) => {
            if key.kind == KeyEventKind::Release {
                return None;
            }
            log::debug!("Key event: {:?} with modifiers {:?}", key.code, key.modifiers);
            match (key.modifiers, key.code) {
                (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(Event::Interrupt),
                (m, KeyCode::Char(c)) if !m.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                    Some(Event::InputChar(c))
                }
                (_, KeyCode::Tab) => Some(Event::NextTab),
                (_, KeyCode::BackTab) => Some(Event::PrevTab),
                (_, KeyCode::Enter) => Some(Event::Submit),
                (_, KeyCode::Esc) => Some(Event::Escape),
                (_, KeyCode::Backspace) => Some(Event::Backspace),
                (_, KeyCode::Delete) => Some(Event::Delete),
                (_, KeyCode::Left) => Some(Event::CursorLeft),
                (_, KeyCode::Right) => Some(Event::CursorRight),
                (_, KeyCode::Up) => Some(Event::CursorUp),
                (_, KeyCode::Down) => Some(Event::CursorDown),
                (_, KeyCode::PageUp) => Some(Event::PageUp),
                (_, KeyCode::PageDown) => Some(Event::PageDown),
                (_, KeyCode::Home) => Some(Event::Home),
                (_, KeyCode::End) => Some(Event::End),
                _ => None,
            }
        }
        event::Event::Paste(data) => Some(Event::Paste(data)),
        event::Event::Resize(w, h) => Some(Event::Resize(w, h)),
        _ => None,
    }
}
