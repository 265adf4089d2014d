use std::sync::Arc;

use log::{debug, info, warn};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::Paragraph;

use crate::client::{ClientEvent, ServerId};
use crate::core::state::SessionState;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::{ListEntry, ListEvent, SelectableList};
use crate::tui::effect::Effect;
use crate::tui::event::Event;
use crate::tui::modes::{Action, EnterError, Mode};

const FETCH_FAILED: &str = "An error has occurred, please try a different server.";

/// Lists the servers from the ready cache. Confirming one fetches it and
/// moves to server mode.
pub struct ServerSelectionAction {
    state: Arc<SessionState>,
    list: SelectableList<ServerId>,
    /// Server whose fetch is in flight.
    fetching: Option<ServerId>,
    error: Option<String>,
    pending_mode: Option<Mode>,
}

impl ServerSelectionAction {
    pub fn new(state: Arc<SessionState>) -> Self {
        Self {
            state,
            list: SelectableList::new("Servers").with_empty_text("You are not in any servers."),
            fetching: None,
            error: None,
            pending_mode: None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn entries(&self) -> &[ListEntry<ServerId>] {
        self.list.entries()
    }

    fn rebuild_list(&mut self) {
        let entries = self
            .state
            .servers()
            .into_iter()
            .map(|server| {
                ListEntry::new(
                    server.name,
                    server.description.unwrap_or_default(),
                    server.id,
                )
            })
            .collect();
        self.list.set_entries(entries);
    }

    fn confirm(&mut self, index: usize) -> Effect {
        if self.fetching.is_some() {
            return Effect::Blink;
        }
        let Some(entry) = self.list.get(index) else {
            return Effect::None;
        };
        debug!("Fetching server {}", entry.value);
        self.fetching = Some(entry.value.clone());
        self.error = None;
        Effect::FetchServer(entry.value.clone())
    }

    fn handle_client(&mut self, event: &ClientEvent) -> Effect {
        match event {
            ClientEvent::ReadyCacheUpdated => {
                self.rebuild_list();
                Effect::None
            }
            ClientEvent::ServerFetched { server_id, result }
                if self.fetching.as_ref() == Some(server_id) =>
            {
                self.fetching = None;
                match result {
                    Ok(server) => {
                        info!("Selected server {} ({})", server.name, server.id);
                        self.state.set_server(server.clone());
                        self.pending_mode = Some(Mode::Server);
                    }
                    Err(e) => {
                        warn!("Failed to fetch server {}: {}", server_id, e);
                        self.error = Some(FETCH_FAILED.to_string());
                    }
                }
                Effect::None
            }
            _ => Effect::None,
        }
    }
}

impl Action for ServerSelectionAction {
    fn enter(&mut self) -> Result<Effect, EnterError> {
        self.fetching = None;
        self.error = None;
        self.pending_mode = None;
        self.rebuild_list();
        Ok(Effect::None)
    }

    fn update(&mut self, event: &Event) -> Effect {
        match event {
            Event::Client(client) => self.handle_client(client),
            event => match self.list.handle_event(event) {
                Some(ListEvent::Confirmed(index)) => self.confirm(index),
                Some(ListEvent::Moved) | None => Effect::None,
            },
        }
    }

    fn wants_mode_change(&mut self) -> Option<Mode> {
        self.pending_mode.take()
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        if !self.state.is_ready() {
            let [_, middle, _] = Layout::vertical([
                Constraint::Fill(1),
                Constraint::Length(1),
                Constraint::Fill(1),
            ])
            .areas(area);
            frame.render_widget(
                Paragraph::new("Initializing...").alignment(Alignment::Center),
                middle,
            );
            return;
        }

        let [list_area, error_area] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);
        self.list.render(frame, list_area);
        if let Some(error) = &self.error {
            frame.render_widget(
                Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red)),
                error_area,
            );
        }
    }
}
