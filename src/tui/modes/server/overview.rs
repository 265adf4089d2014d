use std::sync::Arc;

use log::warn;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use crate::client::{ClientEvent, Server, UserId};
use crate::core::state::SessionState;
use crate::tui::effect::Effect;
use crate::tui::event::Event;

use super::tab::{Tab, TabId};

/// Summary of the selected server.
pub struct OverviewTab {
    state: Arc<SessionState>,
    server: Option<Server>,
    owner_name: Option<String>,
}

impl OverviewTab {
    pub fn new(state: Arc<SessionState>) -> Self {
        Self {
            state,
            server: None,
            owner_name: None,
        }
    }

    fn owner(&self) -> Option<&UserId> {
        self.server.as_ref().map(|s| &s.owner)
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let Some(server) = &self.server else {
            return Vec::new();
        };
        let label = Style::default().fg(Color::DarkGray);
        let owner = self
            .owner_name
            .clone()
            .unwrap_or_else(|| server.owner.to_string());
        let description = server
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| "No description.".to_string());
        let discoverable = if server.discoverable {
            "This server is discoverable."
        } else {
            "This server is not discoverable."
        };

        vec![
            Line::from(Span::styled(
                server.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::default(),
            Line::from(description),
            Line::default(),
            Line::from(vec![Span::styled("Owner: ", label), Span::raw(owner)]),
            Line::from(vec![
                Span::styled("ID: ", label),
                Span::raw(server.id.to_string()),
            ]),
            Line::from(discoverable),
        ]
    }
}

impl Tab for OverviewTab {
    fn id(&self) -> TabId {
        TabId::Overview
    }

    fn name(&self) -> &str {
        "Overview"
    }

    fn enabled(&self) -> bool {
        true
    }

    fn init(&mut self, server: &Server, _width: u16, _height: u16) -> Effect {
        self.server = Some(server.clone());
        self.owner_name = self.state.user_name(&server.owner);
        match self.owner_name {
            Some(_) => Effect::None,
            None => Effect::FetchUser(server.owner.clone()),
        }
    }

    fn update(&mut self, event: &Event) -> (Effect, TabId) {
        if let Event::Client(ClientEvent::UserFetched { user_id, result }) = event {
            if Some(user_id) == self.owner() {
                match result {
                    Ok(user) => self.owner_name = Some(user.label().to_string()),
                    Err(e) => warn!("Failed to fetch server owner {}: {}", user_id, e),
                }
            }
        }
        (Effect::None, TabId::Overview)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let paragraph = Paragraph::new(self.lines()).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }
}
