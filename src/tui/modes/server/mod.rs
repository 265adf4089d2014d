//! # Server Mode
//!
//! Tabbed view of one server: Overview, Channels and Chat. The action owns
//! the tabs and decides which one is active and which events it sees.
//!
//! ```text
//! ╭──────────╮╭──────────╮╭──────╮
//! │ Overview ││ Channels ││ Chat │
//! │          └┴──────────┴┴──────┴──┐
//! │  <active tab content>           │
//! └─────────────────────────────────┘
//! ```
//!
//! The channels tab owns the selected channel; the chat tab only holds a
//! weak reader on it (see [`link`]).

pub mod channels;
pub mod chat;
pub mod link;
pub mod overview;
pub mod tab;

use std::sync::Arc;

use log::{debug, error, warn};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, BorderType, Borders};

use crate::core::state::SessionState;
use crate::core::sync::SyncCommand;
use crate::tui::component::Component;
use crate::tui::components::tab_bar::BORDER_COLOR;
use crate::tui::components::{TAB_BAR_HEIGHT, TabBar};
use crate::tui::effect::Effect;
use crate::tui::event::Event;
use crate::tui::modes::{Action, EnterError, Mode};

use channels::ChannelsTab;
use chat::ChatTab;
use overview::OverviewTab;
use tab::{Tab, TabId};

/// Rows and columns taken by the tab bar and the content box borders.
const HORIZONTAL_CHROME: u16 = 2;
const VERTICAL_CHROME: u16 = TAB_BAR_HEIGHT + 1;

pub struct ServerAction {
    state: Arc<SessionState>,
    tabs: Vec<Box<dyn Tab>>,
    active: TabId,
    pending_mode: Option<Mode>,
}

impl ServerAction {
    pub fn new(state: Arc<SessionState>) -> Self {
        let channels = ChannelsTab::new();
        let chat = ChatTab::new(channels.reader(), state.clone());
        let overview = OverviewTab::new(state.clone());
        Self::with_tabs(
            state,
            vec![Box::new(overview), Box::new(channels), Box::new(chat)],
        )
    }

    /// # Panics
    ///
    /// If `tabs` does not hold exactly one tab per [`TabId`], in order.
    pub fn with_tabs(state: Arc<SessionState>, tabs: Vec<Box<dyn Tab>>) -> Self {
        if tabs.len() != TabId::COUNT {
            error!(
                "Server mode needs {} tabs, got {}",
                TabId::COUNT,
                tabs.len()
            );
            panic!("tab count mismatch: expected {}, got {}", TabId::COUNT, tabs.len());
        }
        for (expected, tab) in TabId::ALL.iter().zip(&tabs) {
            if tab.id() != *expected {
                error!("Tab {:?} registered in the slot of {:?}", tab.id(), expected);
                panic!("tab order mismatch: expected {:?}, got {:?}", expected, tab.id());
            }
        }
        Self {
            state,
            tabs,
            active: TabId::Overview,
            pending_mode: None,
        }
    }

    pub fn active_tab(&self) -> TabId {
        self.active
    }

    pub fn tab(&self, id: TabId) -> &dyn Tab {
        self.tabs[id.index()].as_ref()
    }

    fn content_size(width: u16, height: u16) -> (u16, u16) {
        (
            width.saturating_sub(HORIZONTAL_CHROME),
            height.saturating_sub(VERTICAL_CHROME),
        )
    }

    fn active_tab_mut(&mut self) -> &mut dyn Tab {
        self.tabs[self.active.index()].as_mut()
    }

    /// Moves `step` tabs at a time (1 forward, COUNT-1 backward) to the next
    /// enabled tab. Stays put when no other tab is enabled.
    fn cycle(&mut self, step: usize) -> Effect {
        let mut candidate = self.active;
        for _ in 0..TabId::COUNT {
            candidate = TabId::from_index(candidate.index() + step);
            if self.tabs[candidate.index()].enabled() {
                break;
            }
        }
        if candidate == self.active {
            return Effect::None;
        }
        debug!("Switching tab {:?} -> {:?}", self.active, candidate);
        self.active = candidate;
        self.active_tab_mut().focus()
    }

    /// Applies a tab switch requested by a tab.
    fn apply_request(&mut self, requested: TabId) -> Effect {
        if requested == self.active {
            return Effect::None;
        }
        if !self.tabs[requested.index()].enabled() {
            debug!("Ignoring switch to disabled tab {:?}", requested);
            return Effect::None;
        }
        debug!("Switching tab {:?} -> {:?}", self.active, requested);
        self.active = requested;
        self.active_tab_mut().focus()
    }

    /// Sends `event` to every tab. All effects are kept when `keep_all`;
    /// otherwise only the active tab's. Only the active tab's request counts.
    fn broadcast(&mut self, event: &Event, keep_all: bool) -> Effect {
        let active = self.active;
        let mut effects = Vec::new();
        let mut request = active;
        for tab in self.tabs.iter_mut() {
            let is_active = tab.id() == active;
            let (effect, next) = tab.update(event);
            if is_active {
                request = next;
            }
            if keep_all || is_active {
                effects.push(effect);
            }
        }
        effects.push(self.apply_request(request));
        Effect::batch(effects)
    }
}

impl Action for ServerAction {
    fn enter(&mut self) -> Result<Effect, EnterError> {
        let Some(server) = self.state.server() else {
            warn!("Entered server mode without a selected server");
            return Err(EnterError::NoServerSelected);
        };
        debug!("Entering server {} ({})", server.name, server.id);

        let (width, height) = Self::content_size(self.state.width(), self.state.height());
        let effects: Vec<Effect> = self
            .tabs
            .iter_mut()
            .map(|tab| tab.init(&server, width, height))
            .collect();
        self.active = TabId::Overview;
        self.pending_mode = None;

        Ok(Effect::batch(effects.into_iter().chain([Effect::Blink])))
    }

    fn update(&mut self, event: &Event) -> Effect {
        match event {
            Event::NextTab => self.cycle(1),
            Event::PrevTab => self.cycle(TabId::COUNT - 1),
            Event::Escape => {
                self.pending_mode = Some(Mode::ServerSelection);
                // Nothing shows chat updates outside this mode.
                Effect::Sync(SyncCommand::Unwatch)
            }
            Event::Resize(width, height) => {
                let (width, height) = Self::content_size(*width, *height);
                self.broadcast(&Event::Resize(width, height), false)
            }
            event if event.is_background() => self.broadcast(event, true),
            event => {
                let (effect, next) = self.active_tab_mut().update(event);
                Effect::batch([effect, self.apply_request(next)])
            }
        }
    }

    fn wants_mode_change(&mut self) -> Option<Mode> {
        self.pending_mode.take()
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [bar_area, content_area] =
            Layout::vertical([Constraint::Length(TAB_BAR_HEIGHT), Constraint::Min(0)])
                .areas(area);

        let visible: Vec<&Box<dyn Tab>> = self.tabs.iter().filter(|t| t.enabled()).collect();
        let titles = visible.iter().map(|t| t.name().to_string()).collect();
        let active = visible.iter().position(|t| t.id() == self.active);
        TabBar::new(titles, active).render(frame, bar_area);

        let block = Block::default()
            .borders(Borders::LEFT | Borders::RIGHT | Borders::BOTTOM)
            .border_type(BorderType::Plain)
            .border_style(Style::default().fg(BORDER_COLOR));
        let inner = block.inner(content_area);
        frame.render_widget(block, content_area);
        self.active_tab_mut().render(frame, inner);
    }
}
