use ratatui::Frame;
use ratatui::layout::Rect;

use crate::client::Server;
use crate::tui::effect::Effect;
use crate::tui::event::Event;

/// Tabs of the server view, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TabId {
    Overview,
    Channels,
    Chat,
}

impl TabId {
    pub const ALL: [TabId; 3] = [TabId::Overview, TabId::Channels, TabId::Chat];
    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> TabId {
        Self::ALL[index % Self::COUNT]
    }
}

/// One page of the server view.
pub trait Tab {
    fn id(&self) -> TabId;

    fn name(&self) -> &str;

    /// Disabled tabs are hidden from the tab bar and skipped when cycling.
    fn enabled(&self) -> bool;

    /// Resets the tab for a newly selected server. `width` and `height` are
    /// the content area inside the tab borders.
    fn init(&mut self, server: &Server, width: u16, height: u16) -> Effect;

    /// Called when the tab becomes the active one.
    fn focus(&mut self) -> Effect {
        Effect::None
    }

    /// Handles an event and names the tab that should be active afterwards.
    fn update(&mut self, event: &Event) -> (Effect, TabId);

    fn render(&mut self, frame: &mut Frame, area: Rect);
}
