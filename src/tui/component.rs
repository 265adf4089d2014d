use ratatui::layout::Rect;
use ratatui::Frame;

use super::event::Event;

/// A reusable UI component.
///
/// Components receive data via struct fields, may hold presentation state
/// (selection, scroll offset, cursor), and render into a given `Rect`.
///
/// `render` takes `&mut self` so components can update that presentation
/// state during the render pass, in line with Ratatui's `StatefulWidget`.
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// A component that handles terminal events.
pub trait EventHandler {
    /// The type of high-level event this component emits.
    type Event;

    /// Handle a low-level [`Event`] and optionally return a high-level event.
    fn handle_event(&mut self, event: &Event) -> Option<Self::Event>;
}
