//! # MessageView Component
//!
//! Scrollable view of a channel's recent messages, oldest at the top.
//!
//! Holds its own scroll state and re-pins to the bottom whenever a new
//! snapshot arrives or the user scrolls back down past the end.

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::client::{Message, SystemMessage, UserId};
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::Event;

const TIMESTAMP_FORMAT: &str = "%b %e %H:%M:%S";

/// Renders one message as a single logical line.
///
/// `name_of` maps user ids to display names for authors and the users
/// mentioned in system messages.
pub fn format_message(message: &Message, name_of: &dyn Fn(&UserId) -> String) -> Line<'static> {
    let timestamp = message
        .sent_at()
        .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default();
    let timestamp = Span::styled(
        format!("{timestamp} "),
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    );
    let system_style = Style::default().fg(Color::Yellow);

    let Some(system) = &message.system else {
        return Line::from(vec![
            timestamp,
            Span::styled(name_of(&message.author), Style::default().fg(Color::Cyan)),
            Span::raw(format!(": {}", message.content())),
        ]);
    };

    let text = match system {
        SystemMessage::Text { content } => content.clone(),
        SystemMessage::UserAdded { id, by } => {
            format!("{} was added by {}", name_of(id), name_of(by))
        }
        SystemMessage::UserRemove { id, by } => {
            format!("{} was removed by {}", name_of(id), name_of(by))
        }
        SystemMessage::UserJoined { id } => format!("{} joined", name_of(id)),
        SystemMessage::UserLeft { id } => format!("{} left", name_of(id)),
        SystemMessage::UserKicked { id } => format!("{} was kicked", name_of(id)),
        SystemMessage::UserBanned { id } => format!("{} was banned", name_of(id)),
        SystemMessage::ChannelRenamed { name, by } => {
            format!("{} renamed the channel to {}", name_of(by), name)
        }
        SystemMessage::ChannelDescriptionChanged { by } => {
            format!("{} changed the channel description", name_of(by))
        }
        SystemMessage::ChannelIconChanged { by } => {
            format!("{} changed the channel icon", name_of(by))
        }
        SystemMessage::ChannelOwnershipChanged { from, to } => {
            format!(
                "{} transferred channel ownership to {}",
                name_of(from),
                name_of(to)
            )
        }
        SystemMessage::Unknown => {
            log::warn!("Unknown system message type (id {})", message.id);
            format!("message of unknown type. Content: {}", message.content())
        }
    };
    Line::from(vec![timestamp, Span::styled(text, system_style)])
}

pub struct MessageView {
    lines: Vec<Line<'static>>,
    heights: Vec<u16>,
    cached_width: u16,
    scroll_state: ScrollViewState,
    /// When true, auto-scroll to bottom on new content
    stick_to_bottom: bool,
    viewport_height: u16,
}

impl Default for MessageView {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageView {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            heights: Vec::new(),
            cached_width: 0,
            scroll_state: ScrollViewState::default(),
            stick_to_bottom: true,
            viewport_height: 0,
        }
    }

    /// Replaces the content and jumps to the newest message.
    pub fn set_lines(&mut self, lines: Vec<Line<'static>>) {
        self.lines = lines;
        self.heights.clear();
        self.stick_to_bottom = true;
    }

    pub fn clear(&mut self) {
        self.set_lines(Vec::new());
        self.scroll_state = ScrollViewState::default();
    }

    pub fn is_stuck_to_bottom(&self) -> bool {
        self.stick_to_bottom
    }

    /// First line that still fits in a `u16`-tall scroll buffer, counting
    /// back from the newest. Older lines beyond that are not drawn.
    fn first_visible(&self) -> usize {
        let mut total: u32 = 0;
        for (i, height) in self.heights.iter().enumerate().rev() {
            total += u32::from(*height);
            if total > u32::from(u16::MAX) {
                return i + 1;
            }
        }
        0
    }

    fn total_height(&self) -> u16 {
        let total: u32 = self.heights[self.first_visible()..]
            .iter()
            .map(|h| u32::from(*h))
            .sum();
        u16::try_from(total).unwrap_or(u16::MAX)
    }

    fn update_heights(&mut self, width: u16) {
        if self.cached_width == width && self.heights.len() == self.lines.len() {
            return;
        }
        self.heights = self
            .lines
            .iter()
            .map(|line| {
                let count = Paragraph::new(line.clone())
                    .wrap(Wrap { trim: false })
                    .line_count(width)
                    .clamp(1, usize::from(u16::MAX));
                u16::try_from(count).unwrap_or(u16::MAX)
            })
            .collect();
        self.cached_width = width;
    }

    /// Re-engage auto-scroll once the user has reached the bottom.
    fn repin_if_at_bottom(&mut self) {
        let max_y = self.total_height().saturating_sub(self.viewport_height);
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }
}

impl Component for MessageView {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // -1 for scrollbar
        self.update_heights(content_width);
        self.viewport_height = area.height;

        let total_height = self.total_height();
        let mut scroll_view = ScrollView::new(Size::new(content_width, total_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let first = self.first_visible();
        let mut y: u16 = 0;
        for (line, height) in self.lines[first..].iter().zip(&self.heights[first..]) {
            let paragraph = Paragraph::new(line.clone()).wrap(Wrap { trim: false });
            scroll_view.render_widget(paragraph, Rect::new(0, y, content_width, *height));
            y = y.saturating_add(*height);
        }

        if self.stick_to_bottom {
            self.scroll_state.scroll_to_bottom();
        } else {
            let max_y = total_height.saturating_sub(area.height);
            let current = self.scroll_state.offset();
            if current.y > max_y {
                self.scroll_state.set_offset(Position { x: 0, y: max_y });
            }
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.scroll_state);
    }
}

impl EventHandler for MessageView {
    type Event = ();

    fn handle_event(&mut self, event: &Event) -> Option<()> {
        match event {
            Event::CursorUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            Event::CursorDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            Event::PageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            Event::PageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            _ => return None,
        }
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ChannelId, MessageId};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn names(id: &UserId) -> String {
        match id.as_str() {
            "u1" => "alice".to_string(),
            "u2" => "bob".to_string(),
            other => other.to_string(),
        }
    }

    fn message(content: &str, system: Option<SystemMessage>) -> Message {
        Message {
            id: MessageId::from("01ARYZ6S41TSV4RRFFQ69G5FAV"),
            channel: ChannelId::from("c1"),
            author: UserId::from("u1"),
            content: Some(content.to_string()),
            system,
        }
    }

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_plain_message_format() {
        let line = format_message(&message("hello", None), &names);
        let text = plain(&line);
        assert!(text.ends_with(" alice: hello"), "got {text:?}");
        // 2016-07-30 22:36:16 UTC; the day shifts with the local zone, the month does not.
        assert!(text.starts_with("Jul "), "got {text:?}");
    }

    #[test]
    fn test_system_message_templates() {
        let joined = message("", Some(SystemMessage::UserJoined { id: UserId::from("u2") }));
        assert!(plain(&format_message(&joined, &names)).ends_with("bob joined"));

        let renamed = message(
            "",
            Some(SystemMessage::ChannelRenamed {
                name: "lounge".into(),
                by: UserId::from("u1"),
            }),
        );
        assert!(
            plain(&format_message(&renamed, &names)).ends_with("alice renamed the channel to lounge")
        );
    }

    #[test]
    fn test_unknown_system_message_format() {
        let unknown = message("pinned", Some(SystemMessage::Unknown));
        assert!(
            plain(&format_message(&unknown, &names))
                .ends_with("message of unknown type. Content: pinned")
        );
    }

    #[test]
    fn test_set_lines_repins_bottom() {
        let mut view = MessageView::new();
        view.handle_event(&Event::CursorUp);
        assert!(!view.is_stuck_to_bottom());
        view.set_lines(vec![Line::from("x")]);
        assert!(view.is_stuck_to_bottom());
    }

    #[test]
    fn test_ignores_text_input() {
        let mut view = MessageView::new();
        assert_eq!(view.handle_event(&Event::InputChar('a')), None);
        assert_eq!(view.handle_event(&Event::PageUp), Some(()));
    }

    #[test]
    fn test_render_shows_newest_at_bottom() {
        let mut view = MessageView::new();
        view.set_lines((0..10).map(|i| Line::from(format!("line {i}"))).collect());

        let mut terminal = Terminal::new(TestBackend::new(20, 4)).unwrap();
        terminal.draw(|f| view.render(f, f.area())).unwrap();

        let buffer = terminal.backend().buffer();
        let row = |y: u16| -> String {
            (0..20).map(|x| buffer[(x, y)].symbol().to_string()).collect()
        };
        assert!(row(3).contains("line 9"));
        assert!(!row(0).contains("line 0"));
    }

    #[test]
    fn test_render_tall_history_keeps_newest() {
        let mut view = MessageView::new();
        view.set_lines(
            (0..400)
                .map(|i| Line::from(format!("{}{i:08}", "a".repeat(1992))))
                .collect(),
        );

        let mut terminal = Terminal::new(TestBackend::new(9, 4)).unwrap();
        terminal.draw(|f| view.render(f, f.area())).unwrap();

        // 400 messages of 250 rows each do not fit; the oldest are skipped.
        let first = view.first_visible();
        assert!(first > 0);
        let kept: u32 = view.heights[first..].iter().map(|h| u32::from(*h)).sum();
        assert!(kept <= u32::from(u16::MAX));
        let bottom: String = (0..9)
            .map(|x| terminal.backend().buffer()[(x, 3)].symbol().to_string())
            .collect();
        assert!(!bottom.trim().is_empty());
    }
}
