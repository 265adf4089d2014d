//! # TabBar Component
//!
//! Three rows of rounded boxes, one per tab, joined to the bordered content
//! box below. The active tab is open at the bottom so it flows into the
//! content:
//!
//! ```text
//! ╭──────────╮╭──────────╮╭──────╮
//! │ Overview ││ Channels ││ Chat │
//! │          └┴──────────┴┴──────┴───────┐
//! ```

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::tui::component::Component;

/// Rows the tab bar occupies.
pub const TAB_BAR_HEIGHT: u16 = 3;

pub const BORDER_COLOR: Color = Color::Magenta;

pub struct TabBar {
    titles: Vec<String>,
    active: Option<usize>,
}

impl TabBar {
    /// `titles` are the visible tabs in order; `active` indexes into them.
    pub fn new(titles: Vec<String>, active: Option<usize>) -> Self {
        Self { titles, active }
    }

    fn rows(&self, width: u16) -> [Line<'static>; 3] {
        let border = Style::default().fg(BORDER_COLOR);
        let mut top = Vec::new();
        let mut middle = Vec::new();
        let mut bottom = Vec::new();
        let mut used: u16 = 0;

        for (i, title) in self.titles.iter().enumerate() {
            let is_active = self.active == Some(i);
            let label = format!(" {title} ");
            let inner = label.width();

            top.push(Span::styled(format!("╭{}╮", "─".repeat(inner)), border));

            let label_style = if is_active {
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            middle.push(Span::styled("│", border));
            middle.push(Span::styled(label, label_style));
            middle.push(Span::styled("│", border));

            let left = match (i, is_active) {
                (0, true) => "│",
                (0, false) => "├",
                (_, true) => "┘",
                (_, false) => "┴",
            };
            let (fill, right) = if is_active {
                (" ", "└")
            } else {
                ("─", "┴")
            };
            bottom.push(Span::styled(
                format!("{left}{}{right}", fill.repeat(inner)),
                border,
            ));

            used = used.saturating_add(inner as u16 + 2);
        }

        if used < width {
            let filler = (width - used - 1) as usize;
            bottom.push(Span::styled(format!("{}┐", "─".repeat(filler)), border));
        }

        [Line::from(top), Line::from(middle), Line::from(bottom)]
    }
}

impl Component for TabBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let rows = self.rows(area.width);
        frame.render_widget(Paragraph::new(rows.to_vec()), area);
    }
}
