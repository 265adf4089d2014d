//! # SelectableList Component
//!
//! A vertical list of titled items with one highlighted selection. Used for
//! the server list and the channel list.
//!
//! Items carry a typed payload, so a confirmed selection hands back the
//! payload itself rather than something the caller has to downcast.

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::Event;

#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry<T> {
    pub title: String,
    pub description: String,
    pub value: T,
}

impl<T> ListEntry<T> {
    pub fn new(title: impl Into<String>, description: impl Into<String>, value: T) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            value,
        }
    }
}

/// Events emitted by the list.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEvent {
    /// The selection moved.
    Moved,
    /// Enter on the item at this index.
    Confirmed(usize),
}

pub struct SelectableList<T> {
    title: String,
    entries: Vec<ListEntry<T>>,
    list_state: ListState,
    empty_text: String,
}

impl<T> SelectableList<T> {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
            list_state: ListState::default(),
            empty_text: String::from("Nothing here."),
        }
    }

    pub fn with_empty_text(mut self, text: impl Into<String>) -> Self {
        self.empty_text = text.into();
        self
    }

    /// Replaces the entries and selects the first one.
    pub fn set_entries(&mut self, entries: Vec<ListEntry<T>>) {
        self.entries = entries;
        self.list_state
            .select(if self.entries.is_empty() { None } else { Some(0) });
    }

    pub fn entries(&self) -> &[ListEntry<T>] {
        &self.entries
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.list_state.selected()
    }

    pub fn selected(&self) -> Option<&ListEntry<T>> {
        self.selected_index().and_then(|i| self.entries.get(i))
    }

    pub fn get(&self, index: usize) -> Option<&ListEntry<T>> {
        self.entries.get(index)
    }

    fn select(&mut self, index: usize) -> Option<ListEvent> {
        if self.entries.is_empty() {
            return None;
        }
        let index = index.min(self.entries.len() - 1);
        if self.list_state.selected() == Some(index) {
            return None;
        }
        self.list_state.select(Some(index));
        Some(ListEvent::Moved)
    }
}

impl<T> EventHandler for SelectableList<T> {
    type Event = ListEvent;

    fn handle_event(&mut self, event: &Event) -> Option<ListEvent> {
        let current = self.selected_index().unwrap_or(0);
        match event {
            Event::CursorUp => self.select(current.saturating_sub(1)),
            Event::CursorDown => self.select(current + 1),
            Event::PageUp => self.select(current.saturating_sub(10)),
            Event::PageDown => self.select(current + 10),
            Event::Home => self.select(0),
            Event::End => self.select(usize::MAX),
            Event::Submit => self.selected_index().map(ListEvent::Confirmed),
            _ => None,
        }
    }
}

impl<T> Component for SelectableList<T> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(format!(" {} ", self.title))
            .title_alignment(Alignment::Left)
            .padding(Padding::horizontal(1));

        if self.entries.is_empty() {
            let empty = Paragraph::new(self.empty_text.as_str())
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let inner_width = area.width.saturating_sub(4) as usize; // borders + padding
        let selected = self.list_state.selected();
        let items: Vec<ListItem> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let style = if Some(i) == selected {
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else {
                    Style::default().fg(Color::Gray)
                };
                let title = truncate_str(&entry.title, inner_width);
                let mut lines = vec![Line::from(Span::styled(title, style))];
                if !entry.description.is_empty() {
                    lines.push(Line::from(Span::styled(
                        truncate_str(&entry.description, inner_width),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                ListItem::new(lines)
            })
            .collect();

        let list = List::new(items).block(block);
        frame.render_stateful_widget(list, area, &mut self.list_state);
    }
}

/// Truncate a string to fit within `max_width` columns, adding "..." if needed.
pub fn truncate_str(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > max_width - 3 {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str("...");
    out
}
