//! # ComposeBox Component
//!
//! Single-buffer text entry used for composing messages and for the login
//! form fields.
//!
//! ## Responsibilities
//!
//! - Capture text input and bracketed paste
//! - Handle editing (backspace, delete, left/right, home/end)
//! - Optionally mask the displayed text (password entry)
//! - Grow with its content up to `MAX_VISIBLE_LINES`, then scroll internally
//!
//! Submission is left to the owner: Enter is not consumed here.

mod cursor;
mod text_wrap;

use std::borrow::Cow;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::Event;

use cursor::CursorState;
use text_wrap::{
    MAX_VISIBLE_LINES, VERTICAL_OVERHEAD, inner_width, next_char_boundary, prev_char_boundary,
    wrap_line_count, wrap_options,
};

const MASK: char = '*';

/// High-level events emitted by the ComposeBox
#[derive(Debug, Clone, PartialEq)]
pub enum ComposeEvent {
    /// Buffer or cursor changed.
    Edited,
}

pub struct ComposeBox {
    title: String,
    buffer: String,
    masked: bool,
    /// Whether the terminal cursor is placed in this box when rendering.
    pub focused: bool,
    cursor: CursorState,
}

impl ComposeBox {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            buffer: String::new(),
            masked: false,
            focused: true,
            cursor: CursorState::new(),
        }
    }

    /// A box whose content is displayed as `*`.
    pub fn masked(title: impl Into<String>) -> Self {
        Self {
            masked: true,
            ..Self::new(title)
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn content(&self) -> &str {
        &self.buffer
    }

    pub fn is_blank(&self) -> bool {
        self.buffer.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor.reset();
    }

    /// Required height for the current content, clamped to
    /// [1 + VERTICAL_OVERHEAD, MAX_VISIBLE_LINES + VERTICAL_OVERHEAD].
    pub fn calculate_height(&self, content_width: u16) -> u16 {
        let (text, _) = self.display();
        let lines = wrap_line_count(&text, inner_width(content_width));
        lines.min(MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }

    /// The displayed text and the cursor's byte offset into it.
    fn display(&self) -> (Cow<'_, str>, usize) {
        if self.masked {
            let before = self.buffer[..self.cursor.pos].chars().count();
            let masked: String = self.buffer.chars().map(|_| MASK).collect();
            (Cow::Owned(masked), before * MASK.len_utf8())
        } else {
            (Cow::Borrowed(self.buffer.as_str()), self.cursor.pos)
        }
    }

    fn visible_text(&self, text: &str, content_width: u16) -> String {
        if self.cursor.scroll_offset == 0 {
            return text.to_string();
        }
        let width = inner_width(content_width);
        if width == 0 {
            return String::new();
        }
        let lines = textwrap::wrap(text, wrap_options(width));
        let start = (self.cursor.scroll_offset as usize).min(lines.len());
        let end = (start + MAX_VISIBLE_LINES as usize).min(lines.len());
        lines[start..end].join("\n")
    }

    fn insert_str(&mut self, text: &str) {
        let text: String = text
            .chars()
            .filter(|c| *c != '\r' && !(self.masked && *c == '\n'))
            .collect();
        self.buffer.insert_str(self.cursor.pos, &text);
        self.cursor.pos += text.len();
    }
}

impl Component for ComposeBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let (text, pos) = self.display();
        let text = text.into_owned();
        self.cursor.update_scroll_offset(&text, pos, area.width);
        let visible = self.visible_text(&text, area.width);

        let border_color = if self.focused {
            Color::Green
        } else {
            Color::DarkGray
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color))
            .padding(Padding::horizontal(1))
            .title(self.title.as_str());

        frame.render_widget(Paragraph::new(visible).block(block), area);

        if self.focused {
            let position = self.cursor.screen_pos(&text, pos, area);
            frame.set_cursor_position(position);
        }
    }
}

impl EventHandler for ComposeBox {
    type Event = ComposeEvent;

    fn handle_event(&mut self, event: &Event) -> Option<ComposeEvent> {
        match event {
            Event::InputChar(c) => {
                self.insert_str(c.encode_utf8(&mut [0; 4]));
                Some(ComposeEvent::Edited)
            }
            Event::Paste(text) => {
                self.insert_str(text);
                Some(ComposeEvent::Edited)
            }
            Event::Backspace => (self.cursor.pos > 0).then(|| {
                let prev = prev_char_boundary(&self.buffer, self.cursor.pos);
                self.buffer.drain(prev..self.cursor.pos);
                self.cursor.pos = prev;
                ComposeEvent::Edited
            }),
            Event::Delete => (self.cursor.pos < self.buffer.len()).then(|| {
                let next = next_char_boundary(&self.buffer, self.cursor.pos);
                self.buffer.drain(self.cursor.pos..next);
                ComposeEvent::Edited
            }),
            Event::CursorLeft => (self.cursor.pos > 0).then(|| {
                self.cursor.pos = prev_char_boundary(&self.buffer, self.cursor.pos);
                ComposeEvent::Edited
            }),
            Event::CursorRight => (self.cursor.pos < self.buffer.len()).then(|| {
                self.cursor.pos = next_char_boundary(&self.buffer, self.cursor.pos);
                ComposeEvent::Edited
            }),
            Event::Home => (self.cursor.pos != 0).then(|| {
                self.cursor.pos = 0;
                ComposeEvent::Edited
            }),
            Event::End => (self.cursor.pos != self.buffer.len()).then(|| {
                self.cursor.pos = self.buffer.len();
                ComposeEvent::Edited
            }),
            _ => None,
        }
    }
}
