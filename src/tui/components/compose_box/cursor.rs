//! Cursor position tracking for the ComposeBox.
//!
//! `CursorState` owns the cursor byte offset and the internal scroll offset.
//! Layout methods take the displayed text and a byte offset into it
//! explicitly, because a masked box displays different bytes than it stores.

use super::text_wrap::{
    CONTENT_OFFSET_X, CONTENT_OFFSET_Y, MAX_VISIBLE_LINES, inner_width, wrap_line_count,
    wrap_options,
};
use ratatui::layout::Rect;

pub(super) struct CursorState {
    /// Cursor position as byte offset in the buffer (0..=buffer.len())
    pub pos: usize,
    /// Line offset for internal scrolling (0 when content fits in viewport)
    pub scroll_offset: u16,
}

impl CursorState {
    pub fn new() -> Self {
        Self {
            pos: 0,
            scroll_offset: 0,
        }
    }

    pub fn reset(&mut self) {
        self.pos = 0;
        self.scroll_offset = 0;
    }

    /// Which wrapped line (0-based) the cursor is on.
    pub fn calculate_line(text: &str, pos: usize, content_width: u16) -> u16 {
        let width = inner_width(content_width);
        if width == 0 {
            return 0;
        }

        let before = &text[..pos];
        let lines = textwrap::wrap(before, wrap_options(width));
        let mut cursor_line = lines.len().saturating_sub(1) as u16;

        if pos > 0
            && text.as_bytes()[pos - 1] == b'\n'
            && !lines.last().is_some_and(|l| l.is_empty())
        {
            cursor_line += 1;
        }

        cursor_line
    }

    /// Update scroll offset to keep the cursor inside the visible lines.
    pub fn update_scroll_offset(&mut self, text: &str, pos: usize, content_width: u16) {
        let total_lines = wrap_line_count(text, inner_width(content_width));
        if total_lines <= MAX_VISIBLE_LINES {
            self.scroll_offset = 0;
            return;
        }

        let cursor_line = Self::calculate_line(text, pos, content_width);
        if cursor_line < self.scroll_offset {
            self.scroll_offset = cursor_line;
        } else if cursor_line >= self.scroll_offset + MAX_VISIBLE_LINES {
            self.scroll_offset = cursor_line.saturating_sub(MAX_VISIBLE_LINES - 1);
        }
    }

    /// Screen position for the cursor based on the wrapped layout.
    /// Returns (column, row) in screen coordinates.
    pub fn screen_pos(&self, text: &str, pos: usize, area: Rect) -> (u16, u16) {
        let width = inner_width(area.width);
        if width == 0 {
            return (area.x + CONTENT_OFFSET_X, area.y + CONTENT_OFFSET_Y);
        }

        let options = wrap_options(width);
        let before = &text[..pos];
        let cursor_line = Self::calculate_line(text, pos, area.width);

        // Count chars from the last newline; textwrap trims trailing spaces,
        // so wrapped line lengths cannot be used directly.
        let last_newline = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let logical = &before[last_newline..];
        let wrapped = textwrap::wrap(logical, options);

        let cursor_col = if wrapped.is_empty() {
            0
        } else {
            let in_prev_segments: usize = wrapped
                .iter()
                .take(wrapped.len() - 1)
                .map(|seg| seg.chars().count())
                .sum();
            (logical.chars().count() - in_prev_segments) as u16
        };

        let visible_line = cursor_line.saturating_sub(self.scroll_offset);
        (
            area.x + CONTENT_OFFSET_X + cursor_col.min(width),
            area.y + CONTENT_OFFSET_Y + visible_line,
        )
    }
}
