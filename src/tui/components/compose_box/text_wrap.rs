//! Pure text wrapping utilities and dimensional constants for the ComposeBox.

/// Border (2) + padding (2) consumed horizontally by the bordered block
pub(super) const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top + bottom borders consumed vertically
pub(super) const VERTICAL_OVERHEAD: u16 = 2;
/// Maximum visible content lines before internal scrolling kicks in
pub(super) const MAX_VISIBLE_LINES: u16 = 4;
/// Offset from area edge to content (border + padding)
pub(super) const CONTENT_OFFSET_X: u16 = 2;
pub(super) const CONTENT_OFFSET_Y: u16 = 1;

/// Build textwrap options configured for the compose box inner width.
pub(super) fn wrap_options(inner_width: u16) -> textwrap::Options<'static> {
    textwrap::Options::new(inner_width as usize)
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
}

/// Inner content width after subtracting border/padding overhead.
pub(super) fn inner_width(content_width: u16) -> u16 {
    content_width.saturating_sub(HORIZONTAL_OVERHEAD)
}

/// Count wrapped lines for the given text, accounting for a trailing newline
/// that textwrap does not represent as an empty line.
pub(super) fn wrap_line_count(text: &str, width: u16) -> u16 {
    if width == 0 || text.is_empty() {
        return 1;
    }

    let lines = textwrap::wrap(text, wrap_options(width));
    let mut count = (lines.len() as u16).max(1);

    if text.ends_with('\n') && !lines.last().is_some_and(|l| l.is_empty()) {
        count += 1;
    }

    count
}

/// Byte offset of the previous character boundary before `pos`.
pub(super) fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Byte offset of the next character boundary after `pos`.
pub(super) fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(1)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_line_count_empty_is_one() {
        assert_eq!(wrap_line_count("", 10), 1);
        assert_eq!(wrap_line_count("abc", 0), 1);
    }

    #[test]
    fn test_wrap_line_count_breaks_long_words() {
        assert_eq!(wrap_line_count("abcdefghij", 4), 3);
    }

    #[test]
    fn test_wrap_line_count_trailing_newline() {
        assert_eq!(wrap_line_count("abc\n", 10), 2);
    }

    #[test]
    fn test_char_boundaries_respect_multibyte() {
        let text = "añb";
        assert_eq!(next_char_boundary(text, 1), 3);
        assert_eq!(prev_char_boundary(text, 3), 1);
        assert_eq!(prev_char_boundary(text, 0), 0);
        assert_eq!(next_char_boundary(text, text.len()), text.len());
    }
}
