//! Input widget for the TUI.
//!
//! The question bar. Shows a placeholder until something is typed and
//! stays dimmed while no database is connected.

use crate::tui::text::byte_index;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Calculates the scroll offset needed to keep the cursor visible.
///
/// Returns the number of characters to skip from the start of the text.
pub fn calculate_scroll_offset(cursor: usize, available_width: usize) -> usize {
    cursor.saturating_sub(available_width)
}

/// Width taken by the borders, the prompt and the cursor cell.
const CHROME_WIDTH: u16 = 5;

/// Input bar widget.
pub struct InputBar<'a> {
    text: &'a str,
    cursor: usize,
    placeholder: &'a str,
    focused: bool,
    enabled: bool,
}

impl<'a> InputBar<'a> {
    pub fn new(text: &'a str, cursor: usize, placeholder: &'a str, focused: bool, enabled: bool) -> Self {
        Self {
            text,
            cursor,
            placeholder,
            focused,
            enabled,
        }
    }

    /// Terminal cursor position inside `area`.
    pub fn cursor_position(&self, area: Rect) -> (u16, u16) {
        let available = area.width.saturating_sub(CHROME_WIDTH) as usize;
        let offset = calculate_scroll_offset(self.cursor, available);
        // Border (1) and prompt "> " (2)
        let x = area.x + 3 + (self.cursor - offset) as u16;
        (x, area.y + 1)
    }
}

impl Widget for InputBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused && self.enabled {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Question ");

        let prompt_style = if self.enabled {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let body = if self.text.is_empty() {
            Span::styled(
                self.placeholder.to_string(),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )
        } else {
            let available = area.width.saturating_sub(CHROME_WIDTH) as usize;
            let offset = calculate_scroll_offset(self.cursor, available);
            Span::raw(self.text[byte_index(self.text, offset)..].to_string())
        };

        Paragraph::new(Line::from(vec![Span::styled("> ", prompt_style), body]))
            .block(block)
            .render(area, buf);
    }
}
