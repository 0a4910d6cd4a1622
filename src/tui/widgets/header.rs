//! Header widget for the TUI.
//!
//! Displays the application title, progress and the connection indicator.

use super::spinner::Spinner;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};

/// Application title.
pub const TITLE: &str = "Chat with Your SQL Database";

/// Header bar widget.
pub struct Header<'a> {
    db_name: Option<&'a str>,
    spinner: Option<&'a Spinner>,
}

impl<'a> Header<'a> {
    pub fn new(db_name: Option<&'a str>, spinner: Option<&'a Spinner>) -> Self {
        Self { db_name, spinner }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        let style = Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);

        for x in area.left()..area.right() {
            buf[(x, area.y)].set_style(style);
        }

        let left_text = format!(" {TITLE}");
        buf.set_stringn(area.x, area.y, &left_text, area.width as usize, style);
        let left_width = left_text.chars().count() as u16;

        // Right side: connection status dot and name
        let (dot, dot_color, label) = match self.db_name {
            Some(name) => ("●", Color::Green, format!(" {name} ")),
            None => ("○", Color::Gray, " not connected ".to_string()),
        };
        let right_width = label.chars().count() as u16 + 2;
        let right_x = area.right().saturating_sub(right_width);
        if right_width + left_width < area.width {
            let dot_style = Style::default().bg(Color::Blue).fg(dot_color);
            buf.set_string(right_x, area.y, " ", style);
            buf.set_string(right_x + 1, area.y, dot, dot_style);
            buf.set_string(right_x + 2, area.y, &label, style);
        }

        // Center: spinner if active, when it fits between both sides
        if let Some(spinner) = self.spinner {
            let spinner_text = spinner.display();
            let spinner_width = spinner_text.chars().count() as u16;
            let spinner_x = area.x + area.width.saturating_sub(spinner_width) / 2;
            if spinner_x > area.x + left_width && spinner_x + spinner_width < right_x {
                let spinner_style = style.fg(Color::Yellow);
                buf.set_string(spinner_x, area.y, &spinner_text, spinner_style);
            }
        }
    }
}
