//! Status banner widget for the TUI.

use crate::session::{Banner, BannerLevel};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// One-line banner for the latest status or error.
pub struct BannerLine<'a> {
    banner: Option<&'a Banner>,
}

impl<'a> BannerLine<'a> {
    pub fn new(banner: Option<&'a Banner>) -> Self {
        Self { banner }
    }
}

fn style_for(level: BannerLevel) -> (Color, &'static str) {
    match level {
        BannerLevel::Success => (Color::Green, "✓"),
        BannerLevel::Info => (Color::Cyan, "i"),
        BannerLevel::Warning => (Color::Yellow, "!"),
        BannerLevel::Error => (Color::Red, "✗"),
    }
}

impl Widget for BannerLine<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(banner) = self.banner else {
            return;
        };
        let (color, icon) = style_for(banner.level);
        let style = Style::default().fg(color).add_modifier(Modifier::BOLD);

        // Multi-line errors are flattened; the log has the full text.
        let text = banner.text.replace('\n', " ");
        let line = Line::from(vec![
            Span::styled(format!(" {icon} "), style),
            Span::styled(text, Style::default().fg(color)),
        ]);
        Paragraph::new(line).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_renders_text() {
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);
        let banner = Banner::warning("Please fill in all MySQL connection details.");
        BannerLine::new(Some(&banner)).render(area, &mut buf);

        let row: String = (0..60).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert!(row.contains("! Please fill in all MySQL connection details."));
        assert_eq!(buf[(1, 0)].fg, Color::Yellow);
    }

    #[test]
    fn test_no_banner_renders_nothing() {
        let area = Rect::new(0, 0, 10, 1);
        let mut buf = Buffer::empty(area);
        BannerLine::new(None).render(area, &mut buf);
        assert_eq!(buf, Buffer::empty(area));
    }
}
