//! Chat panel widget for the TUI.
//!
//! Shows the connection info line and the Human/AI transcript.

use crate::session::{Turn, TurnRole};
use crate::tui::app::CONNECT_PROMPT;
use crate::tui::text::wrap;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Chat panel widget.
pub struct ChatPanel<'a> {
    transcript: &'a [Turn],
    db_name: Option<&'a str>,
    /// Lines scrolled up from the bottom.
    scroll: usize,
}

impl<'a> ChatPanel<'a> {
    pub fn new(transcript: &'a [Turn], db_name: Option<&'a str>, scroll: usize) -> Self {
        Self {
            transcript,
            db_name,
            scroll,
        }
    }

    fn info_line(&self) -> Line<'static> {
        match self.db_name {
            Some(name) => Line::from(vec![
                Span::styled("Currently connected to: ", Style::default().fg(Color::Cyan)),
                Span::styled(
                    name.to_string(),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
            ]),
            None => Line::from(Span::styled(CONNECT_PROMPT, Style::default().fg(Color::Cyan))),
        }
    }

    /// Transcript lines wrapped to `width`.
    pub fn transcript_lines(&self, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for turn in self.transcript {
            let (label, color) = match turn.role {
                TurnRole::Human => ("Human", Color::Green),
                TurnRole::Ai => ("AI", Color::Magenta),
            };
            lines.push(Line::from(Span::styled(
                label,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
            lines.extend(
                wrap(&turn.content, width.saturating_sub(2))
                    .into_iter()
                    .map(|l| Line::from(format!("  {l}"))),
            );
            lines.push(Line::from(""));
        }
        lines
    }
}

impl Widget for ChatPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Chat ");
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 {
            return;
        }

        Paragraph::new(self.info_line()).render(Rect { height: 1, ..inner }, buf);

        let body = Rect {
            y: inner.y + 1,
            height: inner.height.saturating_sub(1),
            ..inner
        };
        let lines = self.transcript_lines(body.width as usize);
        let visible = body.height as usize;
        let max_scroll = lines.len().saturating_sub(visible);
        let start = max_scroll.saturating_sub(self.scroll.min(max_scroll));
        let shown: Vec<Line> = lines.into_iter().skip(start).take(visible).collect();

        Paragraph::new(shown).render(body, buf);
    }
}
