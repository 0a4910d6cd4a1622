//! Sidebar widget for the TUI.
//!
//! The "Database Connection" form: a kind selector, the fields for that
//! kind and a connect button.

use crate::db::DatabaseBackend;
use crate::tui::app::{ConnectionForm, Focus};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Rows above the first field: the selector and a blank line.
const FIELDS_TOP: u16 = 2;

/// Labelled text fields for `kind`, in display order.
pub fn fields(kind: DatabaseBackend) -> &'static [(Focus, &'static str)] {
    match kind {
        DatabaseBackend::Sqlite => &[(Focus::SqlitePath, "Database file")],
        DatabaseBackend::MySql => &[
            (Focus::Host, "Host"),
            (Focus::User, "User"),
            (Focus::Password, "Password"),
            (Focus::Database, "Database"),
        ],
    }
}

/// Where the terminal cursor goes when a sidebar field has focus.
pub fn cursor_position(area: Rect, form: &ConnectionForm, focus: Focus) -> Option<(u16, u16)> {
    let row = fields(form.kind).iter().position(|(f, _)| *f == focus)? as u16;
    let field = form.field(focus)?;
    let inner = Block::default().borders(Borders::ALL).inner(area);
    let max_x = inner.right().saturating_sub(1);
    let x = (inner.x + 2 + field.cursor as u16).min(max_x);
    Some((x, inner.y + FIELDS_TOP + row * 2 + 1))
}

/// Sidebar widget for the connection form.
pub struct Sidebar<'a> {
    form: &'a ConnectionForm,
    focus: Focus,
}

impl<'a> Sidebar<'a> {
    pub fn new(form: &'a ConnectionForm, focus: Focus) -> Self {
        Self { form, focus }
    }

    fn selector(&self) -> Line<'static> {
        let focused = self.focus == Focus::Kind;
        let option = |kind: DatabaseBackend| {
            let selected = self.form.kind == kind;
            let marker = if selected { "(•) " } else { "( ) " };
            let mut style = Style::default();
            if selected {
                style = style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
            }
            if selected && focused {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Span::styled(format!("{marker}{}", kind.dialect()), style)
        };
        Line::from(vec![
            option(DatabaseBackend::Sqlite),
            Span::raw("  "),
            option(DatabaseBackend::MySql),
        ])
    }

    fn field_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for (focus, label) in fields(self.form.kind) {
            let focused = self.focus == *focus;
            let label_style = if focused {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::Gray)
            };
            lines.push(Line::from(Span::styled(*label, label_style)));

            let text = self
                .form
                .field(*focus)
                .map(|f| f.text.clone())
                .unwrap_or_default();
            let shown = if *focus == Focus::Password {
                "*".repeat(text.chars().count())
            } else {
                text
            };
            lines.push(Line::from(vec![
                Span::styled("> ", Style::default().fg(Color::DarkGray)),
                Span::raw(shown),
            ]));
        }
        lines
    }

    fn button(&self) -> Line<'static> {
        let mut style = Style::default().fg(Color::Green).add_modifier(Modifier::BOLD);
        if self.focus == Focus::Connect {
            style = style.add_modifier(Modifier::REVERSED);
        }
        Line::from(Span::styled(
            format!("[ Connect to {} ]", self.form.kind.dialect()),
            style,
        ))
    }
}

impl Widget for Sidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focus.in_sidebar() {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Database Connection ");

        let mut lines = vec![self.selector(), Line::from("")];
        lines.extend(self.field_lines());
        lines.push(Line::from(""));
        lines.push(self.button());
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "←/→ type · Tab next · Enter connect",
            Style::default().fg(Color::DarkGray),
        )));

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
