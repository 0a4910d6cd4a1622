//! UI rendering for the TUI.
//!
//! Defines the layout and renders all UI components.

use super::app::{App, Focus};
use super::widgets::{banner, chat, header, input, sidebar};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

/// Sidebar width in columns.
const SIDEBAR_WIDTH: u16 = 36;

/// Renders the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Header, then sidebar | main
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(rows[1]);

    // Main column: chat, banner, input
    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(columns[1]);

    render_header(frame, rows[0], app);
    render_sidebar(frame, columns[0], app);
    render_chat(frame, main[0], app);
    render_banner(frame, main[1], app);
    render_input(frame, main[2], app);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let widget = header::Header::new(app.db_name.as_deref(), app.progress.as_ref());
    frame.render_widget(widget, area);
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    frame.render_widget(sidebar::Sidebar::new(&app.form, app.focus), area);

    if app.progress.is_none() {
        if let Some(position) = sidebar::cursor_position(area, &app.form, app.focus) {
            frame.set_cursor_position(position);
        }
    }
}

fn render_chat(frame: &mut Frame, area: Rect, app: &App) {
    let widget = chat::ChatPanel::new(&app.transcript, app.db_name.as_deref(), app.chat_scroll);
    frame.render_widget(widget, area);
}

/// The banner line doubles as the progress line while an action runs.
fn render_banner(frame: &mut Frame, area: Rect, app: &App) {
    if let Some(spinner) = &app.progress {
        let progress = crate::session::Banner::info(spinner.display());
        frame.render_widget(banner::BannerLine::new(Some(&progress)), area);
    } else {
        frame.render_widget(banner::BannerLine::new(app.banner.as_ref()), area);
    }
}

fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let placeholder = app.input_placeholder();
    let focused = app.focus == Focus::Input;
    let widget = input::InputBar::new(
        &app.input.text,
        app.input.cursor,
        &placeholder,
        focused,
        app.is_connected(),
    );
    let cursor = widget.cursor_position(area);
    frame.render_widget(widget, area);

    if focused && app.is_connected() && app.progress.is_none() {
        frame.set_cursor_position(cursor);
    }
}
