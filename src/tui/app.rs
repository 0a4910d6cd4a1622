//! Application state for the TUI.
//!
//! Contains the main App struct and related types for managing UI state.
//! The App never talks to the database or the LLM itself: key handling
//! yields an [`Action`] that the event loop performs against the session.

use super::text::byte_index;
use super::widgets::spinner::Spinner;
use crate::config::ConnectionConfig;
use crate::db::DatabaseBackend;
use crate::session::{Banner, SessionState, Turn};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Progress text while a question is being answered.
pub const THINKING_LABEL: &str = "Thinking and querying the database...";

/// Shown in the main panel until a database is connected.
pub const CONNECT_PROMPT: &str = "Please connect to a database using the sidebar to begin.";

/// Which control currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// The SQLite/MySQL selector.
    #[default]
    Kind,
    SqlitePath,
    Host,
    User,
    Password,
    Database,
    /// The connect button.
    Connect,
    /// The question input bar.
    Input,
}

const SQLITE_ORDER: &[Focus] = &[Focus::Kind, Focus::SqlitePath, Focus::Connect, Focus::Input];

const MYSQL_ORDER: &[Focus] = &[
    Focus::Kind,
    Focus::Host,
    Focus::User,
    Focus::Password,
    Focus::Database,
    Focus::Connect,
    Focus::Input,
];

impl Focus {
    /// Focus order for the form of `kind`.
    pub fn order(kind: DatabaseBackend) -> &'static [Focus] {
        match kind {
            DatabaseBackend::Sqlite => SQLITE_ORDER,
            DatabaseBackend::MySql => MYSQL_ORDER,
        }
    }

    /// Cycles to the next control.
    pub fn next(self, kind: DatabaseBackend) -> Self {
        let order = Self::order(kind);
        let i = order.iter().position(|f| *f == self).unwrap_or(0);
        order[(i + 1) % order.len()]
    }

    /// Cycles to the previous control.
    pub fn prev(self, kind: DatabaseBackend) -> Self {
        let order = Self::order(kind);
        let i = order.iter().position(|f| *f == self).unwrap_or(0);
        order[(i + order.len() - 1) % order.len()]
    }

    /// True for every control in the sidebar.
    pub fn in_sidebar(self) -> bool {
        self != Self::Input
    }
}

/// Input state for text editing.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    /// Current input text.
    pub text: String,
    /// Cursor position (character index).
    pub cursor: usize,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// An input pre-filled with `text`, cursor at the end.
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Inserts a character at the cursor position.
    pub fn insert(&mut self, c: char) {
        let at = byte_index(&self.text, self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    /// Deletes the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = byte_index(&self.text, self.cursor);
            self.text.remove(at);
        }
    }

    /// Deletes the character at the cursor (delete key).
    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let at = byte_index(&self.text, self.cursor);
            self.text.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.len() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.len();
    }

    /// Clears the input and returns the previous text.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Applies an editing key. Returns false for keys it does not handle.
    fn edit(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c) => self.insert(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.move_home(),
            KeyCode::End => self.move_end(),
            _ => return false,
        }
        true
    }
}

/// The sidebar connection form.
#[derive(Debug, Clone)]
pub struct ConnectionForm {
    pub kind: DatabaseBackend,
    pub sqlite_path: InputState,
    pub host: InputState,
    pub port: Option<u16>,
    pub user: InputState,
    pub password: InputState,
    pub database: InputState,
}

impl Default for ConnectionForm {
    fn default() -> Self {
        Self {
            kind: DatabaseBackend::Sqlite,
            sqlite_path: InputState::new(),
            host: InputState::with_text("localhost"),
            port: None,
            user: InputState::with_text("root"),
            password: InputState::new(),
            database: InputState::new(),
        }
    }
}

impl ConnectionForm {
    /// A form pre-filled from `config`, or with the defaults.
    pub fn from_config(config: Option<&ConnectionConfig>) -> Self {
        let mut form = Self::default();
        match config {
            Some(ConnectionConfig::Sqlite { path }) => {
                form.sqlite_path = InputState::with_text(path.display().to_string());
            }
            Some(ConnectionConfig::MySql {
                host,
                port,
                user,
                password,
                database,
            }) => {
                form.kind = DatabaseBackend::MySql;
                form.host = InputState::with_text(host.clone());
                form.port = *port;
                form.user = InputState::with_text(user.clone());
                form.password = InputState::with_text(password.clone());
                form.database = InputState::with_text(database.clone());
            }
            None => {}
        }
        form
    }

    pub fn toggle_kind(&mut self) {
        self.kind = match self.kind {
            DatabaseBackend::Sqlite => DatabaseBackend::MySql,
            DatabaseBackend::MySql => DatabaseBackend::Sqlite,
        };
    }

    /// The text field behind `focus`, if it is one.
    pub fn field(&self, focus: Focus) -> Option<&InputState> {
        match focus {
            Focus::SqlitePath => Some(&self.sqlite_path),
            Focus::Host => Some(&self.host),
            Focus::User => Some(&self.user),
            Focus::Password => Some(&self.password),
            Focus::Database => Some(&self.database),
            _ => None,
        }
    }

    fn field_mut(&mut self, focus: Focus) -> Option<&mut InputState> {
        match focus {
            Focus::SqlitePath => Some(&mut self.sqlite_path),
            Focus::Host => Some(&mut self.host),
            Focus::User => Some(&mut self.user),
            Focus::Password => Some(&mut self.password),
            Focus::Database => Some(&mut self.database),
            _ => None,
        }
    }

    /// Connection parameters as currently entered. Not validated.
    pub fn to_config(&self) -> ConnectionConfig {
        match self.kind {
            DatabaseBackend::Sqlite => ConnectionConfig::sqlite(self.sqlite_path.text.trim()),
            DatabaseBackend::MySql => ConnectionConfig::MySql {
                host: self.host.text.trim().to_string(),
                port: self.port,
                user: self.user.text.trim().to_string(),
                password: self.password.text.clone(),
                database: self.database.text.trim().to_string(),
            },
        }
    }
}

/// Progress text while connecting to `kind`.
pub fn connecting_label(kind: DatabaseBackend) -> String {
    format!("Connecting to {}...", kind.dialect())
}

/// Work the event loop performs on behalf of the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Connect(ConnectionConfig),
    Ask(String),
}

/// Main application state.
pub struct App {
    /// Whether the application is still running.
    pub running: bool,
    pub focus: Focus,
    pub form: ConnectionForm,
    /// Question input.
    pub input: InputState,
    /// Transcript as of the last completed action, plus a pending question.
    pub transcript: Vec<Turn>,
    /// Name of the connected database.
    pub db_name: Option<String>,
    pub banner: Option<Banner>,
    /// Set while an action is running.
    pub progress: Option<Spinner>,
    /// Chat scroll offset (lines from bottom).
    pub chat_scroll: usize,
}

impl App {
    /// Creates a new App with the form pre-filled from `connection`.
    pub fn new(connection: Option<&ConnectionConfig>) -> Self {
        Self {
            running: true,
            focus: Focus::default(),
            form: ConnectionForm::from_config(connection),
            input: InputState::new(),
            transcript: Vec::new(),
            db_name: None,
            banner: None,
            progress: None,
            chat_scroll: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.db_name.is_some()
    }

    /// Placeholder for the input bar.
    pub fn input_placeholder(&self) -> String {
        match &self.db_name {
            Some(name) => format!("Ask a question about {name}..."),
            None => "Connect to a database first".to_string(),
        }
    }

    /// Copies the session's transcript and connection into the view.
    pub fn sync(&mut self, session: &SessionState) {
        self.transcript = session.history().to_vec();
        self.db_name = session.db_name().map(str::to_string);
        self.chat_scroll = 0;
    }

    pub fn set_banner(&mut self, banner: Banner) {
        self.banner = Some(banner);
    }

    pub fn clear_banner(&mut self) {
        self.banner = None;
    }

    pub fn start_progress(&mut self, label: impl Into<String>) {
        self.progress = Some(Spinner::new(label));
    }

    pub fn finish_progress(&mut self) {
        self.progress = None;
    }

    /// Handles a key press, returning the action to perform, if any.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
                self.running = false;
                None
            }
            KeyCode::Char('l') if ctrl => {
                self.clear_banner();
                None
            }
            KeyCode::Tab => {
                self.focus = self.focus.next(self.form.kind);
                None
            }
            KeyCode::BackTab => {
                self.focus = self.focus.prev(self.form.kind);
                None
            }
            KeyCode::PageUp => {
                self.chat_scroll = self.chat_scroll.saturating_add(10);
                None
            }
            KeyCode::PageDown => {
                self.chat_scroll = self.chat_scroll.saturating_sub(10);
                None
            }
            KeyCode::Enter if self.focus.in_sidebar() => {
                Some(Action::Connect(self.form.to_config()))
            }
            KeyCode::Enter => self.submit_question(),
            KeyCode::Left | KeyCode::Right if self.focus == Focus::Kind => {
                self.form.toggle_kind();
                None
            }
            _ if ctrl => None,
            _ if self.focus == Focus::Input => {
                if self.is_connected() {
                    self.input.edit(key);
                }
                None
            }
            _ => {
                if let Some(field) = self.form.field_mut(self.focus) {
                    field.edit(key);
                }
                None
            }
        }
    }

    /// Takes the typed question and shows it immediately.
    fn submit_question(&mut self) -> Option<Action> {
        if !self.is_connected() {
            self.set_banner(Banner::info(CONNECT_PROMPT));
            return None;
        }
        let question = self.input.take();
        if question.trim().is_empty() {
            return None;
        }
        self.transcript.push(Turn::human(question.clone()));
        self.chat_scroll = 0;
        Some(Action::Ask(question))
    }
}
