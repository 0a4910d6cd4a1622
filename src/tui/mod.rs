//! Terminal User Interface for sqlchat.
//!
//! Provides the main TUI application loop using ratatui and crossterm.

pub mod app;
mod events;
pub mod headless;
mod text;
mod ui;
pub mod widgets;

pub use app::{Action, App};
pub use events::{Event, EventHandler};

use app::{connecting_label, Focus, THINKING_LABEL};
use crate::agent::AgentFactory;
use crate::config::ConnectionConfig;
use crate::error::{ChatError, Result};
use crate::session::{Banner, SessionState};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::future::Future;
use std::io::{self, Stdout};
use std::panic;
use tracing::{debug, error, info, warn};

/// The main TUI application runner.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_handler: EventHandler,
}

impl Tui {
    /// Creates a new TUI instance, initializing the terminal.
    pub fn new() -> Result<Self> {
        let terminal = Self::setup_terminal()?;
        Ok(Self {
            terminal,
            event_handler: EventHandler::new(),
        })
    }

    /// Sets up the terminal for TUI rendering.
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()
            .map_err(|e| ChatError::internal(format!("Failed to enable raw mode: {e}")))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .map_err(|e| ChatError::internal(format!("Failed to enter alternate screen: {e}")))?;

        let backend = CrosstermBackend::new(stdout);
        Terminal::new(backend)
            .map_err(|e| ChatError::internal(format!("Failed to create terminal: {e}")))
    }

    /// Restores the terminal to its original state.
    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()
            .map_err(|e| ChatError::internal(format!("Failed to disable raw mode: {e}")))?;

        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )
        .map_err(|e| ChatError::internal(format!("Failed to leave alternate screen: {e}")))?;

        self.terminal
            .show_cursor()
            .map_err(|e| ChatError::internal(format!("Failed to show cursor: {e}")))
    }

    fn draw(&mut self, app: &App) -> Result<()> {
        self.terminal
            .draw(|frame| ui::render(frame, app))
            .map_err(|e| ChatError::internal(format!("Failed to draw: {e}")))?;
        Ok(())
    }

    /// Runs the event loop until the user quits.
    ///
    /// When `connection` is given the form is pre-filled with it and a
    /// connection attempt is made right away.
    pub async fn run(
        &mut self,
        session: &mut SessionState,
        factory: &AgentFactory,
        connection: Option<&ConnectionConfig>,
    ) -> Result<()> {
        // Set up panic hook to restore terminal on panic
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
            original_hook(panic_info);
        }));

        let mut app = App::new(connection);
        if let Some(config) = connection {
            self.perform(Action::Connect(config.clone()), &mut app, session, factory)
                .await?;
        }

        let result = self.run_event_loop(&mut app, session, factory).await;

        session.close().await;

        // Restore panic hook
        let _ = panic::take_hook();

        result
    }

    async fn run_event_loop(
        &mut self,
        app: &mut App,
        session: &mut SessionState,
        factory: &AgentFactory,
    ) -> Result<()> {
        loop {
            self.draw(app)?;

            if !app.running {
                break;
            }

            match self.event_handler.next().await? {
                Event::Key(key) => {
                    if let Some(action) = app.handle_key(key) {
                        self.perform(action, app, session, factory).await?;
                    }
                }
                // ratatui picks up the new size on the next draw
                Event::Resize(_, _) | Event::Tick => {}
            }
        }
        Ok(())
    }

    /// Runs one action to completion, redrawing the progress line meanwhile.
    async fn perform(
        &mut self,
        action: Action,
        app: &mut App,
        session: &mut SessionState,
        factory: &AgentFactory,
    ) -> Result<()> {
        match action {
            Action::Connect(config) => {
                debug!(target_db = %config.display_string(), "Connect requested");
                app.start_progress(connecting_label(config.backend()));
                let banner = self
                    .await_with_redraw(app, session.connect(&config, factory))
                    .await?;
                app.finish_progress();
                app.set_banner(banner);
                app.sync(session);
                if session.is_connected() {
                    app.focus = Focus::Input;
                }
            }
            Action::Ask(question) => {
                app.start_progress(THINKING_LABEL);
                let outcome = self
                    .await_with_redraw(app, session.ask(&question))
                    .await?;
                app.finish_progress();
                match outcome {
                    Ok(_) => app.clear_banner(),
                    Err(e) => {
                        if e.is_invocation_error() {
                            warn!(error = %e, "Question failed");
                        } else {
                            error!(error = %e, "Unexpected failure asking question");
                        }
                        app.set_banner(Banner::from_ask_error(&e));
                    }
                }
                app.sync(session);
            }
        }
        Ok(())
    }

    /// Awaits `work` while keeping the spinner animated.
    ///
    /// Key presses made meanwhile stay queued in the terminal and are
    /// handled once `work` completes.
    async fn await_with_redraw<F: Future>(&mut self, app: &App, work: F) -> Result<F::Output> {
        tokio::pin!(work);
        let mut ticker = tokio::time::interval(self.event_handler.tick_rate());
        loop {
            tokio::select! {
                output = &mut work => return Ok(output),
                _ = ticker.tick() => self.draw(app)?,
            }
        }
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}

/// Runs the interactive TUI.
pub async fn run(factory: AgentFactory, connection: Option<ConnectionConfig>) -> Result<()> {
    let mut session = SessionState::new();
    let mut tui = Tui::new()?;
    info!("Starting TUI");
    tui.run(&mut session, &factory, connection.as_ref()).await
}
