//! Event handling for the TUI.
//!
//! Terminal polling blocks, so it runs on the blocking pool and the event
//! loop awaits it.

use crate::error::{ChatError, Result};
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;

/// Application events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// The terminal was resized.
    Resize(u16, u16),
    /// Nothing happened within the tick rate.
    Tick,
}

impl Event {
    /// Maps a raw terminal event. Key releases and repeats are ticks.
    pub fn from_crossterm(event: CrosstermEvent) -> Self {
        match event {
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Self::Key(key),
            CrosstermEvent::Resize(width, height) => Self::Resize(width, height),
            _ => Self::Tick,
        }
    }
}

/// Polls the terminal for events.
#[derive(Debug, Clone, Copy)]
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    /// Creates a new event handler with default tick rate.
    pub fn new() -> Self {
        Self {
            tick_rate: Duration::from_millis(100),
        }
    }

    /// Waits up to one tick for the next event.
    pub async fn next(&self) -> Result<Event> {
        let tick_rate = self.tick_rate;
        tokio::task::spawn_blocking(move || -> Result<Event> {
            if event::poll(tick_rate)
                .map_err(|e| ChatError::internal(format!("Failed to poll events: {e}")))?
            {
                let raw = event::read()
                    .map_err(|e| ChatError::internal(format!("Failed to read event: {e}")))?;
                Ok(Event::from_crossterm(raw))
            } else {
                Ok(Event::Tick)
            }
        })
        .await
        .map_err(|e| ChatError::internal(format!("Event polling task failed: {e}")))?
    }

    pub fn tick_rate(&self) -> Duration {
        self.tick_rate
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}
