//! Event handling for the application
//!
//! Combines terminal input events with session notifications into a unified
//! event stream.

use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent};
use tokio::sync::mpsc;
use tracing::error;

use crate::connection::SessionObserver;

/// Application events combining input and session notifications
#[derive(Debug)]
pub enum AppEvent {
    /// Terminal input event (keys, paste, resize)
    Input(CrosstermEvent),
    /// The host sent a new screen
    Screen(String),
    /// Informational message from the session
    Status(String),
    /// The session lost contact with the host
    ConnectivityError(String),
    /// Periodic wake-up
    Tick,
}

/// Event handler that combines input polling with session notifications
pub struct EventHandler {
    tx: mpsc::UnboundedSender<AppEvent>,
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tick_rate: Duration,
}

impl EventHandler {
    /// Create a new event handler
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx, tick_rate }
    }

    /// Get a sender clone for forwarding session notifications
    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.tx.clone()
    }

    /// Start polling for terminal events on a background thread
    pub fn start_input_polling(&self) {
        let tx = self.tx.clone();
        let tick_rate = self.tick_rate;

        std::thread::spawn(move || loop {
            let event = if event::poll(tick_rate).unwrap_or(false) {
                match event::read() {
                    Ok(CrosstermEvent::Mouse(_)) => continue,
                    Ok(event) => AppEvent::Input(event),
                    Err(e) => {
                        error!("Error reading terminal event: {}", e);
                        break;
                    }
                }
            } else {
                AppEvent::Tick
            };
            if tx.send(event).is_err() {
                break;
            }
        });
    }

    /// Receive next event
    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

/// Forwards polling channel notifications into the app event stream
pub struct EventObserver {
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl EventObserver {
    pub fn new(tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }

    fn forward(&self, event: AppEvent) {
        // The app has quit when the receiver is gone; nothing left to show
        let _ = self.tx.send(event);
    }
}

impl SessionObserver for EventObserver {
    fn on_screen_update(&mut self, content: String) {
        self.forward(AppEvent::Screen(content));
    }

    fn on_status(&mut self, message: String) {
        self.forward(AppEvent::Status(message));
    }

    fn on_connectivity_error(&mut self, message: String) {
        self.forward(AppEvent::ConnectivityError(message));
    }
}
