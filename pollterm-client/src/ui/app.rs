//! Main application struct and state management
//!
//! The App wires the terminal, the input handler and a running session
//! together and redraws whenever an event arrives.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::Event as CrosstermEvent;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use tracing::{debug, info};

use pollterm_protocol::{KeyEncoder, Method};
use pollterm_utils::Result;

use crate::config::Settings;
use crate::connection::HttpTransport;
use crate::input::{InputAction, InputHandler};
use crate::session::{RunningSession, Session};

use super::event::{AppEvent, EventHandler, EventObserver};
use super::screen::markup_to_lines;
use super::status::{Severity, StatusBar};
use super::terminal::Terminal;

/// Rows reserved below the host screen
const STATUS_ROWS: u16 = 1;

/// Main application
pub struct App {
    settings: Settings,
    events: EventHandler,
    input_handler: InputHandler,
    /// Latest host screen, one entry per row
    screen: Vec<String>,
    status: StatusBar,
    quitting: bool,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        let encoder = KeyEncoder::new().with_legacy_keyup_escape(settings.legacy_keyup_escape);
        let input_handler = InputHandler::new(settings.prefix, encoder);
        let status = StatusBar::new(
            "",
            settings.method,
            settings.color,
            settings.prefix_label.clone(),
        );
        Self {
            settings,
            events: EventHandler::new(Duration::from_millis(250)),
            input_handler,
            screen: Vec::new(),
            status,
            quitting: false,
        }
    }

    /// Check if application should quit
    pub fn should_quit(&self) -> bool {
        self.quitting
    }

    /// Run the main application loop
    pub async fn run(&mut self) -> Result<()> {
        let transport =
            HttpTransport::new(self.settings.url.clone(), self.settings.request_timeout)?;

        // Initialize terminal
        let mut terminal = Terminal::new(self.settings.legacy_keyup_escape)?;
        let (cols, rows) = terminal.size()?;
        let size = self.screen_size(cols, rows);

        let session = Session::from_settings(&self.settings, size);
        self.status = StatusBar::new(
            session.token().as_str(),
            self.settings.method,
            self.settings.color,
            self.settings.prefix_label.clone(),
        );
        let running = session.spawn(Arc::new(transport), EventObserver::new(self.events.sender()));
        info!(url = %self.settings.url, session = %running.token(), "connecting to host");

        self.events.start_input_polling();

        let result = self.event_loop(&mut terminal, &running).await;
        running.shutdown().await?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut Terminal, session: &RunningSession) -> Result<()> {
        while !self.should_quit() {
            self.draw(terminal)?;

            match self.events.next().await {
                Some(event) => self.handle_event(event, session)?,
                None => break,
            }
        }
        Ok(())
    }

    /// Screen size to report to the host for a local terminal of
    /// `cols` x `rows`
    fn screen_size(&self, cols: u16, rows: u16) -> (u16, u16) {
        let width = self.settings.width.unwrap_or(cols).max(1);
        let height = self
            .settings
            .height
            .unwrap_or_else(|| rows.saturating_sub(STATUS_ROWS))
            .max(1);
        (width, height)
    }

    fn follows_terminal(&self) -> bool {
        self.settings.width.is_none() || self.settings.height.is_none()
    }

    /// Handle an application event
    fn handle_event(&mut self, event: AppEvent, session: &RunningSession) -> Result<()> {
        match event {
            AppEvent::Input(input) => self.handle_input(input, session)?,
            AppEvent::Screen(content) => self.screen = markup_to_lines(&content),
            AppEvent::Status(message) => self.status.set_message(message, Severity::Info),
            AppEvent::ConnectivityError(message) => {
                self.status.set_message(message, Severity::Error)
            }
            AppEvent::Tick => {}
        }
        Ok(())
    }

    fn handle_input(&mut self, input: CrosstermEvent, session: &RunningSession) -> Result<()> {
        match self.input_handler.handle_event(input) {
            InputAction::None => {}
            InputAction::Send(chunk) => session.send_keys(chunk)?,
            InputAction::ToggleGet => {
                let method = session.config().toggle_get();
                debug!(method = method.as_str(), "request method toggled");
                self.status
                    .set_transport(method, session.config().color_enabled());
                let label = match method {
                    Method::Get => "Polling with GET",
                    Method::Post => "Polling with POST",
                };
                self.status.set_message(label, Severity::Info);
            }
            InputAction::ToggleColor => {
                let color = session.config().toggle_color();
                debug!(color, "colour mode toggled");
                self.status.set_transport(session.config().method(), color);
                let label = if color { "Colour on" } else { "Colour off" };
                self.status.set_message(label, Severity::Info);
            }
            InputAction::Resize { cols, rows } => {
                if self.follows_terminal() {
                    let (width, height) = self.screen_size(cols, rows);
                    session.resize(width, height)?;
                }
            }
            InputAction::Quit => {
                info!("quit requested");
                self.quitting = true;
            }
        }
        Ok(())
    }

    fn draw(&self, terminal: &mut Terminal) -> Result<()> {
        terminal.terminal_mut().draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(1), Constraint::Length(STATUS_ROWS)])
                .split(frame.area());

            let lines: Vec<Line> = self.screen.iter().map(|row| Line::raw(row.as_str())).collect();
            frame.render_widget(Paragraph::new(lines), chunks[0]);
            frame.render_widget(&self.status, chunks[1]);
        })?;
        Ok(())
    }
}
