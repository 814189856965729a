//! Input handling for pollterm client
//!
//! Keys normally go straight to the host. A prefix key (default Ctrl-])
//! introduces a local command instead, similar to telnet's escape
//! character.

mod keys;

pub use keys::translate_key;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use pollterm_protocol::{escape_text, KeyEncoder, KeyEvent as RawKey};
use tracing::trace;

/// Input handling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Keys go to the host
    Normal,
    /// Prefix key pressed - waiting for command key
    PrefixPending,
}

/// Result of processing an input event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// No action needed
    None,
    /// Queue this escaped chunk for the host
    Send(String),
    /// Switch between GET and POST polling
    ToggleGet,
    /// Switch colour mode
    ToggleColor,
    /// Terminal resize event
    Resize { cols: u16, rows: u16 },
    /// Quit the client
    Quit,
}

/// Main input handler with prefix key state machine
pub struct InputHandler {
    mode: InputMode,
    /// Prefix key, compared after translation so that equivalent
    /// terminal reports (Ctrl-] and Ctrl-5) both match
    prefix: RawKey,
    encoder: KeyEncoder,
}

impl InputHandler {
    pub fn new(prefix: RawKey, encoder: KeyEncoder) -> Self {
        Self {
            mode: InputMode::Normal,
            prefix,
            encoder,
        }
    }

    /// Get current input mode
    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Process a crossterm event and return the appropriate action
    pub fn handle_event(&mut self, event: Event) -> InputAction {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Resize(cols, rows) => InputAction::Resize { cols, rows },
            Event::Paste(text) if !text.is_empty() => InputAction::Send(escape_text(&text)),
            _ => InputAction::None,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> InputAction {
        let Some(raw) = translate_key(&key) else {
            return InputAction::None;
        };
        trace!(key = %raw, "key event");

        // Releases only matter to the encoder, never to local commands
        if key.kind == KeyEventKind::Release {
            return self.send(&raw);
        }

        match self.mode {
            InputMode::Normal => {
                if self.is_prefix_key(&raw) {
                    self.mode = InputMode::PrefixPending;
                    return InputAction::None;
                }
                self.send(&raw)
            }
            InputMode::PrefixPending => self.handle_prefix_key(key, &raw),
        }
    }

    /// Handle key after prefix was pressed
    fn handle_prefix_key(&mut self, key: KeyEvent, raw: &RawKey) -> InputAction {
        if self.encoder.encode(raw).is_none() {
            // Modifier presses on the way to the command key
            return InputAction::None;
        }
        self.mode = InputMode::Normal;

        // If prefix key pressed again, send literal prefix
        if self.is_prefix_key(raw) {
            return self.send(raw);
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => InputAction::Quit,
            KeyCode::Char('g') | KeyCode::Char('G') => InputAction::ToggleGet,
            KeyCode::Char('c') | KeyCode::Char('C') => InputAction::ToggleColor,
            _ => InputAction::None,
        }
    }

    fn send(&self, raw: &RawKey) -> InputAction {
        match self.encoder.encode_escaped(raw) {
            Some(chunk) => InputAction::Send(chunk),
            None => InputAction::None,
        }
    }

    /// Check if a key matches the prefix key
    fn is_prefix_key(&self, raw: &RawKey) -> bool {
        raw.key_code == self.prefix.key_code
            && raw.which == self.prefix.which
            && raw.modifiers == self.prefix.modifiers
    }
}
