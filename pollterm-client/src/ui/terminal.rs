//! Terminal initialization and cleanup
//!
//! Provides safe terminal mode management using crossterm backend.

use std::io::{self, Stdout};

use crossterm::{
    event::{
        DisableBracketedPaste, EnableBracketedPaste, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::backend::CrosstermBackend;
use tracing::debug;

use pollterm_utils::Result;

/// Terminal wrapper that handles initialization and cleanup
pub struct Terminal {
    terminal: ratatui::Terminal<CrosstermBackend<Stdout>>,
    /// Keyboard enhancement flags were pushed and must be popped
    keyboard_enhanced: bool,
}

/// Flags to push for a session, if any
///
/// Outside Windows crossterm only reports key releases once the terminal
/// is asked for event types.
fn enhancement_flags(report_key_releases: bool) -> Option<KeyboardEnhancementFlags> {
    report_key_releases.then_some(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
}

impl Terminal {
    /// Initialize the terminal in raw mode with alternate screen
    ///
    /// With `report_key_releases` the terminal is asked to report key-up
    /// events where it supports the keyboard enhancement protocol.
    pub fn new(report_key_releases: bool) -> Result<Self> {
        enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;

        let keyboard_enhanced = match enhancement_flags(report_key_releases) {
            Some(flags) => match supports_keyboard_enhancement() {
                Ok(true) => execute!(stdout, PushKeyboardEnhancementFlags(flags)).is_ok(),
                _ => {
                    debug!("terminal does not report key releases");
                    false
                }
            },
            None => false,
        };

        let backend = CrosstermBackend::new(stdout);
        let terminal = ratatui::Terminal::new(backend)?;

        Ok(Self {
            terminal,
            keyboard_enhanced,
        })
    }

    /// Get mutable reference to the underlying terminal for drawing
    pub fn terminal_mut(&mut self) -> &mut ratatui::Terminal<CrosstermBackend<Stdout>> {
        &mut self.terminal
    }

    /// Get terminal size (columns, rows)
    pub fn size(&self) -> Result<(u16, u16)> {
        let size = self.terminal.size()?;
        Ok((size.width, size.height))
    }

    /// Restore terminal to original state
    fn restore(&self) -> Result<()> {
        let mut stdout = io::stdout();
        if self.keyboard_enhanced {
            execute!(stdout, PopKeyboardEnhancementFlags)?;
        }
        disable_raw_mode()?;
        execute!(stdout, LeaveAlternateScreen, DisableBracketedPaste)?;
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            tracing::error!("Failed to restore terminal: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_reporting_requests_event_types() {
        let flags = enhancement_flags(true).unwrap();
        assert!(flags.contains(KeyboardEnhancementFlags::REPORT_EVENT_TYPES));
        // Escape codes stay legacy so Ctrl chords arrive as before
        assert!(!flags.contains(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES));
    }

    #[test]
    fn test_no_flags_without_release_reporting() {
        assert_eq!(enhancement_flags(false), None);
    }
}
