//! Status bar widget for the application
//!
//! Displays the session token, transport mode, the latest session message
//! and keybinding hints.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;

use pollterm_protocol::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

impl Severity {
    pub fn style(&self) -> Style {
        match self {
            Self::Info => Style::default().fg(Color::Green),
            Self::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        }
    }
}

/// Status bar component
#[derive(Debug, Clone)]
pub struct StatusBar {
    token: String,
    method: Method,
    color: bool,
    prefix: String,
    message: Option<(String, Severity)>,
}

impl StatusBar {
    pub fn new(token: impl Into<String>, method: Method, color: bool, prefix: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            method,
            color,
            prefix: prefix.into(),
            message: None,
        }
    }

    pub fn set_transport(&mut self, method: Method, color: bool) {
        self.method = method;
        self.color = color;
    }

    pub fn set_message(&mut self, message: impl Into<String>, severity: Severity) {
        self.message = Some((message.into(), severity));
    }

    pub fn message(&self) -> Option<&(String, Severity)> {
        self.message.as_ref()
    }

    fn line(&self) -> Line<'_> {
        let dim = Style::default().fg(Color::Gray);
        let mut spans = vec![
            Span::styled(" pollterm ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled("│ ", dim),
            Span::raw(self.token.as_str()),
            Span::styled(" │ ", dim),
            Span::raw(self.method.as_str()),
            Span::raw(if self.color { " colour" } else { " mono" }),
            Span::styled(" │ ", dim),
        ];
        if let Some((message, severity)) = &self.message {
            spans.push(Span::styled(message.as_str(), severity.style()));
            spans.push(Span::styled(" │ ", dim));
        }
        spans.push(Span::styled(
            format!("{} q:quit g:get/post c:colour", self.prefix),
            dim,
        ));
        Line::from(spans)
    }
}

impl Widget for &StatusBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Style::default().bg(Color::DarkGray));
        self.line().render(area, buf);
    }
}
