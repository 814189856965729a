//! Command-line argument parsing for pollterm
//!
//! Uses clap for argument parsing with derive macros. Every flag is optional
//! so that values left unset fall back to the config file.

use clap::Parser;
use pollterm_protocol::Method;
use std::path::PathBuf;

/// pollterm - terminal client for HTTP-polled remote terminal hosts
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Base URL of the terminal host
    ///
    /// Requests go to `<URL>/u`.
    /// Example: http://127.0.0.1:8022/
    #[arg(env = "POLLTERM_URL")]
    pub url: Option<String>,

    /// Screen width in columns
    #[arg(long, short = 'W')]
    pub width: Option<u16>,

    /// Screen height in rows
    #[arg(long, short = 'H')]
    pub height: Option<u16>,

    /// Poll with GET instead of POST
    #[arg(long, default_value_t = false, conflicts_with = "post")]
    pub get: bool,

    /// Poll with POST, even if the config file selects GET
    #[arg(long, default_value_t = false)]
    pub post: bool,

    /// Ask the host for colour screens, even if the config file turns them off
    #[arg(long, default_value_t = false, conflicts_with = "no_color")]
    pub color: bool,

    /// Ask the host for monochrome screens
    #[arg(long, default_value_t = false)]
    pub no_color: bool,

    /// Do not send cache-defeating headers on GET requests
    #[arg(long, default_value_t = false)]
    pub no_cache_bust: bool,

    /// Length of the generated session token
    #[arg(long)]
    pub token_length: Option<usize>,

    /// Reuse an existing session token instead of generating one
    #[arg(long, short = 's')]
    pub session: Option<String>,

    /// Custom config file path
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Milliseconds before an unanswered request is reported
    #[arg(long)]
    pub watchdog_ms: Option<u64>,

    /// Upper bound of the idle polling delay in milliseconds
    #[arg(long)]
    pub max_delay_ms: Option<u64>,

    /// Send a lone ESC when Page Up is released
    ///
    /// Matches hosts that expect the behaviour of older browser clients.
    #[arg(long, default_value_t = false)]
    pub legacy_keyup_escape: bool,

    /// Write debug logs, with spans and source locations, to the log file
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

impl Args {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Request method forced on the command line
    pub fn method(&self) -> Option<Method> {
        match (self.get, self.post) {
            (true, _) => Some(Method::Get),
            (_, true) => Some(Method::Post),
            _ => None,
        }
    }

    /// Colour mode forced on the command line
    pub fn color(&self) -> Option<bool> {
        match (self.color, self.no_color) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}
