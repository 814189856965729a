//! Logging infrastructure for pollterm
//!
//! Provides unified logging setup using the tracing ecosystem.

use std::path::PathBuf;

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::{paths, PolltermError, Result};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "POLLTERM_LOG";

/// Logging configuration
///
/// Output always goes to a file since the client UI owns the terminal.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level filter (e.g., "info", "pollterm=debug,reqwest=warn")
    pub filter: String,
    /// Include span events (enter/exit)
    pub span_events: bool,
    /// Include file/line in logs
    pub file_line: bool,
    /// Directory for file output (defaults to [`paths::log_dir`])
    pub directory: Option<PathBuf>,
    /// Log file name (defaults to "pollterm.log")
    pub file_name: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            span_events: false,
            file_line: false,
            directory: None,
            file_name: None,
        }
    }
}

impl LogConfig {
    /// Create config for the terminal client
    pub fn client() -> Self {
        Self {
            filter: std::env::var(LOG_ENV).unwrap_or_else(|_| "warn".into()),
            ..Self::default()
        }
    }

    /// Create config for debugging a session: verbose, with spans and
    /// source locations
    pub fn debug() -> Self {
        Self {
            filter: "debug".into(),
            span_events: true,
            file_line: true,
            ..Self::client()
        }
    }

    /// Path of the log file
    pub fn file_path(&self) -> PathBuf {
        let dir = self.directory.clone().unwrap_or_else(paths::log_dir);
        dir.join(self.file_name.as_deref().unwrap_or("pollterm.log"))
    }
}

/// Initialize logging with custom configuration
pub fn init_logging_with_config(config: LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| PolltermError::config(format!("Invalid log filter: {}", e)))?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false);

    let fmt_layer = if config.span_events {
        fmt_layer.with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
    } else {
        fmt_layer
    };

    let fmt_layer = if config.file_line {
        fmt_layer.with_file(true).with_line_number(true)
    } else {
        fmt_layer.with_file(false).with_line_number(false)
    };

    let log_path = config.file_path();
    if let Some(log_dir) = log_path.parent() {
        std::fs::create_dir_all(log_dir).map_err(|e| PolltermError::FileWrite {
            path: log_dir.to_path_buf(),
            source: e,
        })?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| PolltermError::FileWrite {
            path: log_path,
            source: e,
        })?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer.with_writer(file).with_ansi(false))
        .try_init()
        .map_err(|e| PolltermError::internal(format!("Failed to init logging: {}", e)))?;

    Ok(())
}
