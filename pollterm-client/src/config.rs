//! Client-side configuration loading
//!
//! Settings come from three layers: command-line flags, the config file
//! (`~/.config/pollterm/config.toml`) and built-in defaults, in that order
//! of precedence. Every key of the file is optional.

use std::path::Path;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pollterm_protocol::{KeyEvent as RawKey, Method, SessionToken, DEFAULT_TOKEN_LENGTH};
use pollterm_utils::{PolltermError, Result};
use serde::Deserialize;
use url::Url;

use crate::cli::Args;
use crate::connection::{normalize_base_url, PollTimings};
use crate::input::translate_key;

pub const DEFAULT_URL: &str = "http://127.0.0.1:8022/";
pub const DEFAULT_PREFIX: &str = "Ctrl-]";
const MAX_TOKEN_LENGTH: usize = 256;

/// Contents of the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub server: ServerConfig,
    pub transport: TransportSection,
    pub polling: PollingConfig,
    pub session: SessionConfig,
    pub keys: KeysConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub url: String,
    /// Fixed screen width; follows the local terminal when unset
    pub width: Option<u16>,
    /// Fixed screen height; follows the local terminal when unset
    pub height: Option<u16>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            width: None,
            height: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportSection {
    pub method: Method,
    pub color: bool,
    pub cache_bust: bool,
    pub request_timeout_ms: u64,
}

impl Default for TransportSection {
    fn default() -> Self {
        Self {
            method: Method::Post,
            color: true,
            cache_bust: true,
            request_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollingConfig {
    pub startup_delay_ms: u64,
    pub input_delay_ms: u64,
    pub active_delay_ms: u64,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub watchdog_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        let t = PollTimings::default();
        Self {
            startup_delay_ms: millis(t.startup_delay),
            input_delay_ms: millis(t.input_delay),
            active_delay_ms: millis(t.active_delay),
            initial_delay_ms: millis(t.initial_delay),
            max_delay_ms: millis(t.max_delay),
            watchdog_ms: millis(t.watchdog),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub token_length: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_length: DEFAULT_TOKEN_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeysConfig {
    /// Key that introduces a local command, e.g. "Ctrl-]"
    pub prefix: String,
    pub legacy_keyup_escape: bool,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            legacy_keyup_escape: false,
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl ClientConfig {
    /// Load the config file
    ///
    /// With no explicit path a missing default file yields the defaults;
    /// an explicit path must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(PolltermError::ConfigNotFound(path.to_path_buf()));
                }
                path.to_path_buf()
            }
            None => {
                let path = pollterm_utils::config_file();
                if !path.exists() {
                    tracing::debug!("Config file not found, using defaults");
                    return Ok(Self::default());
                }
                path
            }
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| PolltermError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|message| PolltermError::ConfigInvalid {
            path: path.to_path_buf(),
            message,
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }
}

/// Effective client settings after layering
#[derive(Debug, Clone)]
pub struct Settings {
    pub url: Url,
    pub width: Option<u16>,
    pub height: Option<u16>,
    pub method: Method,
    pub color: bool,
    pub cache_bust: bool,
    pub request_timeout: Duration,
    pub timings: PollTimings,
    pub token_length: usize,
    /// Token to reattach to instead of generating one
    pub session: Option<SessionToken>,
    pub prefix: RawKey,
    pub prefix_label: String,
    pub legacy_keyup_escape: bool,
}

impl Settings {
    /// Layer command-line flags over the config file
    pub fn resolve(args: &Args, file: ClientConfig) -> Result<Self> {
        let raw_url = args.url.as_deref().unwrap_or(&file.server.url);
        let url = normalize_base_url(raw_url)?;

        let width = args.width.or(file.server.width);
        let height = args.height.or(file.server.height);
        if width == Some(0) || height == Some(0) {
            return Err(PolltermError::config("screen dimensions must be at least 1"));
        }

        let method = args.method().unwrap_or(file.transport.method);

        let polling = &file.polling;
        let timings = PollTimings {
            startup_delay: Duration::from_millis(polling.startup_delay_ms),
            input_delay: Duration::from_millis(polling.input_delay_ms),
            active_delay: Duration::from_millis(polling.active_delay_ms),
            initial_delay: Duration::from_millis(polling.initial_delay_ms),
            max_delay: Duration::from_millis(args.max_delay_ms.unwrap_or(polling.max_delay_ms)),
            watchdog: Duration::from_millis(args.watchdog_ms.unwrap_or(polling.watchdog_ms)),
        };
        if timings.max_delay.is_zero() {
            return Err(PolltermError::config("max_delay_ms must be at least 1"));
        }
        if timings.watchdog.is_zero() {
            return Err(PolltermError::config("watchdog_ms must be at least 1"));
        }
        if file.transport.request_timeout_ms == 0 {
            return Err(PolltermError::config("request_timeout_ms must be at least 1"));
        }

        let token_length = args.token_length.unwrap_or(file.session.token_length);
        if !(1..=MAX_TOKEN_LENGTH).contains(&token_length) {
            return Err(PolltermError::config(format!(
                "token_length must be between 1 and {MAX_TOKEN_LENGTH}"
            )));
        }

        let session = args
            .session
            .as_deref()
            .map(SessionToken::parse)
            .transpose()
            .map_err(|e| PolltermError::config(e.to_string()))?;

        let prefix = parse_key(&file.keys.prefix)
            .and_then(|key| translate_key(&key))
            .ok_or_else(|| {
                PolltermError::config(format!("invalid prefix key '{}'", file.keys.prefix))
            })?;

        Ok(Self {
            url,
            width,
            height,
            method,
            color: args.color().unwrap_or(file.transport.color),
            cache_bust: file.transport.cache_bust && !args.no_cache_bust,
            request_timeout: Duration::from_millis(file.transport.request_timeout_ms),
            timings,
            token_length,
            session,
            prefix,
            prefix_label: file.keys.prefix,
            legacy_keyup_escape: args.legacy_keyup_escape || file.keys.legacy_keyup_escape,
        })
    }

    /// Load the config file named by `args` (or the default one) and layer
    /// `args` over it
    pub fn load(args: &Args) -> Result<Self> {
        let file = ClientConfig::load(args.config.as_deref())?;
        Self::resolve(args, file)
    }
}

/// Parse a key description such as "Ctrl-]", "Alt-x" or "F12"
///
/// Modifier names are case-insensitive and may be chained.
pub fn parse_key(spec: &str) -> Option<KeyEvent> {
    let mut modifiers = KeyModifiers::NONE;
    let mut rest = spec.trim();

    loop {
        let lower = rest.to_ascii_lowercase();
        let (modifier, len) = if lower.starts_with("ctrl-") {
            (KeyModifiers::CONTROL, 5)
        } else if lower.starts_with("alt-") {
            (KeyModifiers::ALT, 4)
        } else if lower.starts_with("shift-") {
            (KeyModifiers::SHIFT, 6)
        } else {
            break;
        };
        modifiers |= modifier;
        rest = &rest[len..];
    }

    let code = match rest.to_ascii_lowercase().as_str() {
        "esc" | "escape" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        "enter" => KeyCode::Enter,
        "space" => KeyCode::Char(' '),
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        "insert" => KeyCode::Insert,
        "delete" => KeyCode::Delete,
        f if f.len() > 1 && f.starts_with('f') => KeyCode::F(f[1..].parse().ok()?),
        _ => {
            let mut chars = rest.chars();
            let c = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            KeyCode::Char(c)
        }
    };

    Some(KeyEvent::new(code, modifiers))
}
