//! Error types for pollterm
//!
//! Provides a unified error type used across all pollterm crates.

use std::path::PathBuf;

/// Main error type for pollterm operations
#[derive(Debug, thiserror::Error)]
pub enum PolltermError {
    // === IO Errors ===

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Transport Errors ===

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out after {millis}ms")]
    RequestTimeout { millis: u64 },

    #[error("Connection error, status: {status} {reason}")]
    HttpStatus { status: u16, reason: String },

    #[error("Invalid host URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    // === Protocol Errors ===

    #[error("Protocol error: {0}")]
    Protocol(String),

    // === Configuration Errors ===

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    // === Internal Errors ===

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PolltermError {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an error for a non-success HTTP status
    pub fn http_status(status: u16, reason: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            reason: reason.into(),
        }
    }

    /// Check if this error is retryable
    ///
    /// Everything that can happen on the wire is transient; the polling loop
    /// keeps the session alive across these.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::RequestTimeout { .. } | Self::HttpStatus { .. }
        )
    }
}

/// Result type alias using PolltermError
pub type Result<T> = std::result::Result<T, PolltermError>;

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Display Tests ====================

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = PolltermError::Io(io_err);
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let err = PolltermError::FileRead {
            path: PathBuf::from("/etc/pollterm.toml"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/etc/pollterm.toml"));
    }

    #[test]
    fn test_error_display_connection() {
        let err = PolltermError::Connection("refused".into());
        assert_eq!(err.to_string(), "Connection failed: refused");
    }

    #[test]
    fn test_error_display_request_timeout() {
        let err = PolltermError::RequestTimeout { millis: 30000 };
        assert_eq!(err.to_string(), "Request timed out after 30000ms");
    }

    #[test]
    fn test_error_display_http_status() {
        let err = PolltermError::http_status(503, "Service Unavailable");
        assert_eq!(
            err.to_string(),
            "Connection error, status: 503 Service Unavailable"
        );
    }

    #[test]
    fn test_error_display_invalid_url() {
        let err = PolltermError::InvalidUrl {
            url: "not a url".into(),
            message: "relative URL without a base".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("not a url"));
        assert!(msg.contains("relative URL"));
    }

    #[test]
    fn test_error_display_config_invalid() {
        let err = PolltermError::ConfigInvalid {
            path: PathBuf::from("/home/user/.config/pollterm/config.toml"),
            message: "expected a table".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Invalid configuration"));
        assert!(msg.contains("config.toml"));
        assert!(msg.contains("expected a table"));
    }

    #[test]
    fn test_error_display_config_not_found() {
        let err = PolltermError::ConfigNotFound(PathBuf::from("/missing/config.toml"));
        assert!(err.to_string().contains("/missing/config.toml"));
    }

    // ==================== Retryable Tests ====================

    #[test]
    fn test_retryable_transport_errors() {
        assert!(PolltermError::connection("refused").is_retryable());
        assert!(PolltermError::RequestTimeout { millis: 5 }.is_retryable());
        assert!(PolltermError::http_status(502, "Bad Gateway").is_retryable());
    }

    #[test]
    fn test_not_retryable_errors() {
        let non_retryable = [
            PolltermError::protocol("bad document"),
            PolltermError::config("bad"),
            PolltermError::ConfigNotFound(PathBuf::from("/test")),
            PolltermError::internal("oops"),
            PolltermError::InvalidUrl {
                url: "x".into(),
                message: "y".into(),
            },
        ];

        for err in non_retryable {
            assert!(!err.is_retryable(), "Expected {:?} to NOT be retryable", err);
        }
    }

    // ==================== Helper Function Tests ====================

    #[test]
    fn test_from_io_error_preserves_kind() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: PolltermError = io_err.into();
        if let PolltermError::Io(inner) = err {
            assert_eq!(inner.kind(), std::io::ErrorKind::PermissionDenied);
        } else {
            panic!("Expected Io variant");
        }
    }

    #[test]
    fn test_helpers_build_matching_variants() {
        assert!(matches!(PolltermError::connection("x"), PolltermError::Connection(_)));
        assert!(matches!(PolltermError::protocol("x"), PolltermError::Protocol(_)));
        assert!(matches!(PolltermError::config("x"), PolltermError::Config(_)));
        assert!(matches!(PolltermError::internal("x"), PolltermError::Internal(_)));
        assert!(matches!(
            PolltermError::http_status(404, "Not Found"),
            PolltermError::HttpStatus { status: 404, .. }
        ));
    }
}
