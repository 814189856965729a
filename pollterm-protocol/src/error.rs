//! Protocol error type

/// Errors raised while interpreting protocol data
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid session token '{token}': {reason}")]
    InvalidToken { token: String, reason: &'static str },
}
