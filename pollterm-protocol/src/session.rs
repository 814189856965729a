//! Client-chosen session tokens
//!
//! The host keys its terminal sessions on whatever token the client sends in
//! the `s` field, so the client picks one at startup and reuses it for every
//! request of that session.

use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// Token length used when none is configured
pub const DEFAULT_TOKEN_LENGTH: usize = 16;

/// Opaque session identifier drawn from `a-z`
///
/// Immutable once created; a new token means a new remote session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generate a fresh token of `length` lowercase letters
    ///
    /// Uses a non-cryptographic RNG. Collisions are bounded only by the
    /// birthday bound of 26^length.
    pub fn generate(length: usize) -> Self {
        Self::generate_with(&mut fastrand::Rng::new(), length)
    }

    /// Generate a token from a caller-supplied RNG (seeded in tests)
    pub fn generate_with(rng: &mut fastrand::Rng, length: usize) -> Self {
        Self((0..length).map(|_| rng.lowercase()).collect())
    }

    /// Accept an externally chosen token, e.g. to reattach to a host session
    pub fn parse(token: &str) -> Result<Self, ProtocolError> {
        if token.is_empty() {
            return Err(ProtocolError::InvalidToken {
                token: token.to_string(),
                reason: "token is empty",
            });
        }
        if !token.bytes().all(|b| b.is_ascii_lowercase()) {
            return Err(ProtocolError::InvalidToken {
                token: token.to_string(),
                reason: "token must contain only the letters a-z",
            });
        }
        Ok(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for SessionToken {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
