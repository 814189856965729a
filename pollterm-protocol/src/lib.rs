//! pollterm-protocol: Wire format shared by the pollterm client
//!
//! This crate defines how keyboard input becomes a terminal key stream and
//! how that stream travels to a remote terminal host over plain HTTP
//! request/response cycles:
//! - [`SessionToken`]: client-chosen identifier correlating all requests
//! - [`KeyEncoder`]: raw key events to terminal bytes (control codes, CSI sequences)
//! - [`escape`]: transport escaping of the key stream
//! - [`PollRequest`]: the `s`/`w`/`h`/`c`/`k` request fields, as GET or POST
//! - [`ScreenUpdate`]: classification of the host's reply

pub mod error;
pub mod escape;
pub mod keys;
pub mod request;
pub mod response;
pub mod session;

// Re-export main types at crate root
pub use error::ProtocolError;
pub use escape::{decode_payload, escape_text, unescape_screen};
pub use keys::{KeyEncoder, KeyEvent, KeyPhase, Modifiers};
pub use request::{Method, PollRequest, ENDPOINT_PATH};
pub use response::{classify, ScreenUpdate};
pub use session::{SessionToken, DEFAULT_TOKEN_LENGTH};
