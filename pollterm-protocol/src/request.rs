//! Poll request composition
//!
//! Every request carries the same logical fields, in this order:
//!
//! | field | meaning |
//! |-------|---------|
//! | `s` | session token |
//! | `w` | screen width in columns |
//! | `h` | screen height in rows |
//! | `c` | `1` when colour is enabled, absent otherwise |
//! | `k` | escaped key payload, possibly empty |
//!
//! GET puts them in the query string of the `u` endpoint; POST sends the
//! same string as a form body.

use serde::{Deserialize, Serialize};

use crate::session::SessionToken;

/// Path of the key delivery + screen retrieval endpoint
pub const ENDPOINT_PATH: &str = "u";

/// Content type of POST bodies
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Headers that defeat intermediary caches on GET requests
pub const CACHE_BUST_HEADERS: &[(&str, &str)] = &[
    ("If-Modified-Since", "Sat, 1 Jan 2000 00:00:00 GMT"),
    ("Cache-Control", "no-cache"),
];

/// HTTP method used for poll requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    #[default]
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// One poll request, ready to put on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRequest {
    pub method: Method,
    pub session: SessionToken,
    pub width: u16,
    pub height: u16,
    pub color: bool,
    /// Attach [`CACHE_BUST_HEADERS`] to GET requests
    pub cache_bust: bool,
    /// Already-escaped key payload
    pub keys: String,
}

impl PollRequest {
    /// Field string shared by both encodings
    pub fn query(&self) -> String {
        let mut query = format!("s={}&w={}&h={}", self.session, self.width, self.height);
        if self.color {
            query.push_str("&c=1");
        }
        query.push_str("&k=");
        query.push_str(&self.keys);
        query
    }

    /// Request target relative to the host base URL
    pub fn target(&self) -> String {
        match self.method {
            Method::Get => format!("{}?{}", ENDPOINT_PATH, self.query()),
            Method::Post => ENDPOINT_PATH.to_string(),
        }
    }

    /// Form body; only POST has one
    pub fn body(&self) -> Option<String> {
        match self.method {
            Method::Get => None,
            Method::Post => Some(self.query()),
        }
    }

    /// Extra headers for this request
    pub fn cache_headers(&self) -> &'static [(&'static str, &'static str)] {
        if self.method == Method::Get && self.cache_bust {
            CACHE_BUST_HEADERS
        } else {
            &[]
        }
    }
}
