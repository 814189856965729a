//! Host reply classification
//!
//! The host answers every poll with a small XML document. Only the root
//! element matters: `<pre>` carries a fresh screen, anything else (the host
//! sends `<idem/>`) means the screen has not changed since the last reply.

use crate::error::ProtocolError;
use crate::escape::unescape_screen;

/// Root tag of a reply carrying screen content
pub const CONTENT_TAG: &str = "pre";

/// What a reply asks the client to do with its display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenUpdate {
    /// Replace the display with this decoded markup
    Content(String),
    /// Keep the current display
    Unchanged,
}

impl ScreenUpdate {
    pub fn has_content(&self) -> bool {
        matches!(self, ScreenUpdate::Content(_))
    }
}

/// Classify a reply body by its root element
pub fn classify(body: &str) -> Result<ScreenUpdate, ProtocolError> {
    if root_tag(body)? == CONTENT_TAG {
        Ok(ScreenUpdate::Content(unescape_screen(body)))
    } else {
        Ok(ScreenUpdate::Unchanged)
    }
}

/// Name of the root element, skipping the prolog
///
/// This is a prolog-aware scan, not a validating parser: it finds the first
/// start tag after any XML declaration, processing instructions, comments
/// and doctype.
pub fn root_tag(document: &str) -> Result<&str, ProtocolError> {
    let mut rest = document.trim_start_matches('\u{feff}');
    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix("<?") {
            rest = skip_past(after, "?>")?;
        } else if let Some(after) = rest.strip_prefix("<!--") {
            rest = skip_past(after, "-->")?;
        } else if let Some(after) = rest.strip_prefix("<!") {
            rest = skip_past(after, ">")?;
        } else {
            break;
        }
    }

    let after = rest
        .strip_prefix('<')
        .ok_or_else(|| malformed("document has no root element"))?;
    let end = after
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .ok_or_else(|| malformed("unterminated root element"))?;
    let name = &after[..end];

    let starts_like_a_name = name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == ':');
    if !starts_like_a_name {
        return Err(malformed("invalid root element name"));
    }
    if !after[end..].contains('>') {
        return Err(malformed("unterminated root element"));
    }
    Ok(name)
}

fn skip_past<'a>(text: &'a str, terminator: &str) -> Result<&'a str, ProtocolError> {
    text.find(terminator)
        .map(|pos| &text[pos + terminator.len()..])
        .ok_or_else(|| malformed("unterminated markup declaration"))
}

fn malformed(reason: &str) -> ProtocolError {
    ProtocolError::MalformedResponse(reason.to_string())
}
