//! Transport escaping
//!
//! Key payloads travel form-urlencoded: alphanumerics and `-_.!~*'()` pass
//! through, space becomes `+`, every other byte of the UTF-8 encoding becomes
//! `%XX`. A literal `+` is therefore always sent as `%2B` and can never be
//! read back as a space.
//!
//! Screen content comes back escaped the other way: `%XX` carries a single
//! Latin-1 code unit and `%uXXXX` a UTF-16 code unit.

use std::borrow::Cow;
use std::str::Utf8Error;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Bytes that must be percent-encoded in the `k` field
const KEY_STREAM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Escape terminal text for the key payload
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() * 3);
    for (i, part) in text.split(' ').enumerate() {
        if i > 0 {
            escaped.push('+');
        }
        escaped.extend(utf8_percent_encode(part, KEY_STREAM));
    }
    escaped
}

/// Reverse [`escape_text`]
pub fn decode_payload(payload: &str) -> Result<String, Utf8Error> {
    let spaced: Cow<'_, str> = if payload.contains('+') {
        Cow::Owned(payload.replace('+', " "))
    } else {
        Cow::Borrowed(payload)
    };
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(Cow::into_owned)
}

/// Decode screen content escaped with `%XX` / `%uXXXX`
///
/// Malformed escapes are kept literally.
pub fn unescape_screen(text: &str) -> String {
    let mut units: Vec<u16> = Vec::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('%') {
        units.extend(rest[..pos].encode_utf16());
        let tail = &rest[pos + 1..];

        if let Some(unit) = tail.strip_prefix('u').and_then(|hex| hex_unit(hex, 4)) {
            units.push(unit);
            rest = &tail[5..];
        } else if let Some(unit) = hex_unit(tail, 2) {
            units.push(unit);
            rest = &tail[2..];
        } else {
            units.push(u16::from(b'%'));
            rest = tail;
        }
    }
    units.extend(rest.encode_utf16());

    String::from_utf16_lossy(&units)
}

fn hex_unit(s: &str, digits: usize) -> Option<u16> {
    let hex = s.get(..digits)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(hex, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreserved_pass_through() {
        let text = "azAZ09-_.!~*'()";
        assert_eq!(escape_text(text), text);
    }

    #[test]
    fn test_space_becomes_plus() {
        assert_eq!(escape_text("ls -la"), "ls+-la");
        assert_eq!(escape_text("  "), "++");
    }

    #[test]
    fn test_plus_is_always_escaped() {
        assert_eq!(escape_text("+"), "%2B");
        assert_eq!(escape_text("1+1 2"), "1%2B1+2");
    }

    #[test]
    fn test_control_bytes_are_uppercase_hex() {
        assert_eq!(escape_text("\x01"), "%01");
        assert_eq!(escape_text("\x1b[A"), "%1B%5BA");
        assert_eq!(escape_text("\x7f"), "%7F");
        assert_eq!(escape_text("\x00"), "%00");
    }

    #[test]
    fn test_reserved_ascii_is_escaped() {
        assert_eq!(escape_text("&=%#/?"), "%26%3D%25%23%2F%3F");
    }

    #[test]
    fn test_two_and_three_byte_utf8() {
        assert_eq!(escape_text("é"), "%C3%A9");
        assert_eq!(escape_text("€"), "%E2%82%AC");
    }

    #[test]
    fn test_decode_reverses_escape() {
        for text in ["", "hello world", "+", "a+b c", "\x1b[[A", "%41", "ünïcødé €", "\r\n\t"] {
            assert_eq!(decode_payload(&escape_text(text)).unwrap(), text);
        }
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        assert!(decode_payload("%FF%FE").is_err());
    }

    #[test]
    fn test_unescape_plain_text_unchanged() {
        assert_eq!(unescape_screen("<pre>hello</pre>"), "<pre>hello</pre>");
    }

    #[test]
    fn test_unescape_byte_escapes_as_latin1() {
        assert_eq!(unescape_screen("a%20b"), "a b");
        assert_eq!(unescape_screen("%3Cpre%3E"), "<pre>");
        assert_eq!(unescape_screen("caf%E9"), "café");
    }

    #[test]
    fn test_unescape_unicode_escapes() {
        assert_eq!(unescape_screen("%u20AC"), "€");
        assert_eq!(unescape_screen("%u2500%u2502"), "─│");
    }

    #[test]
    fn test_unescape_surrogate_pair() {
        assert_eq!(unescape_screen("%uD83D%uDE00"), "😀");
    }

    #[test]
    fn test_unescape_keeps_malformed_escapes() {
        assert_eq!(unescape_screen("100%"), "100%");
        assert_eq!(unescape_screen("%zz"), "%zz");
        assert_eq!(unescape_screen("%u12"), "%u12");
        assert_eq!(unescape_screen("%%41"), "%A");
    }
}
