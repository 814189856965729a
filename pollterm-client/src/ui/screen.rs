//! Host screen markup to plain text
//!
//! The host renders its terminal as a `<pre>` element whose rows are
//! separated by newlines, with `<span>` elements for attributes. Attributes
//! are dropped here; only the characters and their layout survive.

/// Text lines of a host screen
pub fn markup_to_lines(markup: &str) -> Vec<String> {
    let text = strip_tags(pre_body(markup));
    let decoded = decode_entities(&text);
    let decoded = decoded.strip_suffix('\n').unwrap_or(&decoded);
    decoded
        .split('\n')
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}

/// Contents of the root `<pre>` element, or the whole text without one
fn pre_body(markup: &str) -> &str {
    let Some(open) = markup.find("<pre") else {
        return markup;
    };
    let Some(start) = markup[open..].find('>').map(|i| open + i + 1) else {
        return markup;
    };
    let end = markup.rfind("</pre>").filter(|&end| end >= start).unwrap_or(markup.len());
    &markup[start..end]
}

/// Remove element tags, keeping a literal `<` that does not open one
fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let opens_tag = tail[1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!' || c == '?');
        match tail.find('>') {
            Some(close) if opens_tag => rest = &tail[close + 1..],
            _ => {
                out.push('<');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let decoded = tail
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| entity(&tail[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
