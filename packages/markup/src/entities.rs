//! Character reference decoding and escaping

use std::borrow::Cow;

/// Decode the character references this crate understands.
///
/// Unknown or malformed references are kept verbatim.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        output.push_str(&rest[..amp]);
        let candidate = &rest[amp..];

        match candidate.find(';').filter(|end| *end <= 12) {
            Some(end) => {
                let name = &candidate[1..end];
                match decode_reference(name) {
                    Some(ch) => {
                        output.push(ch);
                        rest = &candidate[end + 1..];
                    }
                    None => {
                        output.push('&');
                        rest = &candidate[1..];
                    }
                }
            }
            None => {
                output.push('&');
                rest = &candidate[1..];
            }
        }
    }

    output.push_str(rest);
    Cow::Owned(output)
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(numeric) = name.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }

    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "ndash" => Some('\u{2013}'),
        "mdash" => Some('\u{2014}'),
        "hellip" => Some('\u{2026}'),
        "laquo" => Some('\u{ab}'),
        "raquo" => Some('\u{bb}'),
        "copy" => Some('\u{a9}'),
        _ => None,
    }
}

/// Escape text content
pub fn escape_text(input: &str) -> Cow<'_, str> {
    if !input.contains(['&', '<', '>']) {
        return Cow::Borrowed(input);
    }

    let mut output = String::with_capacity(input.len() + 8);
    for ch in input.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(ch),
        }
    }
    Cow::Owned(output)
}

/// Escape a double-quoted attribute value
pub fn escape_attr(input: &str) -> Cow<'_, str> {
    if !input.contains(['&', '"', '<']) {
        return Cow::Borrowed(input);
    }

    let mut output = String::with_capacity(input.len() + 8);
    for ch in input.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            '<' => output.push_str("&lt;"),
            _ => output.push(ch),
        }
    }
    Cow::Owned(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_named_and_numeric() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(decode_entities("&#65;&#x42;"), "AB");
        assert_eq!(decode_entities("x&nbsp;y"), "x\u{a0}y");
    }

    #[test]
    fn test_unknown_reference_is_kept() {
        assert_eq!(decode_entities("AT&T and &bogus; &"), "AT&T and &bogus; &");
    }

    #[test]
    fn test_escape_roundtrip() {
        let raw = r#"5 < 6 & "quoted" > 4"#;
        assert_eq!(decode_entities(&escape_text(raw)), raw);
        assert_eq!(decode_entities(&escape_attr(raw)), raw);
    }
}
