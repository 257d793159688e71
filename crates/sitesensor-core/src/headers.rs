//! Request header storage encoding
//!
//! Headers are edited one per line but stored as a single string: `|` and `%`
//! are escaped as `%` plus hex, then line breaks become `|`.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static SEPARATOR_OR_ESCAPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[|%]").unwrap());

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(\r\n|\r|\n)").unwrap());

static ESCAPED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"%([0-9A-Fa-f]{2})").unwrap());

/// Encode newline-separated header text for storage
pub fn encode_headers(text: &str) -> String {
    let trimmed = text.trim_end();
    let escaped = SEPARATOR_OR_ESCAPE.replace_all(trimmed, |caps: &Captures| {
        format!("%{:x}", u32::from(caps[0].as_bytes()[0]))
    });
    LINE_BREAK.replace_all(&escaped, "|").into_owned()
}

/// Decode a stored header string back to one header per line
pub fn decode_headers(stored: &str) -> String {
    let lines = stored.replace('|', "\n");
    ESCAPED
        .replace_all(&lines, |caps: &Captures| {
            u8::from_str_radix(&caps[1], 16)
                .ok()
                .map(char::from)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_joins_lines() {
        assert_eq!(
            encode_headers("Accept: application/json\nX-Key: abc\n"),
            "Accept: application/json|X-Key: abc"
        );
    }

    #[test]
    fn test_encode_escapes_separator_and_percent() {
        assert_eq!(encode_headers("X-A: a|b\nX-B: 50%"), "X-A: a%7cb|X-B: 50%25");
    }

    #[test]
    fn test_encode_absorbs_whitespace_before_break() {
        assert_eq!(encode_headers("A: 1  \r\n\r\nB: 2"), "A: 1|B: 2");
    }

    #[test]
    fn test_decode_reverses_encode() {
        let text = "X-A: a|b\nX-B: 50%\nX-C: plain";
        assert_eq!(decode_headers(&encode_headers(text)), text);
    }

    #[test]
    fn test_decode_leaves_bad_escape() {
        assert_eq!(decode_headers("A: 5%zz"), "A: 5%zz");
    }
}
