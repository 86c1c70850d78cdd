//! Header encoding and decoding utilities.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 encoded words. These
//! codecs serve header values; transport decoding of body content is out
//! of scope for this crate.

use crate::charset;
use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Maximum line length for Quoted-Printable encoding.
const MAX_LINE_LENGTH: usize = 76;

/// Encodes text using Quoted-Printable encoding (RFC 2045).
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    let mut result = String::new();
    let mut line_length = 0;

    for byte in text.as_bytes() {
        if line_length >= MAX_LINE_LENGTH - 3 {
            result.push_str("=\r\n");
            line_length = 0;
        }

        match byte {
            // Printable ASCII except '=' and space
            b'!'..=b'<' | b'>'..=b'~' => {
                result.push(*byte as char);
                line_length += 1;
            }
            b' ' => {
                // Space must not end a line
                if line_length >= MAX_LINE_LENGTH - 1 {
                    result.push_str("=20");
                    line_length += 3;
                } else {
                    result.push(' ');
                    line_length += 1;
                }
            }
            _ => {
                result.push('=');
                let _ = write!(result, "{byte:02X}");
                line_length += 3;
            }
        }
    }

    result
}

/// Decodes Quoted-Printable data (RFC 2045) into raw bytes.
///
/// # Errors
///
/// Returns an error if the input contains an incomplete or non-hex escape
/// sequence.
pub fn decode_quoted_printable(text: &str) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'=' {
            // Soft line break
            if bytes.get(i + 1) == Some(&b'\r') && bytes.get(i + 2) == Some(&b'\n') {
                i += 3;
                continue;
            }
            if bytes.get(i + 1) == Some(&b'\n') {
                i += 2;
                continue;
            }

            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .ok_or_else(|| {
                    Error::InvalidEncoding("Incomplete escape sequence".to_string())
                })?;
            let byte = u8::from_str_radix(hex, 16)
                .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    Ok(result)
}

/// Encodes a header value as an RFC 2047 encoded word if needed.
///
/// Pure printable ASCII passes through unchanged; anything else is wrapped
/// in a single `=?utf-8?B?...?=` word.
#[must_use]
pub fn encode_word(text: &str) -> String {
    if charset::is_ascii(text) && !text.contains("=?") {
        return text.to_string();
    }

    format!("=?utf-8?B?{}?=", encode_base64(text.as_bytes()))
}

/// Decodes every RFC 2047 encoded word in a header value.
///
/// Whitespace between two adjacent encoded words is dropped (RFC 2047
/// §6.2). Malformed tokens are preserved verbatim rather than reported:
/// this function never fails.
#[must_use]
pub fn decode_encoded_words(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut remaining = text;
    let mut last_was_encoded = false;

    while let Some(start) = remaining.find("=?") {
        let before = &remaining[..start];
        if !last_was_encoded || !before.trim().is_empty() {
            result.push_str(before);
        }

        let after_marker = &remaining[start + 2..];
        if let Some(word) = decode_one_word(after_marker) {
            result.push_str(&word.text);
            remaining = &after_marker[word.consumed..];
            last_was_encoded = true;
        } else {
            result.push_str("=?");
            remaining = after_marker;
            last_was_encoded = false;
        }
    }

    result.push_str(remaining);
    result
}

struct DecodedWord {
    text: String,
    /// Bytes consumed after the leading `=?`.
    consumed: usize,
}

/// Decodes one `charset?encoding?payload?=` token.
fn decode_one_word(s: &str) -> Option<DecodedWord> {
    let first = s.find('?')?;
    let charset_name = &s[..first];

    let rest = &s[first + 1..];
    let second = rest.find('?')?;
    let encoding_name = &rest[..second];

    let payload = &rest[second + 1..];
    let end = payload.find("?=")?;
    let encoded_text = &payload[..end];

    let bytes = if encoding_name.eq_ignore_ascii_case("B") {
        decode_base64(encoded_text).ok()?
    } else if encoding_name.eq_ignore_ascii_case("Q") {
        // Q encoding is Quoted-Printable with underscores for spaces
        decode_quoted_printable(&encoded_text.replace('_', " ")).ok()?
    } else {
        return None;
    };

    Some(DecodedWord {
        text: charset::decode(charset_name, &bytes),
        consumed: first + 1 + second + 1 + end + 2,
    })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_encode_decode() {
        let data = b"Hello, World!";
        let encoded = encode_base64(data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");

        let decoded = decode_base64(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_quoted_printable_encode() {
        assert_eq!(encode_quoted_printable("Hello, World!"), "Hello, World!");

        let encoded = encode_quoted_printable("H\u{e9}llo");
        assert!(encoded.contains("=C3"));
    }

    #[test]
    fn test_quoted_printable_decode() {
        assert_eq!(
            decode_quoted_printable("Hello, World!").unwrap(),
            b"Hello, World!"
        );
        assert_eq!(
            decode_quoted_printable("H=C3=A9llo").unwrap(),
            "H\u{e9}llo".as_bytes()
        );
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        assert_eq!(
            decode_quoted_printable("Hello=\r\nWorld").unwrap(),
            b"HelloWorld"
        );
    }

    #[test]
    fn test_quoted_printable_incomplete_escape() {
        assert!(decode_quoted_printable("broken=A").is_err());
    }

    #[test]
    fn test_encode_word_ascii_passthrough() {
        assert_eq!(encode_word("Hello"), "Hello");
    }

    #[test]
    fn test_encode_word_non_ascii() {
        let encoded = encode_word("H\u{e9}llo");
        assert!(encoded.starts_with("=?utf-8?B?"));
        assert!(encoded.ends_with("?="));
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let text = "Gr\u{fc}ezi z\u{e4}m\u{e4}";
        assert_eq!(decode_encoded_words(&encode_word(text)), text);
    }

    #[test]
    fn test_decode_plain_text_unchanged() {
        assert_eq!(decode_encoded_words("Hello, World!"), "Hello, World!");
    }

    #[test]
    fn test_decode_base64_word() {
        assert_eq!(decode_encoded_words("=?utf-8?B?SMOpbGxv?="), "H\u{e9}llo");
    }

    #[test]
    fn test_decode_q_word() {
        assert_eq!(
            decode_encoded_words("=?utf-8?Q?H=C3=A9llo_there?="),
            "H\u{e9}llo there"
        );
    }

    #[test]
    fn test_decode_adjacent_words_drop_whitespace() {
        assert_eq!(
            decode_encoded_words("=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?="),
            "Hola mundo"
        );
    }

    #[test]
    fn test_decode_word_in_context() {
        assert_eq!(
            decode_encoded_words("Re: =?utf-8?B?SMOpbGxv?= again"),
            "Re: H\u{e9}llo again"
        );
    }

    #[test]
    fn test_decode_malformed_word_preserved() {
        assert_eq!(decode_encoded_words("=?utf-8?X?bogus?="), "=?utf-8?X?bogus?=");
        assert_eq!(decode_encoded_words("=?dangling"), "=?dangling");
    }

    #[test]
    fn test_decode_latin1_word() {
        // "café" Q-encoded in ISO-8859-1
        assert_eq!(decode_encoded_words("=?iso-8859-1?Q?caf=E9?="), "caf\u{e9}");
    }
}
