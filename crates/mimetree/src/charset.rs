//! Charset classification and lookup.
//!
//! Resolution goes through the [`encoding_rs`] label registry so that the
//! same charset object is returned for every alias of an encoding.

use encoding_rs::Encoding;
use tracing::warn;

/// Checks whether every character of `text` is 7-bit ASCII.
///
/// Strict code-point test: true iff every code point is below 128. Holds
/// for the empty string.
#[must_use]
pub fn is_ascii(text: &str) -> bool {
    text.bytes().all(|b| b < 0x80)
}

/// Aliases the label registry does not know but mail in the wild uses.
const ALIASES: &[(&str, &str)] = &[
    ("ascii", "us-ascii"),
    ("us", "us-ascii"),
    ("646", "us-ascii"),
    ("latin1", "iso-8859-1"),
];

/// Resolves a charset name to an encoding.
///
/// The name is trimmed, common aliases are normalized (a bare `ascii`
/// resolves to the same encoding as `us-ascii`), and the result is looked
/// up in the label registry. Returns `None` for the empty string and for
/// any name the registry cannot resolve; lookup failure is a normal
/// outcome, never a panic or an error.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static Encoding> {
    let name = name.trim().trim_matches('"');
    if name.is_empty() {
        return None;
    }

    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
        .map_or(name, |(_, canonical)| *canonical);

    Encoding::for_label(canonical.as_bytes())
}

/// Decodes raw bytes using the named charset, best effort.
///
/// Unresolvable charsets fall back to lossy UTF-8 so that header decoding
/// always produces some text.
#[must_use]
pub fn decode(name: &str, bytes: &[u8]) -> String {
    lookup(name).map_or_else(
        || {
            warn!(charset = name, "unknown charset, falling back to UTF-8");
            String::from_utf8_lossy(bytes).into_owned()
        },
        |encoding| {
            let (decoded, _, _) = encoding.decode(bytes);
            decoded.into_owned()
        },
    )
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
    use proptest::prelude::*;

    #[test]
    fn test_all_ascii() {
        assert!(is_ascii("Like hello and stuff"));
        assert!(is_ascii(""));
    }

    #[test]
    fn test_non_ascii() {
        assert!(!is_ascii("Gr\u{fc}ezi_z\u{e4}m\u{e4}"));
        assert!(!is_ascii("\u{412}\u{441}\u{435}\u{43c}_\u{43f}\u{440}\u{438}\u{432}\u{435}\u{442}"));
    }

    #[test]
    fn test_ascii_boundary() {
        assert!(is_ascii("\u{7f}"));
        assert!(!is_ascii("\u{80}"));
    }

    #[test]
    fn test_lookup_alias() {
        let c1 = lookup("us-ascii").unwrap();
        let c2 = lookup("ascii").unwrap();
        assert_eq!(c1, c2);
    }

    #[test]
    fn test_lookup_utf8() {
        assert_eq!(lookup("utf-8"), Some(encoding_rs::UTF_8));
        assert_eq!(lookup("UTF-8"), Some(encoding_rs::UTF_8));
    }

    #[test]
    fn test_lookup_empty_input() {
        assert_eq!(lookup(""), None);
        assert_eq!(lookup("   "), None);
    }

    #[test]
    fn test_lookup_failure() {
        assert_eq!(lookup("whatever"), None);
    }

    #[test]
    fn test_decode_known_charset() {
        // "café" in ISO-8859-1
        assert_eq!(decode("iso-8859-1", b"caf\xe9"), "caf\u{e9}");
    }

    #[test]
    fn test_decode_unknown_charset_falls_back() {
        assert_eq!(decode("whatever", b"plain"), "plain");
    }

    proptest! {
        #[test]
        fn prop_is_ascii_matches_code_points(s in ".*") {
            prop_assert_eq!(is_ascii(&s), s.chars().all(|c| (c as u32) < 128));
        }
    }
}
