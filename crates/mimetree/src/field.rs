//! Header fields: raw name/value pairs with typed views.
//!
//! A [`Field`] always stores the raw header body exactly as received.
//! Typed accessors decode on demand; a value that fails to decode reports
//! as absent rather than failing the whole tree.

use crate::content_type::{ContentType, TransferEncoding};
use crate::encoding;
use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// A single header field: name plus unparsed value.
///
/// The name's case is preserved on storage and ignored on comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    raw_value: String,
}

/// Counter component of generated message identifiers.
static MESSAGE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

impl Field {
    /// The `Subject` field name.
    pub const SUBJECT: &'static str = "Subject";
    /// The `Date` field name.
    pub const DATE: &'static str = "Date";
    /// The `Message-ID` field name.
    pub const MESSAGE_ID: &'static str = "Message-ID";
    /// The `Content-Type` field name.
    pub const CONTENT_TYPE: &'static str = "Content-Type";
    /// The `Content-Transfer-Encoding` field name.
    pub const CONTENT_TRANSFER_ENCODING: &'static str = "Content-Transfer-Encoding";

    /// Creates a field from a name and a raw value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFieldName`] if the name is empty or contains
    /// anything other than printable ASCII without colons.
    pub fn new(name: impl Into<String>, raw_value: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || !name.bytes().all(|b| (33..=126).contains(&b) && b != b':') {
            return Err(Error::InvalidFieldName(name));
        }
        Ok(Self {
            name,
            raw_value: raw_value.into(),
        })
    }

    /// Builds a field without name validation. For factory constructors
    /// whose names are known-good constants.
    fn preset(name: &str, raw_value: String) -> Self {
        Self {
            name: name.to_string(),
            raw_value,
        }
    }

    /// Creates a `Subject` field, encoding non-ASCII text automatically.
    #[must_use]
    pub fn subject(text: &str) -> Self {
        Self::preset(Self::SUBJECT, encoding::encode_word(text))
    }

    /// Creates a date-valued field, formatted per RFC 2822 in the
    /// datetime's own offset.
    #[must_use]
    pub fn date(name: &str, date: &DateTime<FixedOffset>) -> Self {
        Self::preset(name, date.to_rfc2822())
    }

    /// Creates a `Message-ID` field with a freshly synthesized identifier.
    ///
    /// The identifier combines the current epoch time, the process id and a
    /// process-wide counter, plus the given host name (`localhost` when
    /// absent). No uniqueness check against other messages is performed.
    #[must_use]
    pub fn message_id(hostname: Option<&str>) -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let counter = MESSAGE_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let host = hostname.unwrap_or("localhost");
        Self::preset(
            Self::MESSAGE_ID,
            format!("<{millis}.{}.{counter}@{host}>", std::process::id()),
        )
    }

    /// The field name, with its original case.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The unparsed field body.
    #[must_use]
    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    /// Checks the field name, ignoring case.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// The unstructured text value, with encoded words decoded.
    ///
    /// Never fails: malformed encoded words pass through verbatim.
    #[must_use]
    pub fn text(&self) -> String {
        encoding::decode_encoded_words(self.raw_value.trim())
    }

    /// The value parsed as an RFC 2822 date, or `None` if it does not
    /// parse. The failure is logged and absorbed here.
    #[must_use]
    pub fn date_time(&self) -> Option<DateTime<FixedOffset>> {
        match DateTime::parse_from_rfc2822(self.raw_value.trim()) {
            Ok(date) => Some(date),
            Err(e) => {
                warn!(field = %self.name, error = %e, "unparsable date field");
                None
            }
        }
    }

    /// The value parsed as a content type, or `None` if it does not parse.
    #[must_use]
    pub fn content_type(&self) -> Option<ContentType> {
        ContentType::parse(&self.raw_value).ok()
    }

    /// The value parsed as a transfer encoding; unknown tokens read as
    /// 7bit.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        TransferEncoding::parse(&self.raw_value)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.raw_value)
    }
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
    use chrono::TimeZone;

    #[test]
    fn test_new_preserves_case() {
        let field = Field::new("X-Custom-Header", "value").unwrap();
        assert_eq!(field.name(), "X-Custom-Header");
        assert!(field.is_named("x-custom-header"));
    }

    #[test]
    fn test_new_rejects_bad_names() {
        assert!(Field::new("", "value").is_err());
        assert!(Field::new("Bad:Name", "value").is_err());
        assert!(Field::new("Bad Name", "value").is_err());
    }

    #[test]
    fn test_subject_plain() {
        let field = Field::subject("Hello");
        assert_eq!(field.raw_value(), "Hello");
        assert_eq!(field.text(), "Hello");
    }

    #[test]
    fn test_subject_encodes_non_ascii() {
        let field = Field::subject("Gr\u{fc}ezi");
        assert!(field.raw_value().starts_with("=?utf-8?B?"));
        assert_eq!(field.text(), "Gr\u{fc}ezi");
    }

    #[test]
    fn test_date_round_trip() {
        let date = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 7, 1, 10, 52, 37)
            .unwrap();
        let field = Field::date(Field::DATE, &date);
        assert_eq!(field.date_time(), Some(date));
    }

    #[test]
    fn test_date_time_unparsable() {
        let field = Field::new(Field::DATE, "not a date").unwrap();
        assert_eq!(field.date_time(), None);
    }

    #[test]
    fn test_message_id_format() {
        let field = Field::message_id(Some("example.com"));
        let value = field.raw_value();
        assert!(value.starts_with('<'));
        assert!(value.ends_with("@example.com>"));
    }

    #[test]
    fn test_message_id_default_host() {
        let field = Field::message_id(None);
        assert!(field.raw_value().ends_with("@localhost>"));
    }

    #[test]
    fn test_message_id_distinct() {
        assert_ne!(
            Field::message_id(None).raw_value(),
            Field::message_id(None).raw_value()
        );
    }

    #[test]
    fn test_content_type_view() {
        let field = Field::new(Field::CONTENT_TYPE, "multipart/mixed; boundary=B").unwrap();
        let ct = field.content_type().unwrap();
        assert_eq!(ct.boundary(), Some("B"));

        let bad = Field::new(Field::CONTENT_TYPE, "gibberish").unwrap();
        assert_eq!(bad.content_type(), None);
    }

    #[test]
    fn test_display() {
        let field = Field::new("Subject", "Hi").unwrap();
        assert_eq!(field.to_string(), "Subject: Hi");
    }
}
