//! The top-level message: an entity with typed metadata accessors.

use crate::entity::Entity;
use crate::error::Result;
use crate::field::Field;
use std::ops::{Deref, DerefMut};

use chrono::{DateTime, FixedOffset, Offset, Utc};

/// A MIME message.
///
/// A message is an [`Entity`] (it derefs to one) and is itself usable as a
/// body, which is how message/rfc822 nesting is represented.
///
/// The metadata accessors follow a strict asymmetry: readers never
/// allocate a header, writers create one on first use. Writers passed
/// `None` remove the field instead of storing an empty value.
#[derive(Debug, Default)]
pub struct Message {
    entity: Entity,
}

impl Message {
    /// Creates a new empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing entity as a message.
    #[must_use]
    pub const fn from_entity(entity: Entity) -> Self {
        Self { entity }
    }

    /// Unwraps the message into its entity.
    #[must_use]
    pub fn into_entity(self) -> Entity {
        self.entity
    }

    /// The raw value of the first `Message-ID` field, or `None` if not
    /// present.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        Some(self.header()?.get(Field::MESSAGE_ID)?.raw_value())
    }

    /// Creates and sets a fresh `Message-ID` field, replacing any
    /// existing one. A header is created if the message has none.
    ///
    /// The identifier incorporates the given host name when supplied; see
    /// [`Field::message_id`]. Uniqueness against other messages is the
    /// caller's responsibility.
    pub fn create_message_id(&mut self, hostname: Option<&str>) {
        self.ensure_header().set(Field::message_id(hostname));
    }

    /// The decoded `Subject`, or `None` if not present.
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        Some(self.header()?.get(Field::SUBJECT)?.text())
    }

    /// Sets or removes the `Subject`. A header is created if the message
    /// has none.
    ///
    /// Non-ASCII text is encoded automatically; `None` removes every
    /// `Subject` field.
    pub fn set_subject(&mut self, subject: Option<&str>) {
        let header = self.ensure_header();
        match subject {
            Some(text) => header.set(Field::subject(text)),
            None => {
                header.remove(Field::SUBJECT);
            }
        }
    }

    /// The `Date` field parsed to a date value, or `None` when the field
    /// is absent or unparsable.
    #[must_use]
    pub fn date(&self) -> Option<DateTime<FixedOffset>> {
        self.header()?.get(Field::DATE)?.date_time()
    }

    /// Sets or removes the `Date`, formatting in UTC. A header is created
    /// if the message has none; `None` removes the field.
    pub fn set_date(&mut self, date: Option<DateTime<Utc>>) {
        match date {
            Some(date) => self.set_date_with_zone(date, Utc.fix()),
            None => {
                self.ensure_header().remove(Field::DATE);
            }
        }
    }

    /// Sets the `Date`, formatting in the given fixed offset.
    ///
    /// The formatted raw value depends on the offset, but the instant it
    /// denotes does not.
    pub fn set_date_with_zone(&mut self, date: DateTime<Utc>, zone: FixedOffset) {
        self.ensure_header()
            .set(Field::date(Field::DATE, &date.with_timezone(&zone)));
    }

    /// Deep-copies the message; see [`Entity::try_clone`] for the error
    /// surface. The copy is detached from any enclosing tree.
    ///
    /// # Errors
    ///
    /// Propagates copy failures from the entity tree.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            entity: self.entity.try_clone()?,
        })
    }
}

impl Deref for Message {
    type Target = Entity;

    fn deref(&self) -> &Entity {
        &self.entity
    }
}

impl DerefMut for Message {
    fn deref_mut(&mut self) -> &mut Entity {
        &mut self.entity
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
    fn test_read_does_not_allocate_header() {
        let message = Message::new();
        assert_eq!(message.subject(), None);
        assert_eq!(message.date(), None);
        assert_eq!(message.message_id(), None);
        assert!(message.header().is_none());
    }

    #[test]
    fn test_set_subject_creates_header() {
        let mut message = Message::new();
        message.set_subject(Some("hello"));

        assert!(message.header().is_some());
        assert_eq!(message.subject().as_deref(), Some("hello"));
    }

    #[test]
    fn test_set_subject_none_removes_field() {
        let mut message = Message::new();
        message.set_subject(Some("x"));
        message.set_subject(None);

        assert_eq!(message.subject(), None);
        assert!(message.header().unwrap().get(Field::SUBJECT).is_none());
        assert_eq!(message.header().unwrap().len(), 0);
    }

    #[test]
    fn test_subject_decodes_encoded_words() {
        let mut message = Message::new();
        message.set_subject(Some("Gr\u{fc}ezi z\u{e4}m\u{e4}"));

        let raw = message
            .header()
            .unwrap()
            .get(Field::SUBJECT)
            .unwrap()
            .raw_value()
            .to_string();
        assert!(raw.starts_with("=?utf-8?B?"));
        assert_eq!(message.subject().as_deref(), Some("Gr\u{fc}ezi z\u{e4}m\u{e4}"));
    }

    #[test]
    fn test_date_round_trip_default_zone() {
        let mut message = Message::new();
        let date = Utc.with_ymd_and_hms(2024, 7, 1, 10, 52, 37).unwrap();
        message.set_date(Some(date));

        assert_eq!(message.date().unwrap(), date);
    }

    #[test]
    fn test_date_zone_changes_raw_value_not_instant() {
        let date = Utc.with_ymd_and_hms(2024, 7, 1, 10, 52, 37).unwrap();

        let mut in_utc = Message::new();
        in_utc.set_date(Some(date));
        let raw_utc = in_utc
            .header()
            .unwrap()
            .get(Field::DATE)
            .unwrap()
            .raw_value()
            .to_string();

        let mut offset = Message::new();
        offset.set_date_with_zone(date, FixedOffset::east_opt(2 * 3600).unwrap());
        let raw_offset = offset
            .header()
            .unwrap()
            .get(Field::DATE)
            .unwrap()
            .raw_value()
            .to_string();

        assert_ne!(raw_utc, raw_offset);
        assert_eq!(offset.date().unwrap(), date);
    }

    #[test]
    fn test_set_date_none_removes_field() {
        let mut message = Message::new();
        message.set_date(Some(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()));
        message.set_date(None);
        assert_eq!(message.date(), None);
    }

    #[test]
    fn test_entity_round_trip() {
        let mut message = Message::new();
        message.set_subject(Some("kept"));

        let entity = message.into_entity();
        let message = Message::from_entity(entity);
        assert_eq!(message.subject().as_deref(), Some("kept"));
    }

    #[test]
    fn test_create_message_id() {
        let mut message = Message::new();
        assert_eq!(message.message_id(), None);

        message.create_message_id(Some("mail.example.com"));
        let id = message.message_id().unwrap();
        assert!(id.starts_with('<'));
        assert!(id.ends_with("@mail.example.com>"));
    }
}
