//! The structural node of the tree: an optional header plus an owned body.

use crate::body::Body;
use crate::content_type::{ContentType, TransferEncoding};
use crate::error::Result;
use crate::field::Field;
use crate::header::Header;

/// A structural node pairing an optional [`Header`] with an owned
/// [`Body`].
///
/// Both are absent on a freshly created entity. A body is exclusively
/// owned by its entity: attaching a body moves it in, and the displaced
/// body (if any) is handed back to the caller, so two entities can never
/// share one.
///
/// Reading and writing header metadata are deliberately asymmetric:
/// read accessors never allocate a header, while
/// [`ensure_header`](Entity::ensure_header) creates one on first use.
/// Mutating convenience accessors (on [`Message`](crate::Message)) go
/// through `ensure_header` only.
#[derive(Debug, Default)]
pub struct Entity {
    header: Option<Header>,
    body: Option<Body>,
}

impl Entity {
    /// Creates an entity with no header and no body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The header, if one has been set. Never allocates.
    #[must_use]
    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    /// Mutable access to the header, if one has been set. Never
    /// allocates.
    pub fn header_mut(&mut self) -> Option<&mut Header> {
        self.header.as_mut()
    }

    /// The header, created and attached first if absent.
    ///
    /// This is the only path that allocates header storage; read
    /// accessors report absence instead.
    pub fn ensure_header(&mut self) -> &mut Header {
        self.header.get_or_insert_with(Header::new)
    }

    /// Replaces the header, returning the previous one.
    pub fn set_header(&mut self, header: Header) -> Option<Header> {
        self.header.replace(header)
    }

    /// The body, if one has been set.
    #[must_use]
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Mutable access to the body, if one has been set.
    pub fn body_mut(&mut self) -> Option<&mut Body> {
        self.body.as_mut()
    }

    /// Attaches a body, returning the displaced one if any.
    ///
    /// The body is moved in; the previous owner (if the body came out of
    /// another entity) has necessarily given it up already.
    pub fn set_body(&mut self, body: impl Into<Body>) -> Option<Body> {
        self.body.replace(body.into())
    }

    /// Detaches and returns the body.
    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// The parsed `Content-Type`, if present and parsable.
    #[must_use]
    pub fn content_type(&self) -> Option<ContentType> {
        self.header()?.get(Field::CONTENT_TYPE)?.content_type()
    }

    /// The `Content-Transfer-Encoding`, defaulting to 7bit when absent.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.header()
            .and_then(|h| h.get(Field::CONTENT_TRANSFER_ENCODING))
            .map(Field::transfer_encoding)
            .unwrap_or_default()
    }

    /// Whether the entity currently holds a multipart body.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        matches!(self.body, Some(Body::Multipart(_)))
    }

    /// Deep-copies the entity.
    ///
    /// The header is cloned field by field; the body is copied per
    /// variant, recursing through nested messages and multiparts. The
    /// copy is fully detached from the source's tree position and the
    /// source is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedCopy`](crate::Error::UnsupportedCopy)
    /// if the tree contains a single body without duplication support,
    /// and [`Error::UnrecognizedBody`](crate::Error::UnrecognizedBody)
    /// if it contains a custom body variant.
    pub fn try_clone(&self) -> Result<Self> {
        let body = match &self.body {
            Some(body) => Some(body.try_clone()?),
            None => None,
        };
        Ok(Self {
            header: self.header.clone(),
            body,
        })
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
    use crate::body::Multipart;
    use crate::storage::MemoryBody;
    use std::io::Read;

    #[test]
    fn test_new_entity_is_bare() {
        let entity = Entity::new();
        assert!(entity.header().is_none());
        assert!(entity.body().is_none());
    }

    #[test]
    fn test_read_accessors_never_allocate() {
        let entity = Entity::new();
        assert!(entity.content_type().is_none());
        assert_eq!(entity.transfer_encoding(), TransferEncoding::SevenBit);
        assert!(entity.header().is_none());
    }

    #[test]
    fn test_ensure_header_allocates_once() {
        let mut entity = Entity::new();
        entity.ensure_header().add(Field::subject("hi"));
        assert_eq!(entity.header().unwrap().len(), 1);

        entity.ensure_header();
        assert_eq!(entity.header().unwrap().len(), 1);
    }

    #[test]
    fn test_set_body_returns_displaced() {
        let mut entity = Entity::new();
        assert!(entity
            .set_body(Body::Single(Box::new(MemoryBody::from_bytes(b"old"))))
            .is_none());

        let displaced = entity
            .set_body(Body::Single(Box::new(MemoryBody::from_bytes(b"new"))))
            .unwrap();

        let mut old = String::new();
        displaced
            .as_single()
            .unwrap()
            .reader()
            .unwrap()
            .read_to_string(&mut old)
            .unwrap();
        assert_eq!(old, "old");
    }

    #[test]
    fn test_take_body_detaches() {
        let mut entity = Entity::new();
        entity.set_body(Body::Multipart(Multipart::new("B")));
        assert!(entity.is_multipart());

        let body = entity.take_body().unwrap();
        assert!(entity.body().is_none());
        assert_eq!(body.as_multipart().unwrap().boundary(), "B");
    }

    #[test]
    fn test_set_header_replaces() {
        let mut entity = Entity::new();
        entity.ensure_header().add(Field::subject("old"));

        let mut replacement = Header::new();
        replacement.add(Field::subject("new"));
        let previous = entity.set_header(replacement).unwrap();

        assert_eq!(previous.get(Field::SUBJECT).unwrap().text(), "old");
        assert_eq!(
            entity
                .header_mut()
                .unwrap()
                .get(Field::SUBJECT)
                .unwrap()
                .text(),
            "new"
        );
    }

    #[test]
    fn test_content_type_view() {
        let mut entity = Entity::new();
        entity
            .ensure_header()
            .add(Field::new(Field::CONTENT_TYPE, "multipart/mixed; boundary=B").unwrap());
        assert_eq!(entity.content_type().unwrap().boundary(), Some("B"));
    }

    #[test]
    fn test_clone_without_body() {
        let mut entity = Entity::new();
        entity.ensure_header().add(Field::subject("hi"));

        let copy = entity.try_clone().unwrap();
        assert_eq!(copy.header(), entity.header());
        assert!(copy.body().is_none());
    }
}
