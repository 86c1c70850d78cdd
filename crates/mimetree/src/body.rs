//! Body variants: the recursive content model of an entity.
//!
//! A body is one of three built-in shapes (nested message, multipart,
//! single leaf content) plus an explicit extension point for caller-defined
//! content the copy algorithm refuses to handle.

use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::message::Message;
use std::fmt;
use std::io::Read;

/// Leaf body content behind a storage capability.
///
/// Implementations expose a readable byte stream. Duplication is opt-in:
/// the provided [`try_copy`](SingleBody::try_copy) reports
/// [`Error::UnsupportedCopy`], which is correct for single-use content
/// such as a body wrapping an unrepeatable stream.
pub trait SingleBody: fmt::Debug {
    /// Opens a reader over the body content.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the underlying storage cannot be read.
    fn reader(&self) -> std::io::Result<Box<dyn Read + '_>>;

    /// Content length in bytes, when known.
    fn len(&self) -> Option<u64> {
        None
    }

    /// Duplicates the body content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedCopy`] unless the implementation opts
    /// into duplication.
    fn try_copy(&self) -> Result<Box<dyn SingleBody>> {
        Err(Error::UnsupportedCopy)
    }
}

/// Extension bodies outside the built-in variants.
///
/// A tree can hold such content, but [`Body::try_clone`] rejects it with
/// [`Error::UnrecognizedBody`].
pub trait CustomBody: fmt::Debug {
    /// Short label describing the content, used in diagnostics.
    fn kind(&self) -> &str;
}

/// The content of an entity.
#[derive(Debug)]
pub enum Body {
    /// A nested message (message/rfc822).
    Message(Box<Message>),
    /// An ordered sequence of body parts.
    Multipart(Multipart),
    /// Leaf content behind a storage capability.
    Single(Box<dyn SingleBody>),
    /// Caller-defined content the copy algorithm cannot handle.
    Custom(Box<dyn CustomBody>),
}

impl Body {
    /// Deep-copies the body.
    ///
    /// Message and multipart bodies recurse; single bodies delegate to
    /// their own duplication capability.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedCopy`] if a single body does not
    /// support duplication, and [`Error::UnrecognizedBody`] for custom
    /// bodies.
    pub fn try_clone(&self) -> Result<Self> {
        match self {
            Self::Message(message) => Ok(Self::Message(Box::new(message.try_clone()?))),
            Self::Multipart(multipart) => Ok(Self::Multipart(multipart.try_clone()?)),
            Self::Single(single) => Ok(Self::Single(single.try_copy()?)),
            Self::Custom(_) => Err(Error::UnrecognizedBody),
        }
    }

    /// The multipart content, if this is a multipart body.
    #[must_use]
    pub fn as_multipart(&self) -> Option<&Multipart> {
        match self {
            Self::Multipart(multipart) => Some(multipart),
            _ => None,
        }
    }

    /// Mutable multipart content, if this is a multipart body.
    pub fn as_multipart_mut(&mut self) -> Option<&mut Multipart> {
        match self {
            Self::Multipart(multipart) => Some(multipart),
            _ => None,
        }
    }

    /// The nested message, if this is a message body.
    #[must_use]
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::Message(message) => Some(message),
            _ => None,
        }
    }

    /// The leaf content, if this is a single body.
    #[must_use]
    pub fn as_single(&self) -> Option<&dyn SingleBody> {
        match self {
            Self::Single(single) => Some(single.as_ref()),
            _ => None,
        }
    }
}

impl From<Message> for Body {
    fn from(message: Message) -> Self {
        Self::Message(Box::new(message))
    }
}

impl From<Multipart> for Body {
    fn from(multipart: Multipart) -> Self {
        Self::Multipart(multipart)
    }
}

/// A multipart body: ordered child entities plus the surrounding raw text.
#[derive(Debug, Default)]
pub struct Multipart {
    boundary: String,
    preamble: Option<String>,
    epilogue: Option<String>,
    parts: Vec<Entity>,
}

impl Multipart {
    /// Creates an empty multipart with the given boundary token.
    #[must_use]
    pub fn new(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            ..Self::default()
        }
    }

    /// The boundary token delimiting the parts.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Raw text before the first boundary, if any.
    #[must_use]
    pub fn preamble(&self) -> Option<&str> {
        self.preamble.as_deref()
    }

    /// Sets or clears the preamble.
    pub fn set_preamble(&mut self, preamble: Option<String>) {
        self.preamble = preamble;
    }

    /// Raw text after the closing boundary, if any.
    #[must_use]
    pub fn epilogue(&self) -> Option<&str> {
        self.epilogue.as_deref()
    }

    /// Sets or clears the epilogue.
    pub fn set_epilogue(&mut self, epilogue: Option<String>) {
        self.epilogue = epilogue;
    }

    /// Appends a body part.
    pub fn add_part(&mut self, part: Entity) {
        self.parts.push(part);
    }

    /// The body parts in stored order.
    #[must_use]
    pub fn parts(&self) -> &[Entity] {
        &self.parts
    }

    /// Mutable access to the body parts.
    pub fn parts_mut(&mut self) -> &mut Vec<Entity> {
        &mut self.parts
    }

    /// Deep-copies the multipart, recursing into every part in order.
    ///
    /// # Errors
    ///
    /// Propagates copy failures from the parts.
    pub fn try_clone(&self) -> Result<Self> {
        let mut parts = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            parts.push(part.try_clone()?);
        }
        Ok(Self {
            boundary: self.boundary.clone(),
            preamble: self.preamble.clone(),
            epilogue: self.epilogue.clone(),
            parts,
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
    use crate::storage::MemoryBody;

    #[derive(Debug)]
    struct OpaqueBody;

    impl CustomBody for OpaqueBody {
        fn kind(&self) -> &str {
            "opaque"
        }
    }

    #[test]
    fn test_multipart_part_order() {
        let mut multipart = Multipart::new("B");
        multipart.add_part(Entity::new());
        multipart.add_part(Entity::new());

        assert_eq!(multipart.boundary(), "B");
        assert_eq!(multipart.parts().len(), 2);
    }

    #[test]
    fn test_multipart_clone_preserves_framing() {
        let mut multipart = Multipart::new("B");
        multipart.set_preamble(Some("pre".to_string()));
        multipart.set_epilogue(Some("post".to_string()));

        let copy = multipart.try_clone().unwrap();
        assert_eq!(copy.boundary(), "B");
        assert_eq!(copy.preamble(), Some("pre"));
        assert_eq!(copy.epilogue(), Some("post"));
    }

    #[test]
    fn test_clone_single_body() {
        let body = Body::Single(Box::new(MemoryBody::from_bytes(b"hello")));
        let copy = body.try_clone().unwrap();

        let mut content = String::new();
        copy.as_single()
            .unwrap()
            .reader()
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "hello");
    }

    #[test]
    fn test_clone_rejects_custom_body() {
        let body = Body::Custom(Box::new(OpaqueBody));
        assert!(matches!(body.try_clone(), Err(Error::UnrecognizedBody)));
    }

    #[test]
    fn test_default_try_copy_is_unsupported() {
        #[derive(Debug)]
        struct SingleUse;

        impl SingleBody for SingleUse {
            fn reader(&self) -> std::io::Result<Box<dyn Read + '_>> {
                Ok(Box::new(&b"once"[..]))
            }
        }

        let body = Body::Single(Box::new(SingleUse));
        assert!(matches!(body.try_clone(), Err(Error::UnsupportedCopy)));
    }
}
