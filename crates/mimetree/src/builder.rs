//! Event-driven construction of entity trees.
//!
//! An external tokenizer recognizes the wire grammar (header folding,
//! boundary delimiters) and drives a [`ContentHandler`] with structural
//! events. [`TreeBuilder`] consumes those events over an explicit stack of
//! in-progress frames: every start event pushes a frame, every matching
//! end event pops it and attaches the completed node to its parent. Events
//! that break the nesting discipline abort the build with
//! [`Error::Protocol`]; nothing is silently tolerated or reordered.

use crate::body::{Body, Multipart};
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::field::Field;
use crate::message::Message;
use crate::storage::{MemoryStorageProvider, StorageProvider};
use std::io::{Read, Write as _};
use tracing::trace;

/// Receiver of structural parse events, push model.
///
/// Events for a nesting level are fully delivered (matching start/end)
/// before any sibling's events begin. All methods default to accepting
/// the event and doing nothing, so a handler only implements what it
/// observes.
#[allow(unused_variables)]
pub trait ContentHandler {
    /// A message starts: the whole document, or a nested message/rfc822
    /// body.
    fn start_message(&mut self) -> Result<()> {
        Ok(())
    }

    /// The current message is complete.
    fn end_message(&mut self) -> Result<()> {
        Ok(())
    }

    /// The header of the current entity starts.
    fn start_header(&mut self) -> Result<()> {
        Ok(())
    }

    /// One header field, in arrival order.
    fn field(&mut self, name: &str, raw_value: &str) -> Result<()> {
        Ok(())
    }

    /// The current header is complete.
    fn end_header(&mut self) -> Result<()> {
        Ok(())
    }

    /// A multipart body starts, delimited by the given boundary token.
    fn start_multipart(&mut self, boundary: &str) -> Result<()> {
        Ok(())
    }

    /// Raw text between the multipart header and the first boundary.
    fn preamble(&mut self, text: &str) -> Result<()> {
        Ok(())
    }

    /// A body part of the current multipart starts.
    fn start_body_part(&mut self) -> Result<()> {
        Ok(())
    }

    /// The current body part is complete.
    fn end_body_part(&mut self) -> Result<()> {
        Ok(())
    }

    /// Raw text after the closing boundary of the current multipart.
    fn epilogue(&mut self, text: &str) -> Result<()> {
        Ok(())
    }

    /// The current multipart body is complete.
    fn end_multipart(&mut self) -> Result<()> {
        Ok(())
    }

    /// Leaf content of the current entity, as a readable stream.
    fn body(&mut self, content: &mut dyn Read) -> Result<()> {
        Ok(())
    }
}

/// An in-progress node on the builder stack.
#[derive(Debug)]
enum Frame {
    /// A message under construction (root or nested).
    Message(Entity),
    /// A body part of an open multipart.
    BodyPart(Entity),
    /// A multipart body collecting parts.
    Multipart(Multipart),
}

impl Frame {
    const fn describe(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::BodyPart(_) => "body part",
            Self::Multipart(_) => "multipart",
        }
    }
}

/// Builds an entity tree from [`ContentHandler`] events.
///
/// Body content is written through the configured [`StorageProvider`];
/// the in-memory provider is used unless another is supplied. After a
/// protocol or storage failure the builder is poisoned: every later
/// event and [`finish`](Self::finish) report a protocol error, and the
/// caller discards the builder. There is no partial-result contract.
pub struct TreeBuilder {
    provider: Box<dyn StorageProvider>,
    stack: Vec<Frame>,
    in_header: bool,
    root: Option<Message>,
    poisoned: bool,
}

impl TreeBuilder {
    /// Creates a builder storing body content in memory.
    #[must_use]
    pub fn new() -> Self {
        Self::with_provider(MemoryStorageProvider)
    }

    /// Creates a builder storing body content through the given provider.
    pub fn with_provider(provider: impl StorageProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            stack: Vec::new(),
            in_header: false,
            root: None,
            poisoned: false,
        }
    }

    /// Returns the completed message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the event stream never completed a
    /// message, left frames open, or aborted earlier.
    pub fn finish(mut self) -> Result<Message> {
        if self.poisoned {
            return Err(Error::Protocol(
                "build aborted by an earlier failure".to_string(),
            ));
        }
        if let Some(frame) = self.stack.last() {
            return Err(Error::Protocol(format!(
                "construction incomplete: a {} is still open",
                frame.describe()
            )));
        }
        self.root
            .take()
            .ok_or_else(|| Error::Protocol("no message was built".to_string()))
    }

    /// Poisons the builder and produces the protocol error.
    fn violation(&mut self, message: impl Into<String>) -> Error {
        self.poisoned = true;
        Error::Protocol(message.into())
    }

    /// Rejects events arriving after an earlier abort.
    fn check_live(&self) -> Result<()> {
        if self.poisoned {
            return Err(Error::Protocol(
                "build aborted by an earlier failure".to_string(),
            ));
        }
        Ok(())
    }

    /// The entity of the innermost open message or body part frame.
    fn open_entity_mut(&mut self) -> Option<&mut Entity> {
        match self.stack.last_mut() {
            Some(Frame::Message(entity) | Frame::BodyPart(entity)) => Some(entity),
            _ => None,
        }
    }

    /// Whether the innermost frame is an entity still awaiting its body.
    fn entity_awaiting_body(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(Frame::Message(entity) | Frame::BodyPart(entity)) if entity.body().is_none()
        )
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentHandler for TreeBuilder {
    fn start_message(&mut self) -> Result<()> {
        self.check_live()?;
        trace!(depth = self.stack.len(), "start of message");
        if self.in_header {
            return Err(self.violation("start of message inside an open header"));
        }
        if self.stack.is_empty() {
            if self.root.is_some() {
                return Err(self.violation("message event after construction completed"));
            }
        } else if !self.entity_awaiting_body() {
            return Err(self.violation("nested message outside an entity awaiting its body"));
        }
        self.stack.push(Frame::Message(Entity::new()));
        Ok(())
    }

    fn end_message(&mut self) -> Result<()> {
        self.check_live()?;
        trace!(depth = self.stack.len(), "end of message");
        if self.in_header {
            return Err(self.violation("end of message inside an open header"));
        }
        let entity = match self.stack.pop() {
            Some(Frame::Message(entity)) => entity,
            Some(frame) => {
                let open = frame.describe();
                return Err(self.violation(format!("end of message while a {open} is open")));
            }
            None => return Err(self.violation("end of message without a matching start")),
        };

        let message = Message::from_entity(entity);
        match self.stack.last_mut() {
            None => {
                self.root = Some(message);
                Ok(())
            }
            Some(Frame::Message(parent) | Frame::BodyPart(parent)) => {
                // entity_awaiting_body was checked when this frame was pushed
                parent.set_body(message);
                Ok(())
            }
            Some(Frame::Multipart(_)) => {
                Err(self.violation("nested message closed directly inside a multipart"))
            }
        }
    }

    fn start_header(&mut self) -> Result<()> {
        self.check_live()?;
        trace!(depth = self.stack.len(), "start of header");
        if self.in_header {
            return Err(self.violation("start of header inside an open header"));
        }
        let acceptable = matches!(
            self.stack.last(),
            Some(Frame::Message(entity) | Frame::BodyPart(entity))
                if entity.header().is_none() && entity.body().is_none()
        );
        if !acceptable {
            return Err(self.violation("start of header outside a fresh entity"));
        }
        self.in_header = true;
        if let Some(entity) = self.open_entity_mut() {
            entity.ensure_header();
        }
        Ok(())
    }

    fn field(&mut self, name: &str, raw_value: &str) -> Result<()> {
        self.check_live()?;
        if !self.in_header {
            return Err(self.violation(format!("header field {name:?} outside an open header")));
        }
        let field = Field::new(name, raw_value)?;
        match self.open_entity_mut() {
            Some(entity) => {
                entity.ensure_header().add(field);
                Ok(())
            }
            None => Err(self.violation("header field without an open entity")),
        }
    }

    fn end_header(&mut self) -> Result<()> {
        self.check_live()?;
        trace!(depth = self.stack.len(), "end of header");
        if !self.in_header {
            return Err(self.violation("end of header without a matching start"));
        }
        self.in_header = false;
        Ok(())
    }

    fn start_multipart(&mut self, boundary: &str) -> Result<()> {
        self.check_live()?;
        trace!(depth = self.stack.len(), boundary, "start of multipart");
        if self.in_header {
            return Err(self.violation("start of multipart inside an open header"));
        }
        if !self.entity_awaiting_body() {
            return Err(self.violation("start of multipart outside an entity awaiting its body"));
        }
        self.stack.push(Frame::Multipart(Multipart::new(boundary)));
        Ok(())
    }

    fn preamble(&mut self, text: &str) -> Result<()> {
        self.check_live()?;
        match self.stack.last_mut() {
            Some(Frame::Multipart(multipart)) => {
                multipart.set_preamble(Some(text.to_string()));
                Ok(())
            }
            _ => Err(self.violation("preamble outside an open multipart")),
        }
    }

    fn start_body_part(&mut self) -> Result<()> {
        self.check_live()?;
        trace!(depth = self.stack.len(), "start of body part");
        if !matches!(self.stack.last(), Some(Frame::Multipart(_))) {
            return Err(self.violation("body part outside an open multipart"));
        }
        self.stack.push(Frame::BodyPart(Entity::new()));
        Ok(())
    }

    fn end_body_part(&mut self) -> Result<()> {
        self.check_live()?;
        trace!(depth = self.stack.len(), "end of body part");
        if self.in_header {
            return Err(self.violation("end of body part inside an open header"));
        }
        let entity = match self.stack.pop() {
            Some(Frame::BodyPart(entity)) => entity,
            Some(frame) => {
                let open = frame.describe();
                return Err(self.violation(format!("end of body part while a {open} is open")));
            }
            None => return Err(self.violation("end of body part without a matching start")),
        };
        match self.stack.last_mut() {
            Some(Frame::Multipart(multipart)) => {
                multipart.add_part(entity);
                Ok(())
            }
            _ => Err(self.violation("body part closed outside its multipart")),
        }
    }

    fn epilogue(&mut self, text: &str) -> Result<()> {
        self.check_live()?;
        match self.stack.last_mut() {
            Some(Frame::Multipart(multipart)) => {
                multipart.set_epilogue(Some(text.to_string()));
                Ok(())
            }
            _ => Err(self.violation("epilogue outside an open multipart")),
        }
    }

    fn end_multipart(&mut self) -> Result<()> {
        self.check_live()?;
        trace!(depth = self.stack.len(), "end of multipart");
        let multipart = match self.stack.pop() {
            Some(Frame::Multipart(multipart)) => multipart,
            Some(frame) => {
                let open = frame.describe();
                return Err(self.violation(format!("end of multipart while a {open} is open")));
            }
            None => return Err(self.violation("end of multipart without a matching start")),
        };
        match self.stack.last_mut() {
            Some(Frame::Message(parent) | Frame::BodyPart(parent)) => {
                parent.set_body(Body::Multipart(multipart));
                Ok(())
            }
            _ => Err(self.violation("multipart closed outside an entity")),
        }
    }

    fn body(&mut self, content: &mut dyn Read) -> Result<()> {
        self.check_live()?;
        if self.in_header {
            return Err(self.violation("body content inside an open header"));
        }
        if !self.entity_awaiting_body() {
            return Err(self.violation("body content outside an entity awaiting its body"));
        }

        let context = format!(
            "storing leaf content of the open {} at depth {}",
            self.stack.last().map_or("entity", Frame::describe),
            self.stack.len()
        );

        // The sink is dropped, and its resources released, on every error path.
        let mut sink = self.provider.new_sink()?;
        let mut buffer = [0_u8; 8192];
        let mut total = 0_u64;
        loop {
            let n = match content.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    self.poisoned = true;
                    return Err(Error::storage(context.clone(), e));
                }
            };
            if let Err(e) = sink.write_all(&buffer[..n]) {
                self.poisoned = true;
                return Err(Error::storage(context.clone(), e));
            }
            total += n as u64;
        }
        trace!(depth = self.stack.len(), bytes = total, "leaf content stored");

        let body = match sink.seal() {
            Ok(body) => body,
            Err(e) => {
                self.poisoned = true;
                return Err(e);
            }
        };
        if let Some(entity) = self.open_entity_mut() {
            entity.set_body(Body::Single(body));
        }
        Ok(())
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
    use crate::storage::StorageSink;

    fn read_leaf(entity: &Entity) -> String {
        let Some(Body::Single(single)) = entity.body() else {
            panic!("expected a single body");
        };
        let mut content = String::new();
        single
            .reader()
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }

    #[test]
    fn test_simple_message() {
        let mut builder = TreeBuilder::new();
        builder.start_message().unwrap();
        builder.start_header().unwrap();
        builder.field("Subject", "Hi").unwrap();
        builder.end_header().unwrap();
        builder.body(&mut &b"plain text"[..]).unwrap();
        builder.end_message().unwrap();

        let message = builder.finish().unwrap();
        assert_eq!(message.subject().as_deref(), Some("Hi"));
        assert_eq!(read_leaf(&message), "plain text");
    }

    #[test]
    fn test_multipart_message() {
        let mut builder = TreeBuilder::new();
        builder.start_message().unwrap();
        builder.start_header().unwrap();
        builder.field("From", "a@example.com").unwrap();
        builder.field("To", "b@example.com").unwrap();
        builder.end_header().unwrap();
        builder.start_multipart("B").unwrap();
        builder.preamble("ignore me").unwrap();
        builder.start_body_part().unwrap();
        builder.start_header().unwrap();
        builder.field("Content-Type", "text/plain").unwrap();
        builder.end_header().unwrap();
        builder.body(&mut &b"hello"[..]).unwrap();
        builder.end_body_part().unwrap();
        builder.epilogue("bye").unwrap();
        builder.end_multipart().unwrap();
        builder.end_message().unwrap();

        let message = builder.finish().unwrap();
        let header = message.header().unwrap();
        let names: Vec<_> = header.iter().map(Field::name).collect();
        assert_eq!(names, vec!["From", "To"]);

        let multipart = message.body().unwrap().as_multipart().unwrap();
        assert_eq!(multipart.boundary(), "B");
        assert_eq!(multipart.preamble(), Some("ignore me"));
        assert_eq!(multipart.epilogue(), Some("bye"));
        assert_eq!(multipart.parts().len(), 1);
        assert_eq!(read_leaf(&multipart.parts()[0]), "hello");
    }

    #[test]
    fn test_nested_message() {
        let mut builder = TreeBuilder::new();
        builder.start_message().unwrap();
        builder.start_header().unwrap();
        builder.end_header().unwrap();
        builder.start_multipart("outer").unwrap();
        builder.start_body_part().unwrap();
        builder.start_header().unwrap();
        builder.field("Content-Type", "message/rfc822").unwrap();
        builder.end_header().unwrap();
        builder.start_message().unwrap();
        builder.start_header().unwrap();
        builder.field("Subject", "inner").unwrap();
        builder.end_header().unwrap();
        builder.body(&mut &b"inner body"[..]).unwrap();
        builder.end_message().unwrap();
        builder.end_body_part().unwrap();
        builder.end_multipart().unwrap();
        builder.end_message().unwrap();

        let message = builder.finish().unwrap();
        let multipart = message.body().unwrap().as_multipart().unwrap();
        let nested = multipart.parts()[0].body().unwrap().as_message().unwrap();
        assert_eq!(nested.subject().as_deref(), Some("inner"));
        assert_eq!(read_leaf(nested), "inner body");
    }

    #[test]
    fn test_end_multipart_without_start() {
        let mut builder = TreeBuilder::new();
        builder.start_message().unwrap();
        let err = builder.end_multipart().unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn test_field_outside_header() {
        let mut builder = TreeBuilder::new();
        builder.start_message().unwrap();
        assert!(matches!(
            builder.field("Subject", "Hi"),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn test_poisoned_builder_rejects_everything() {
        let mut builder = TreeBuilder::new();
        builder.start_message().unwrap();
        let _ = builder.end_multipart();

        assert!(matches!(builder.end_message(), Err(Error::Protocol(_))));
        assert!(matches!(builder.finish(), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_finish_incomplete() {
        let mut builder = TreeBuilder::new();
        builder.start_message().unwrap();
        assert!(matches!(builder.finish(), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_finish_without_events() {
        assert!(matches!(TreeBuilder::new().finish(), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_events_after_completion() {
        let mut builder = TreeBuilder::new();
        builder.start_message().unwrap();
        builder.end_message().unwrap();
        assert!(matches!(builder.start_message(), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_storage_failure_aborts_build() {
        #[derive(Debug)]
        struct FailingSink;

        impl std::io::Write for FailingSink {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk full"))
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        impl StorageSink for FailingSink {
            fn seal(self: Box<Self>) -> Result<Box<dyn crate::SingleBody>> {
                unreachable!("write never succeeds")
            }
        }

        #[derive(Debug)]
        struct FailingProvider;

        impl StorageProvider for FailingProvider {
            fn new_sink(&self) -> Result<Box<dyn StorageSink>> {
                Ok(Box::new(FailingSink))
            }
        }

        let mut builder = TreeBuilder::with_provider(FailingProvider);
        builder.start_message().unwrap();
        let err = builder.body(&mut &b"content"[..]).unwrap_err();
        assert!(matches!(err, Error::Storage { .. }));
        assert!(matches!(builder.finish(), Err(Error::Protocol(_))));
    }
}
