//! Integration tests for the entity tree.
//!
//! These drive the construction protocol the way a stream tokenizer
//! would, then exercise typed access and deep copy on the resulting
//! trees.

use std::io::Read;

use mimetree::{
    Body, ContentHandler, CustomBody, Entity, Error, Field, MemoryBody, Message, Multipart,
    SingleBody, TreeBuilder,
};

/// Reads the leaf content of an entity as text.
fn read_leaf(entity: &Entity) -> String {
    let Some(Body::Single(single)) = entity.body() else {
        panic!("expected a single body");
    };
    let mut content = String::new();
    single
        .reader()
        .expect("leaf content must be readable")
        .read_to_string(&mut content)
        .expect("leaf content must be valid UTF-8");
    content
}

/// Feeds the well-nested reference event sequence into a builder.
fn build_reference_message() -> Message {
    let mut builder = TreeBuilder::new();
    builder.start_message().unwrap();
    builder.start_header().unwrap();
    builder.field("From", "alice@example.com").unwrap();
    builder.field("To", "bob@example.com").unwrap();
    builder.end_header().unwrap();
    builder.start_multipart("B").unwrap();
    builder.start_body_part().unwrap();
    builder.start_header().unwrap();
    builder.field("Content-Type", "text/plain").unwrap();
    builder.end_header().unwrap();
    builder.body(&mut &b"hello"[..]).unwrap();
    builder.end_body_part().unwrap();
    builder.end_multipart().unwrap();
    builder.end_message().unwrap();
    builder.finish().unwrap()
}

#[test]
fn reference_event_sequence_builds_expected_tree() {
    let message = build_reference_message();

    let header = message.header().expect("message has a header");
    let fields: Vec<_> = header
        .iter()
        .map(|f| (f.name(), f.raw_value()))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("From", "alice@example.com"),
            ("To", "bob@example.com"),
        ]
    );

    let multipart = message
        .body()
        .and_then(Body::as_multipart)
        .expect("body is a multipart");
    assert_eq!(multipart.boundary(), "B");
    assert_eq!(multipart.parts().len(), 1);
    assert_eq!(read_leaf(&multipart.parts()[0]), "hello");
}

#[test]
fn mismatched_events_raise_protocol_error() {
    let mut builder = TreeBuilder::new();
    builder.start_message().unwrap();
    assert!(matches!(builder.end_multipart(), Err(Error::Protocol(_))));

    // The failed build cannot be completed afterwards.
    assert!(matches!(builder.finish(), Err(Error::Protocol(_))));
}

/// Builds an arbitrary-depth tree: a message holding a multipart whose
/// second part nests another message with its own multipart body.
fn build_nested_tree() -> Message {
    let mut inner_part = Entity::new();
    inner_part
        .ensure_header()
        .add(Field::new("Content-Type", "text/plain").unwrap());
    inner_part.set_body(Body::Single(Box::new(MemoryBody::from_text("deep"))));

    let mut inner_multipart = Multipart::new("inner");
    inner_multipart.add_part(inner_part);

    let mut nested = Message::new();
    nested.set_subject(Some("nested"));
    nested.set_body(Body::Multipart(inner_multipart));

    let mut first = Entity::new();
    first.set_body(Body::Single(Box::new(MemoryBody::from_text("shallow"))));

    let mut second = Entity::new();
    second
        .ensure_header()
        .add(Field::new("Content-Type", "message/rfc822").unwrap());
    second.set_body(nested);

    let mut outer = Multipart::new("outer");
    outer.set_preamble(Some("pre".to_string()));
    outer.set_epilogue(Some("post".to_string()));
    outer.add_part(first);
    outer.add_part(second);

    let mut message = Message::new();
    message.set_subject(Some("outer"));
    message.set_body(Body::Multipart(outer));
    message
}

#[test]
fn deep_copy_round_trips_structure() {
    let source = build_nested_tree();
    let copy = source.try_clone().unwrap();

    assert_eq!(copy.subject().as_deref(), Some("outer"));

    let outer = copy.body().and_then(Body::as_multipart).unwrap();
    assert_eq!(outer.boundary(), "outer");
    assert_eq!(outer.preamble(), Some("pre"));
    assert_eq!(outer.epilogue(), Some("post"));
    assert_eq!(outer.parts().len(), 2);
    assert_eq!(read_leaf(&outer.parts()[0]), "shallow");

    let nested = outer.parts()[1].body().and_then(Body::as_message).unwrap();
    assert_eq!(nested.subject().as_deref(), Some("nested"));

    let inner = nested.body().and_then(Body::as_multipart).unwrap();
    assert_eq!(inner.boundary(), "inner");
    assert_eq!(read_leaf(&inner.parts()[0]), "deep");
}

#[test]
fn deep_copy_is_detached_from_source() {
    let source = build_nested_tree();
    let mut copy = source.try_clone().unwrap();

    copy.set_subject(Some("changed"));
    if let Some(multipart) = copy.body_mut().and_then(Body::as_multipart_mut) {
        multipart.parts_mut().clear();
    }

    assert_eq!(source.subject().as_deref(), Some("outer"));
    let outer = source.body().and_then(Body::as_multipart).unwrap();
    assert_eq!(outer.parts().len(), 2);
}

#[test]
fn copy_of_non_duplicable_content_fails() {
    #[derive(Debug)]
    struct SingleUse;

    impl SingleBody for SingleUse {
        fn reader(&self) -> std::io::Result<Box<dyn Read + '_>> {
            Ok(Box::new(&b"once"[..]))
        }
        // try_copy keeps its unsupported default
    }

    let mut part = Entity::new();
    part.set_body(Body::Single(Box::new(SingleUse)));

    let mut multipart = Multipart::new("B");
    multipart.add_part(part);

    let mut message = Message::new();
    message.set_body(Body::Multipart(multipart));

    assert!(matches!(
        message.try_clone(),
        Err(Error::UnsupportedCopy)
    ));
}

#[test]
fn copy_of_unrecognized_body_fails() {
    #[derive(Debug)]
    struct Opaque;

    impl CustomBody for Opaque {
        fn kind(&self) -> &str {
            "opaque"
        }
    }

    let mut message = Message::new();
    message.set_body(Body::Custom(Box::new(Opaque)));

    assert!(matches!(
        message.try_clone(),
        Err(Error::UnrecognizedBody)
    ));
}

#[test]
fn metadata_reads_never_allocate_a_header() {
    let message = Message::new();
    assert!(message.subject().is_none());
    assert!(message.date().is_none());
    assert!(message.message_id().is_none());
    assert!(message.header().is_none(), "read accessors must not allocate");
}

#[test]
fn metadata_writes_allocate_and_remove() {
    let mut message = Message::new();
    message.set_subject(Some("hello"));
    assert_eq!(message.subject().as_deref(), Some("hello"));
    assert!(message.header().is_some());

    message.set_subject(None);
    assert!(message.subject().is_none());
    assert!(message.header().unwrap().get(Field::SUBJECT).is_none());
}

#[test]
fn built_message_survives_deep_copy() {
    let message = build_reference_message();
    let copy = message.try_clone().unwrap();

    let multipart = copy.body().and_then(Body::as_multipart).unwrap();
    assert_eq!(read_leaf(&multipart.parts()[0]), "hello");
}
