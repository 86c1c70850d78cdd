//! # mimetree
//!
//! In-memory entity tree for MIME-formatted (RFC 2045-style) messages.
//!
//! ## Features
//!
//! - **Entity model**: recursive message / multipart / single-body trees
//! - **Typed headers**: insertion-ordered fields with decoded views for
//!   Subject, Date, Message-ID, Content-Type and transfer encoding
//! - **Deep copy**: structural clone that honors content duplication
//!   capabilities
//! - **Event-driven construction**: build trees incrementally from the
//!   structural events of a stream tokenizer
//! - **Pluggable storage**: leaf content behind a storage-provider
//!   capability, with an in-memory provider included
//!
//! ## Quick Start
//!
//! ### Building a message programmatically
//!
//! ```ignore
//! use mimetree::{Body, Message, MemoryBody};
//!
//! let mut message = Message::new();
//! message.set_subject(Some("Hello"));
//! message.create_message_id(Some("mail.example.com"));
//! message.set_body(Body::Single(Box::new(MemoryBody::from_text("Hi there"))));
//!
//! assert_eq!(message.subject().as_deref(), Some("Hello"));
//! ```
//!
//! ### Building a tree from parse events
//!
//! ```ignore
//! use mimetree::{ContentHandler, TreeBuilder};
//!
//! // A stream tokenizer drives the handler with structural events.
//! let mut builder = TreeBuilder::new();
//! builder.start_message()?;
//! builder.start_header()?;
//! builder.field("Subject", "Hello")?;
//! builder.end_header()?;
//! builder.body(&mut "Hi there".as_bytes())?;
//! builder.end_message()?;
//!
//! let message = builder.finish()?;
//! ```
//!
//! ### Copying a tree
//!
//! ```ignore
//! let copy = message.try_clone()?;
//! // The copy is structurally equal and fully detached; content that
//! // cannot be duplicated surfaces as Error::UnsupportedCopy.
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod body;
mod builder;
mod content_type;
mod entity;
mod error;
mod field;
mod header;
mod message;
mod storage;

pub mod charset;
pub mod encoding;

pub use body::{Body, CustomBody, Multipart, SingleBody};
pub use builder::{ContentHandler, TreeBuilder};
pub use content_type::{ContentType, TransferEncoding};
pub use entity::Entity;
pub use error::{Error, Result};
pub use field::Field;
pub use header::Header;
pub use message::Message;
pub use storage::{MemoryBody, MemoryStorageProvider, StorageProvider, StorageSink};
