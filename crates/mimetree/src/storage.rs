//! Storage capability for leaf body content.
//!
//! The tree builder writes body content through a [`StorageProvider`]:
//! one writable sink per leaf, sealed into a readable [`SingleBody`] once
//! complete. Dropping an unsealed sink releases whatever the provider
//! allocated for it, so sinks are scoped even on failure paths.
//!
//! [`MemoryStorageProvider`] is the backend shipped with the crate;
//! anything that can satisfy the sink contract (temp files, spooling,
//! encryption at rest) can stand in for it.

use crate::body::SingleBody;
use crate::error::Result;
use std::io::{Read, Write};
use std::sync::Arc;

/// Allocates writable sinks for body content.
pub trait StorageProvider {
    /// Opens a new empty sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot allocate one.
    fn new_sink(&self) -> Result<Box<dyn StorageSink>>;
}

/// A writable sink that seals into readable body content.
pub trait StorageSink: Write {
    /// Seals the sink, yielding the stored content as a [`SingleBody`].
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails to finalize the
    /// content.
    fn seal(self: Box<Self>) -> Result<Box<dyn SingleBody>>;
}

/// Storage provider that buffers body content in memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryStorageProvider;

impl StorageProvider for MemoryStorageProvider {
    fn new_sink(&self) -> Result<Box<dyn StorageSink>> {
        Ok(Box::new(MemorySink { buffer: Vec::new() }))
    }
}

/// In-memory sink; seals into a [`MemoryBody`].
#[derive(Debug, Default)]
struct MemorySink {
    buffer: Vec<u8>,
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl StorageSink for MemorySink {
    fn seal(self: Box<Self>) -> Result<Box<dyn SingleBody>> {
        Ok(Box::new(MemoryBody {
            bytes: Arc::from(self.buffer),
        }))
    }
}

/// Leaf body content held in memory.
///
/// Duplication is supported and cheap: copies share the underlying
/// bytes.
#[derive(Debug, Clone)]
pub struct MemoryBody {
    bytes: Arc<[u8]>,
}

impl MemoryBody {
    /// Creates a body over the given bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: Arc::from(bytes),
        }
    }

    /// Creates a body over the UTF-8 bytes of the given text.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }

    /// The stored bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl SingleBody for MemoryBody {
    fn reader(&self) -> std::io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(&*self.bytes))
    }

    fn len(&self) -> Option<u64> {
        Some(self.bytes.len() as u64)
    }

    fn try_copy(&self) -> Result<Box<dyn SingleBody>> {
        Ok(Box::new(self.clone()))
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

    #[test]
    fn test_sink_seal_read_back() {
        let provider = MemoryStorageProvider;
        let mut sink = provider.new_sink().unwrap();
        sink.write_all(b"hello").unwrap();

        let body = sink.seal().unwrap();
        assert_eq!(body.len(), Some(5));

        let mut content = String::new();
        body.reader().unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "hello");
    }

    #[test]
    fn test_empty_sink_seals_empty_body() {
        let provider = MemoryStorageProvider;
        let body = provider.new_sink().unwrap().seal().unwrap();
        assert_eq!(body.len(), Some(0));
    }

    #[test]
    fn test_memory_body_copy_shares_content() {
        let body = MemoryBody::from_text("shared");
        let copy = body.try_copy().unwrap();

        let mut content = String::new();
        copy.reader().unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "shared");
        assert_eq!(copy.len(), body.len());
    }

    #[test]
    fn test_bytes_accessor() {
        let body = MemoryBody::from_bytes(&[1, 2, 3]);
        assert_eq!(body.bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_reader_is_repeatable() {
        let body = MemoryBody::from_text("again");
        for _ in 0..2 {
            let mut content = String::new();
            body.reader().unwrap().read_to_string(&mut content).unwrap();
            assert_eq!(content, "again");
        }
    }
}
