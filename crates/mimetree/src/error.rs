//! Error types for entity tree operations.

use std::io;
use std::string::FromUtf8Error;

/// Result type alias for entity tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building, copying or encoding entity trees.
///
/// Field-level decode failures (an unparsable date, a malformed encoded
/// word) are not represented here: typed accessors absorb them and report
/// the value as absent instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The event source violated the nesting discipline of the
    /// construction protocol. Fatal to the build in progress.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Deep copy reached a single body that does not support duplication.
    #[error("Body content does not support duplication")]
    UnsupportedCopy,

    /// Deep copy reached a body variant outside message, multipart and
    /// single body.
    #[error("Unrecognized body variant cannot be copied")]
    UnrecognizedBody,

    /// I/O failure while writing or reading body content.
    #[error("Storage I/O error while {context}: {source}")]
    Storage {
        /// What the builder was doing when the failure occurred.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Header field name is empty or contains forbidden characters.
    #[error("Invalid field name: {0:?}")]
    InvalidFieldName(String),

    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Invalid encoding.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// UTF-8 decode error.
    #[error("UTF-8 decode error: {0}")]
    Utf8Decode(#[from] FromUtf8Error),
}

impl Error {
    /// Wraps an I/O error with a description of the active build step.
    pub(crate) fn storage(context: impl Into<String>, source: io::Error) -> Self {
        Self::Storage {
            context: context.into(),
            source,
        }
    }
}
