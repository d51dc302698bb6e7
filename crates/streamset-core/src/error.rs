//! Error types for streamset.

use std::io;

use thiserror::Error;

/// Errors that can occur while building or using streaming primitives.
///
/// Stream reads and writes report failures as [`io::Error`]. Errors raised by
/// streamset itself are carried inside those I/O errors and can be recovered
/// with [`StreamError::from_io`].
#[derive(Debug, Error)]
pub enum StreamError {
    /// The keyset has no primary entry, so nothing can encrypt.
    #[error("no primary key set")]
    MissingPrimary,

    /// The underlying cipher could not encrypt.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// No candidate key authenticated the stream.
    ///
    /// Deliberately carries no detail about the candidates that were tried.
    #[error("no matching key found for the ciphertext in the stream")]
    NoMatchingKey,

    /// Decryption failed after a key had already been selected.
    #[error("decryption error: {0}")]
    Decryption(String),

    /// Key material is malformed.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Cipher or wrapper parameters are out of range.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The keyset violates a structural rule.
    #[error("invalid keyset: {0}")]
    InvalidKeyset(String),

    /// I/O error from a source or sink.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
}

impl StreamError {
    /// Recover the streamset error carried inside an I/O error, if any.
    pub fn from_io(err: &io::Error) -> Option<&StreamError> {
        err.get_ref()?.downcast_ref::<StreamError>()
    }

    /// Whether this error means the ciphertext was rejected.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, StreamError::NoMatchingKey | StreamError::Decryption(_))
    }

    fn io_kind(&self) -> io::ErrorKind {
        match self {
            StreamError::NoMatchingKey | StreamError::Decryption(_) => io::ErrorKind::InvalidData,
            StreamError::MissingPrimary
            | StreamError::InvalidKey(_)
            | StreamError::InvalidParameters(_)
            | StreamError::InvalidKeyset(_) => io::ErrorKind::InvalidInput,
            StreamError::Encryption(_) => io::ErrorKind::Other,
            StreamError::Io(e) => e.kind(),
        }
    }
}

impl From<io::Error> for StreamError {
    fn from(err: io::Error) -> Self {
        if !err.get_ref().is_some_and(|inner| inner.is::<StreamError>()) {
            return StreamError::Io(err);
        }
        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<StreamError>()) {
            Some(Ok(stream_err)) => *stream_err,
            Some(Err(other)) => StreamError::Io(io::Error::new(kind, other)),
            None => StreamError::Io(io::Error::from(kind)),
        }
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Io(inner) => inner,
            other => io::Error::new(other.io_kind(), other),
        }
    }
}

/// Result type for streamset operations.
pub type Result<T> = std::result::Result<T, StreamError>;
