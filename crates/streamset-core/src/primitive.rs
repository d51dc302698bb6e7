//! Trait seams between keysets, wrappers and concrete ciphers.
//!
//! A concrete streaming cipher implements [`StreamingAead`] for a single key.
//! A [`PrimitiveWrapper`] turns a whole [`PrimitiveSet`] of them into one
//! primitive that behaves like a single key from the caller's point of view.

use std::io::{self, Read, Write};
use std::sync::Arc;

use crate::error::{Result, StreamError};
use crate::keyset::PrimitiveSet;

/// A boxed byte source handed to a decrypting reader.
pub type BoxedRead<'a> = Box<dyn Read + Send + 'a>;

/// A boxed byte sink handed to an encrypting writer.
pub type BoxedWrite<'a> = Box<dyn Write + Send + 'a>;

/// A writer that encrypts into a sink.
///
/// Plaintext is buffered until a full segment is available, so the final
/// segment is only written by [`EncryptingWrite::finish`]. Dropping an
/// unfinished writer makes a best-effort attempt and discards any error.
pub trait EncryptingWrite: Write + Send {
    /// Seal the final segment and flush the sink.
    fn finish(self: Box<Self>) -> io::Result<()>;
}

/// Streaming authenticated encryption with associated data.
///
/// Implementations must only ever return authenticated plaintext from the
/// decrypting reader: a `read` on an invalid segment fails before any of
/// that segment's bytes are handed out.
pub trait StreamingAead: Send + Sync {
    /// Open a writer that encrypts everything written to it into `sink`.
    fn new_encrypting_writer<'a>(
        &self,
        sink: BoxedWrite<'a>,
        associated_data: &[u8],
    ) -> Result<Box<dyn EncryptingWrite + 'a>>;

    /// Open a reader that decrypts the ciphertext read from `source`.
    fn new_decrypting_reader<'a>(
        &self,
        source: BoxedRead<'a>,
        associated_data: &[u8],
    ) -> Result<BoxedRead<'a>>;
}

impl<T: StreamingAead + ?Sized> StreamingAead for Arc<T> {
    fn new_encrypting_writer<'a>(
        &self,
        sink: BoxedWrite<'a>,
        associated_data: &[u8],
    ) -> Result<Box<dyn EncryptingWrite + 'a>> {
        (**self).new_encrypting_writer(sink, associated_data)
    }

    fn new_decrypting_reader<'a>(
        &self,
        source: BoxedRead<'a>,
        associated_data: &[u8],
    ) -> Result<BoxedRead<'a>> {
        (**self).new_decrypting_reader(source, associated_data)
    }
}

/// In-memory helpers on top of any [`StreamingAead`].
pub trait StreamingAeadExt: StreamingAead {
    /// Encrypt a whole buffer.
    fn encrypt_to_vec(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        let mut ciphertext = Vec::new();
        let mut writer = self.new_encrypting_writer(Box::new(&mut ciphertext), associated_data)?;
        writer.write_all(plaintext)?;
        writer.finish()?;
        Ok(ciphertext)
    }

    /// Decrypt a whole buffer.
    fn decrypt_to_vec(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        let mut reader = self.new_decrypting_reader(Box::new(ciphertext), associated_data)?;
        let mut plaintext = Vec::new();
        reader
            .read_to_end(&mut plaintext)
            .map_err(StreamError::from)?;
        Ok(plaintext)
    }
}

impl<T: StreamingAead + ?Sized> StreamingAeadExt for T {}

/// Combines the primitives of a keyset into a single primitive.
///
/// Wrappers are passed around explicitly; there is no process-wide registry.
pub trait PrimitiveWrapper {
    /// Primitive type held by each keyset entry.
    type Input: ?Sized;
    /// Primitive produced for the whole keyset.
    type Output;

    /// Build the combined primitive.
    fn wrap(&self, set: &PrimitiveSet<Self::Input>) -> Result<Self::Output>;
}
