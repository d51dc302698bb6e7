//! [`StreamingAead`] implementation for a single segmented key.

use streamset_core::{BoxedRead, BoxedWrite, EncryptingWrite, Result, StreamingAead};

use crate::crypto::SegmentedKey;
use crate::params::SegmentedParams;
use crate::reader::DecryptingReader;
use crate::writer::EncryptingWriter;

/// A segmented ChaCha20-Poly1305 streaming AEAD bound to one key.
#[derive(Debug, Clone)]
pub struct SegmentedStreamingAead {
    key: SegmentedKey,
    params: SegmentedParams,
}

impl SegmentedStreamingAead {
    /// Create from a key and validated parameters.
    pub fn new(key: SegmentedKey, params: SegmentedParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { key, params })
    }

    /// Create with a freshly generated key.
    pub fn generate(params: SegmentedParams) -> Result<Self> {
        Self::new(SegmentedKey::generate(), params)
    }

    /// Get the parameters.
    pub fn params(&self) -> SegmentedParams {
        self.params
    }

    /// Get the key.
    pub fn key(&self) -> &SegmentedKey {
        &self.key
    }
}

impl StreamingAead for SegmentedStreamingAead {
    fn new_encrypting_writer<'a>(
        &self,
        sink: BoxedWrite<'a>,
        associated_data: &[u8],
    ) -> Result<Box<dyn EncryptingWrite + 'a>> {
        let writer = EncryptingWriter::new(sink, &self.key, self.params, associated_data)?;
        Ok(Box::new(writer))
    }

    fn new_decrypting_reader<'a>(
        &self,
        source: BoxedRead<'a>,
        associated_data: &[u8],
    ) -> Result<BoxedRead<'a>> {
        let reader = DecryptingReader::new(source, &self.key, self.params, associated_data)?;
        Ok(Box::new(reader))
    }
}
