//! Wrapping a keyset into a single streaming AEAD.

use std::fmt;
use std::io::{Read, Seek, Write};
use std::sync::Arc;

use streamset_core::{
    BoxedRead, BoxedWrite, EncryptingWrite, KeyId, PrimitiveSet, PrimitiveWrapper, Result,
    StreamError, StreamingAead, StreamingAeadSet,
};

use crate::config::{TrialOrder, WrapperConfig};
use crate::rewind::{RewindableReader, SeekRewinder};
use crate::trial::{Candidate, DecryptingReader, StreamTrial};

/// Builds a [`WrappedStreamingAead`] from a keyset.
#[derive(Debug, Clone, Default)]
pub struct StreamingAeadWrapper {
    config: WrapperConfig,
}

impl StreamingAeadWrapper {
    /// Create a wrapper with the given configuration.
    pub fn new(config: WrapperConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &WrapperConfig {
        &self.config
    }
}

impl PrimitiveWrapper for StreamingAeadWrapper {
    type Input = dyn StreamingAead;
    type Output = WrappedStreamingAead;

    fn wrap(&self, set: &PrimitiveSet<dyn StreamingAead>) -> Result<WrappedStreamingAead> {
        let primary_index = set.primary_index().ok_or(StreamError::MissingPrimary)?;
        let primary = set
            .entries()
            .get(primary_index)
            .map(Candidate::from_entry)
            .ok_or(StreamError::MissingPrimary)?;
        self.config.validate()?;

        let mut candidates = Vec::with_capacity(set.len());
        let mut primary_pos = None;
        for (index, entry) in set.iter().enumerate() {
            let is_primary = index == primary_index;
            if !is_primary && !entry.framing().is_raw() && !self.config.include_prefixed_keys {
                continue;
            }
            if is_primary {
                primary_pos = Some(candidates.len());
            }
            candidates.push(Candidate::from_entry(entry));
        }

        if self.config.trial_order == TrialOrder::PrimaryFirst {
            if let Some(pos) = primary_pos {
                candidates[..=pos].rotate_right(1);
            }
        }

        tracing::debug!(
            primary = %primary.key_id,
            candidates = candidates.len(),
            order = ?self.config.trial_order,
            "wrapped streaming AEAD keyset"
        );

        Ok(WrappedStreamingAead {
            primary,
            candidates: candidates.into(),
            config: self.config.clone(),
        })
    }
}

/// Wrap `set` with the default configuration.
pub fn wrap(set: &StreamingAeadSet) -> Result<WrappedStreamingAead> {
    StreamingAeadWrapper::default().wrap(set)
}

/// A keyset acting as one streaming AEAD.
///
/// Encryption always uses the primary key. Decryption tries every candidate
/// in order on the same ciphertext and commits to the first one that
/// authenticates the opening segment.
///
/// Immutable after construction and cheap to clone. Each call builds its own
/// trial state, so one instance may serve any number of threads.
#[derive(Clone)]
pub struct WrappedStreamingAead {
    primary: Candidate,
    candidates: Arc<[Candidate]>,
    config: WrapperConfig,
}

impl WrappedStreamingAead {
    /// Key id of the primary.
    pub fn primary_key_id(&self) -> KeyId {
        self.primary.key_id
    }

    /// Key ids of the decryption candidates, in trial order.
    pub fn candidate_key_ids(&self) -> Vec<KeyId> {
        self.candidates.iter().map(|c| c.key_id).collect()
    }

    /// Get the configuration.
    pub fn config(&self) -> &WrapperConfig {
        &self.config
    }

    /// Start encrypting into `sink` with the primary key.
    pub fn open_encrypting_writer<'a, W>(
        &self,
        sink: W,
        associated_data: &[u8],
    ) -> Result<Box<dyn EncryptingWrite + 'a>>
    where
        W: Write + Send + 'a,
    {
        self.primary
            .primitive
            .new_encrypting_writer(Box::new(sink), associated_data)
    }

    /// Find the key for the ciphertext in `source` and start decrypting.
    ///
    /// Returns [`StreamError::NoMatchingKey`] when no candidate authenticates
    /// the first segment. Bytes read while trying keys are buffered, up to
    /// `max_rewind_bytes`.
    pub fn open_decrypting_reader<'a, R>(
        &self,
        source: R,
        associated_data: &[u8],
    ) -> Result<DecryptingReader<'a>>
    where
        R: Read + Send + 'a,
    {
        let source = RewindableReader::new(source, self.config.max_rewind_bytes);
        StreamTrial::new(&self.candidates, source, associated_data, self.config.probe_len).run()
    }

    /// Like [`open_decrypting_reader`](Self::open_decrypting_reader), but
    /// restarts attempts by seeking instead of buffering.
    ///
    /// The ciphertext starts at the current position of `source`.
    pub fn open_seekable_decrypting_reader<'a, R>(
        &self,
        source: R,
        associated_data: &[u8],
    ) -> Result<DecryptingReader<'a>>
    where
        R: Read + Seek + Send + 'a,
    {
        let source = SeekRewinder::new(source)?;
        StreamTrial::new(&self.candidates, source, associated_data, self.config.probe_len).run()
    }
}

impl StreamingAead for WrappedStreamingAead {
    fn new_encrypting_writer<'a>(
        &self,
        sink: BoxedWrite<'a>,
        associated_data: &[u8],
    ) -> Result<Box<dyn EncryptingWrite + 'a>> {
        self.primary
            .primitive
            .new_encrypting_writer(sink, associated_data)
    }

    fn new_decrypting_reader<'a>(
        &self,
        source: BoxedRead<'a>,
        associated_data: &[u8],
    ) -> Result<BoxedRead<'a>> {
        let reader = self.open_decrypting_reader(source, associated_data)?;
        Ok(Box::new(reader))
    }
}

impl fmt::Debug for WrappedStreamingAead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedStreamingAead")
            .field("primary", &self.primary.key_id)
            .field("candidates", &self.candidate_key_ids())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use streamset_core::{FramingType, KeyEntry, KeyStatus, StreamingAeadExt};
    use streamset_segmented::{SegmentedParams, SegmentedStreamingAead};

    fn aead() -> Arc<dyn StreamingAead> {
        Arc::new(SegmentedStreamingAead::generate(SegmentedParams::new(64).unwrap()).unwrap())
    }

    fn entry(id: u32, primitive: &Arc<dyn StreamingAead>, framing: FramingType) -> KeyEntry<dyn StreamingAead> {
        KeyEntry::new(KeyId(id), Arc::clone(primitive), framing, KeyStatus::Enabled)
    }

    #[test]
    fn test_wrap_requires_primary() {
        let a = aead();
        let set = PrimitiveSet::builder()
            .add(KeyEntry::raw(KeyId(1), a))
            .build()
            .unwrap();

        assert!(matches!(wrap(&set), Err(StreamError::MissingPrimary)));
    }

    #[test]
    fn test_wrap_rejects_bad_config() {
        let a = aead();
        let set = PrimitiveSet::builder()
            .add_primary(KeyEntry::raw(KeyId(1), a))
            .build()
            .unwrap();
        let wrapper = StreamingAeadWrapper::new(WrapperConfig {
            probe_len: 0,
            ..WrapperConfig::default()
        });

        assert!(matches!(
            wrapper.wrap(&set),
            Err(StreamError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_candidates_follow_keyset_order() {
        let (a, b, c) = (aead(), aead(), aead());
        let set = PrimitiveSet::builder()
            .add(entry(3, &a, FramingType::Raw))
            .add_primary(entry(1, &b, FramingType::Raw))
            .add(entry(2, &c, FramingType::WithPrefix))
            .build()
            .unwrap();

        let wrapped = wrap(&set).unwrap();
        assert_eq!(wrapped.primary_key_id(), KeyId(1));
        assert_eq!(
            wrapped.candidate_key_ids(),
            vec![KeyId(3), KeyId(1), KeyId(2)]
        );
    }

    #[test]
    fn test_primary_first_order() {
        let (a, b, c) = (aead(), aead(), aead());
        let set = PrimitiveSet::builder()
            .add(entry(3, &a, FramingType::Raw))
            .add(entry(2, &c, FramingType::Raw))
            .add_primary(entry(1, &b, FramingType::Raw))
            .build()
            .unwrap();
        let wrapper = StreamingAeadWrapper::new(WrapperConfig {
            trial_order: TrialOrder::PrimaryFirst,
            ..WrapperConfig::default()
        });

        let wrapped = wrapper.wrap(&set).unwrap();
        assert_eq!(
            wrapped.candidate_key_ids(),
            vec![KeyId(1), KeyId(3), KeyId(2)]
        );
    }

    #[test]
    fn test_prefixed_keys_can_be_excluded() {
        let (a, b) = (aead(), aead());
        let set = PrimitiveSet::builder()
            .add_primary(entry(1, &a, FramingType::WithPrefix))
            .add(entry(2, &b, FramingType::WithPrefix))
            .build()
            .unwrap();
        let wrapper = StreamingAeadWrapper::new(WrapperConfig {
            include_prefixed_keys: false,
            ..WrapperConfig::default()
        });

        let wrapped = wrapper.wrap(&set).unwrap();
        assert_eq!(wrapped.candidate_key_ids(), vec![KeyId(1)]);
    }

    #[test]
    fn test_roundtrip_through_primary() {
        let (a, b) = (aead(), aead());
        let set = PrimitiveSet::builder()
            .add(entry(1, &a, FramingType::Raw))
            .add_primary(entry(2, &b, FramingType::Raw))
            .build()
            .unwrap();
        let wrapped = wrap(&set).unwrap();

        let ciphertext = wrapped.encrypt_to_vec(b"hello keyset", b"ad").unwrap();
        // Only the primary can read it on its own
        assert_eq!(b.decrypt_to_vec(&ciphertext, b"ad").unwrap(), b"hello keyset");
        assert!(a.decrypt_to_vec(&ciphertext, b"ad").is_err());

        let mut reader = wrapped.open_decrypting_reader(&ciphertext[..], b"ad").unwrap();
        assert_eq!(reader.key_id(), KeyId(2));
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello keyset");
    }

    #[test]
    fn test_seekable_source_decrypts_from_current_position() {
        let (a, b) = (aead(), aead());
        let set = PrimitiveSet::builder()
            .add(entry(1, &a, FramingType::Raw))
            .add_primary(entry(2, &b, FramingType::Raw))
            .build()
            .unwrap();
        let wrapped = wrap(&set).unwrap();

        let ciphertext = a.encrypt_to_vec(&[5u8; 300], b"").unwrap();
        let mut framed = b"envelope".to_vec();
        framed.extend_from_slice(&ciphertext);
        let mut cursor = Cursor::new(framed);
        cursor.set_position(8);

        let mut reader = wrapped.open_seekable_decrypting_reader(cursor, b"").unwrap();
        assert_eq!(reader.key_id(), KeyId(1));
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, vec![5u8; 300]);
    }

    #[test]
    fn test_debug_lists_key_ids() {
        let a = aead();
        let set = PrimitiveSet::builder()
            .add_primary(KeyEntry::raw(KeyId(7), a))
            .build()
            .unwrap();
        let debug = format!("{:?}", wrap(&set).unwrap());
        assert!(debug.contains("KeyId(7)"));
    }
}
