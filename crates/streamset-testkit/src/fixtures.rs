//! Test fixtures and helpers.
//!
//! Common setup code for keyset tests: a bank of segmented keys that can be
//! arranged into keysets, and readers that count, split or break the bytes
//! they hand out.

use std::io::{self, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use streamset_core::{
    FramingType, KeyEntry, KeyId, KeyStatus, PrimitiveSet, StreamingAead, StreamingAeadExt,
    StreamingAeadSet,
};
use streamset_segmented::{SegmentedKey, SegmentedParams, SegmentedStreamingAead};

/// Segment size used by fixtures unless told otherwise.
///
/// Small enough that a few hundred bytes span several segments.
pub const FIXTURE_SEGMENT_SIZE: usize = 64;

/// A bank of independent segmented keys.
///
/// Key `i` gets id `i + 1` in every keyset built from the fixture.
pub struct KeysetFixture {
    params: SegmentedParams,
    keys: Vec<Arc<SegmentedStreamingAead>>,
}

impl KeysetFixture {
    /// Create `count` random keys with the fixture segment size.
    pub fn new(count: usize) -> Self {
        Self::with_segment_size(count, FIXTURE_SEGMENT_SIZE)
    }

    /// Create `count` random keys with the given segment size.
    pub fn with_segment_size(count: usize, segment_size: usize) -> Self {
        let params = SegmentedParams::new(segment_size).expect("fixture segment size is valid");
        let keys = (0..count)
            .map(|_| Arc::new(aead_from_key(SegmentedKey::generate(), params)))
            .collect();
        Self { params, keys }
    }

    /// Create `count` keys derived deterministically from `seed`.
    pub fn with_seed(count: usize, seed: u64) -> Self {
        let params =
            SegmentedParams::new(FIXTURE_SEGMENT_SIZE).expect("fixture segment size is valid");
        let mut rng = StdRng::seed_from_u64(seed);
        let keys = (0..count)
            .map(|_| {
                let mut bytes = [0u8; 32];
                rng.fill_bytes(&mut bytes);
                Arc::new(aead_from_key(SegmentedKey::from_bytes(bytes), params))
            })
            .collect();
        Self { params, keys }
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the fixture holds no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Segment parameters shared by every key.
    pub fn params(&self) -> SegmentedParams {
        self.params
    }

    /// Id of key `index`.
    pub fn key_id(&self, index: usize) -> KeyId {
        KeyId(index as u32 + 1)
    }

    /// Key `index` as a trait object.
    pub fn aead(&self, index: usize) -> Arc<dyn StreamingAead> {
        self.keys[index].clone()
    }

    /// Encrypt with key `index` alone.
    pub fn encrypt_with(&self, index: usize, plaintext: &[u8], associated_data: &[u8]) -> Vec<u8> {
        self.keys[index]
            .encrypt_to_vec(plaintext, associated_data)
            .expect("fixture encryption succeeds")
    }

    /// All keys, RAW, with key `primary` as primary.
    pub fn set_with_primary(&self, primary: usize) -> StreamingAeadSet {
        self.set_with_legacy(primary, &[])
    }

    /// All keys with key `primary` as primary; the keys in `legacy` use the
    /// prefixed framing.
    pub fn set_with_legacy(&self, primary: usize, legacy: &[usize]) -> StreamingAeadSet {
        let mut builder = PrimitiveSet::builder();
        for index in 0..self.keys.len() {
            let framing = if legacy.contains(&index) {
                FramingType::WithPrefix
            } else {
                FramingType::Raw
            };
            let entry = self.entry(index, framing, KeyStatus::Enabled);
            builder = if index == primary {
                builder.add_primary(entry)
            } else {
                builder.add(entry)
            };
        }
        builder.build().expect("fixture keyset is valid")
    }

    /// All keys, RAW, none of them primary.
    pub fn set_without_primary(&self) -> StreamingAeadSet {
        let mut builder = PrimitiveSet::builder();
        for index in 0..self.keys.len() {
            builder = builder.add(self.entry(index, FramingType::Raw, KeyStatus::Enabled));
        }
        builder.build().expect("fixture keyset is valid")
    }

    /// Entry for key `index`.
    pub fn entry(
        &self,
        index: usize,
        framing: FramingType,
        status: KeyStatus,
    ) -> KeyEntry<dyn StreamingAead> {
        KeyEntry::new(self.key_id(index), self.aead(index), framing, status)
    }
}

/// A key that belongs to no fixture.
pub fn foreign_aead(params: SegmentedParams) -> Arc<dyn StreamingAead> {
    Arc::new(aead_from_key(SegmentedKey::generate(), params))
}

fn aead_from_key(key: SegmentedKey, params: SegmentedParams) -> SegmentedStreamingAead {
    SegmentedStreamingAead::new(key, params).expect("fixture parameters are valid")
}

/// Shared view of the bytes a [`CountingReader`] handed out.
#[derive(Debug, Clone, Default)]
pub struct ByteCounter(Arc<AtomicUsize>);

impl ByteCounter {
    /// Bytes read so far.
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counts the bytes read from the inner reader.
pub struct CountingReader<R> {
    inner: R,
    counter: ByteCounter,
}

impl<R: Read> CountingReader<R> {
    /// Wrap `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            counter: ByteCounter::default(),
        }
    }

    /// A handle that stays valid after the reader moves.
    pub fn counter(&self) -> ByteCounter {
        self.counter.clone()
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.counter.0.fetch_add(n, Ordering::SeqCst);
        Ok(n)
    }
}

/// Serves `data`, then fails every read with `kind`.
pub struct FailingReader {
    data: Vec<u8>,
    pos: usize,
    kind: io::ErrorKind,
}

impl FailingReader {
    /// Serve `data` and then fail.
    pub fn new(data: impl Into<Vec<u8>>, kind: io::ErrorKind) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            kind,
        }
    }
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = &self.data[self.pos..];
        if available.is_empty() {
            return Err(io::Error::new(self.kind, "injected failure"));
        }
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}

/// Hands out at most `chunk` bytes per read and reports `Interrupted`
/// before every other read.
pub struct ChoppyReader<R> {
    inner: R,
    chunk: usize,
    interrupt_next: bool,
}

impl<R: Read> ChoppyReader<R> {
    /// Wrap `inner`; `chunk` must be positive.
    pub fn new(inner: R, chunk: usize) -> Self {
        Self {
            inner,
            chunk: chunk.max(1),
            interrupt_next: true,
        }
    }
}

impl<R: Read> Read for ChoppyReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.interrupt_next {
            self.interrupt_next = false;
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }
        self.interrupt_next = true;
        let n = buf.len().min(self.chunk);
        self.inner.read(&mut buf[..n])
    }
}
