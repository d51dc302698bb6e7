//! Key handling and per-segment sealing.
//!
//! Provides the stream key, header generation, segment key derivation and
//! ChaCha20-Poly1305 sealing of individual segments.

use std::fmt;

use chacha20poly1305::{
    aead::{AeadInPlace, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::RngCore;
use streamset_core::{Result, StreamError};
use zeroize::Zeroize;

/// Length of a stream key.
pub const KEY_LEN: usize = 32;

/// Length of the per-stream random salt.
pub const SALT_LEN: usize = 32;

/// Length of the per-stream random nonce prefix.
pub const NONCE_PREFIX_LEN: usize = 7;

/// Length of the Poly1305 tag closing every segment.
pub const TAG_LEN: usize = 16;

/// Length of the stream header.
pub const HEADER_LEN: usize = 1 + SALT_LEN + NONCE_PREFIX_LEN;

const SEGMENT_KEY_CONTEXT: &str = "streamset-segmented-v1 segment key";

/// A 256-bit stream key.
///
/// The key never encrypts directly: each stream derives its own segment key
/// from it. Zeroed on drop.
#[derive(Clone)]
pub struct SegmentedKey([u8; KEY_LEN]);

impl SegmentedKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; KEY_LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            StreamError::InvalidKey(format!(
                "expected {} bytes, got {}",
                KEY_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Derive the segment cipher for one stream.
    pub(crate) fn segment_cipher(&self, header: &StreamHeader, associated_data: &[u8]) -> SegmentCipher {
        let mut hasher = blake3::Hasher::new_derive_key(SEGMENT_KEY_CONTEXT);
        hasher.update(&self.0);
        hasher.update(&header.salt);
        hasher.update(associated_data);
        let mut derived = *hasher.finalize().as_bytes();

        let cipher = ChaCha20Poly1305::new(Key::from_slice(&derived));
        derived.zeroize();

        SegmentCipher {
            cipher,
            nonce_prefix: header.nonce_prefix,
        }
    }
}

impl Drop for SegmentedKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SegmentedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SegmentedKey(..)")
    }
}

/// The random per-stream header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StreamHeader {
    pub salt: [u8; SALT_LEN],
    pub nonce_prefix: [u8; NONCE_PREFIX_LEN],
}

impl StreamHeader {
    /// Generate a fresh header.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut salt = [0u8; SALT_LEN];
        let mut nonce_prefix = [0u8; NONCE_PREFIX_LEN];
        rng.fill_bytes(&mut salt);
        rng.fill_bytes(&mut nonce_prefix);
        Self { salt, nonce_prefix }
    }

    /// Encode to wire bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0] = HEADER_LEN as u8;
        out[1..1 + SALT_LEN].copy_from_slice(&self.salt);
        out[1 + SALT_LEN..].copy_from_slice(&self.nonce_prefix);
        out
    }

    /// Decode from wire bytes.
    pub fn from_bytes(bytes: &[u8; HEADER_LEN]) -> Result<Self> {
        if bytes[0] as usize != HEADER_LEN {
            return Err(StreamError::Decryption(format!(
                "invalid header length byte: {}",
                bytes[0]
            )));
        }
        let mut salt = [0u8; SALT_LEN];
        let mut nonce_prefix = [0u8; NONCE_PREFIX_LEN];
        salt.copy_from_slice(&bytes[1..1 + SALT_LEN]);
        nonce_prefix.copy_from_slice(&bytes[1 + SALT_LEN..]);
        Ok(Self { salt, nonce_prefix })
    }
}

/// Seals and opens the segments of one stream.
pub(crate) struct SegmentCipher {
    cipher: ChaCha20Poly1305,
    nonce_prefix: [u8; NONCE_PREFIX_LEN],
}

impl SegmentCipher {
    fn nonce(&self, counter: u32, last: bool) -> [u8; 12] {
        let mut nonce = [0u8; 12];
        nonce[..NONCE_PREFIX_LEN].copy_from_slice(&self.nonce_prefix);
        nonce[NONCE_PREFIX_LEN..NONCE_PREFIX_LEN + 4].copy_from_slice(&counter.to_be_bytes());
        nonce[11] = u8::from(last);
        nonce
    }

    /// Encrypt `buffer` in place and append the tag.
    pub fn seal_in_place(&self, counter: u32, last: bool, buffer: &mut Vec<u8>) -> Result<()> {
        let nonce = self.nonce(counter, last);
        self.cipher
            .encrypt_in_place(Nonce::from_slice(&nonce), b"", buffer)
            .map_err(|_| StreamError::Encryption(format!("failed to seal segment {counter}")))
    }

    /// Authenticate and decrypt `buffer` in place, removing the tag.
    ///
    /// On failure the buffer content is unspecified and must be discarded.
    pub fn open_in_place(&self, counter: u32, last: bool, buffer: &mut Vec<u8>) -> Result<()> {
        let nonce = self.nonce(counter, last);
        self.cipher
            .decrypt_in_place(Nonce::from_slice(&nonce), b"", buffer)
            .map_err(|_| StreamError::Decryption(format!("segment {counter} failed authentication")))
    }
}
