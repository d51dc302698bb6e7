//! # Streamset Segmented
//!
//! A segmented streaming AEAD built on ChaCha20-Poly1305.
//!
//! ## Format
//!
//! ```text
//! header:   header_len (1) || salt (32) || nonce_prefix (7)
//! segments: ChaCha20-Poly1305(segment_key, nonce_i, plaintext_i)
//! nonce_i:  nonce_prefix (7) || i as u32 big-endian (4) || last flag (1)
//! ```
//!
//! The segment key is derived from the key, the salt and the associated
//! data, so the associated data is authenticated by every segment. Every
//! ciphertext segment is exactly `segment_size` bytes except the last one,
//! which is at least one tag long and carries the last flag in its nonce.
//! Truncating, reordering, extending or modifying the stream fails
//! authentication.
//!
//! A reader consumes at most `header + segment_size + 1` bytes of its source
//! before handing out the first plaintext byte, which keeps trial decryption
//! over many keys cheap.
//!
//! ## Usage
//!
//! ```rust
//! use streamset_core::StreamingAeadExt;
//! use streamset_segmented::{SegmentedParams, SegmentedStreamingAead};
//!
//! let aead = SegmentedStreamingAead::generate(SegmentedParams::default()).unwrap();
//! let ciphertext = aead.encrypt_to_vec(b"hello", b"context").unwrap();
//! let plaintext = aead.decrypt_to_vec(&ciphertext, b"context").unwrap();
//! assert_eq!(plaintext, b"hello");
//! ```

pub mod aead;
pub mod crypto;
pub mod params;
pub mod reader;
pub mod writer;

pub use aead::SegmentedStreamingAead;
pub use crypto::{SegmentedKey, HEADER_LEN, KEY_LEN, NONCE_PREFIX_LEN, SALT_LEN, TAG_LEN};
pub use params::{SegmentedParams, DEFAULT_SEGMENT_SIZE, MAX_SEGMENT_SIZE, MIN_SEGMENT_SIZE};
pub use reader::DecryptingReader;
pub use writer::EncryptingWriter;
