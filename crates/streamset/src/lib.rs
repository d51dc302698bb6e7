//! # Streamset
//!
//! Treats a whole keyset as one streaming AEAD.
//!
//! Encryption always uses the primary key. Ciphertext carries no key id, so
//! decryption tries the keys in keyset order on the same input and commits
//! to the first one that authenticates the opening segment. Rotating the
//! primary therefore never breaks old ciphertexts as long as the old key
//! stays in the keyset.
//!
//! ## Key Types
//!
//! - [`StreamingAeadWrapper`] - Builds the composite from a [`StreamingAeadSet`]
//! - [`WrappedStreamingAead`] - The composite primitive
//! - [`DecryptingReader`] - Plaintext reader bound to the key that matched
//! - [`WrapperConfig`] - Trial order and buffering limits
//!
//! ## Usage
//!
//! ```rust
//! use std::io::Read;
//! use std::sync::Arc;
//! use streamset::core::{KeyEntry, KeyId, PrimitiveSet, StreamingAead, StreamingAeadExt};
//! use streamset_segmented::{SegmentedParams, SegmentedStreamingAead};
//!
//! let old: Arc<dyn StreamingAead> =
//!     Arc::new(SegmentedStreamingAead::generate(SegmentedParams::default()).unwrap());
//! let new: Arc<dyn StreamingAead> =
//!     Arc::new(SegmentedStreamingAead::generate(SegmentedParams::default()).unwrap());
//!
//! // Written before the rotation
//! let archived = old.encrypt_to_vec(b"archived", b"").unwrap();
//!
//! let keyset = PrimitiveSet::builder()
//!     .add(KeyEntry::raw(KeyId(1), old))
//!     .add_primary(KeyEntry::raw(KeyId(2), new))
//!     .build()
//!     .unwrap();
//! let aead = streamset::wrap(&keyset).unwrap();
//!
//! let mut reader = aead.open_decrypting_reader(&archived[..], b"").unwrap();
//! assert_eq!(reader.key_id(), KeyId(1));
//!
//! let mut plaintext = Vec::new();
//! reader.read_to_end(&mut plaintext).unwrap();
//! assert_eq!(plaintext, b"archived");
//! ```

pub mod config;
pub mod rewind;
pub mod trial;
pub mod wrapper;

pub use config::{TrialOrder, WrapperConfig};
pub use rewind::{RewindableReader, SeekRewinder, SharedSource, TrialSource};
pub use trial::DecryptingReader;
pub use wrapper::{wrap, StreamingAeadWrapper, WrappedStreamingAead};

// Re-export core types
pub use streamset_core as core;
pub use streamset_core::{KeyId, Result, StreamError, StreamingAeadSet};
