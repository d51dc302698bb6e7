//! # Streamset Testkit
//!
//! Testing utilities for streamset.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: A bank of segmented keys that can be arranged into keysets
//! - **Readers**: Sources that count, chop up or break the bytes they serve
//! - **Generators**: Proptest strategies for property-based testing
//!
//! ## Test Fixtures
//!
//! ```rust
//! use streamset_testkit::KeysetFixture;
//!
//! let fixture = KeysetFixture::new(3);
//! let keyset = fixture.set_with_primary(2);
//! let ciphertext = fixture.encrypt_with(0, b"written by key 1", b"");
//! assert_eq!(keyset.len(), 3);
//! assert!(!ciphertext.is_empty());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use streamset_testkit::generators::{plaintext, KeysetShape};
//!
//! proptest! {
//!     #[test]
//!     fn any_key_in_the_set_decrypts(shape: KeysetShape, data in plaintext(512)) {
//!         // ...
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{
    foreign_aead, ByteCounter, ChoppyReader, CountingReader, FailingReader, KeysetFixture,
    FIXTURE_SEGMENT_SIZE,
};
pub use generators::{associated_data, plaintext, segment_size, KeysetShape};
