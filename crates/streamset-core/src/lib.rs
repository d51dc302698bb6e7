//! # Streamset Core
//!
//! Pure building blocks shared by every streamset crate: the keyset model,
//! the streaming AEAD trait seams, and the error type.
//!
//! This crate performs no cryptography and no I/O of its own. Concrete
//! ciphers implement [`StreamingAead`]; the composite in the `streamset`
//! crate consumes a [`PrimitiveSet`] of them.
//!
//! ## Key Types
//!
//! - [`KeyId`] - Identifier of a key inside a keyset
//! - [`KeyEntry`] - A resolved primitive together with its id, framing and status
//! - [`PrimitiveSet`] - Ordered, immutable collection of entries with one primary
//! - [`StreamingAead`] - Opens encrypting writers and decrypting readers
//! - [`StreamError`] - Every failure the workspace can report

pub mod error;
pub mod keyset;
pub mod primitive;
pub mod types;

pub use error::{Result, StreamError};
pub use keyset::{KeyEntry, PrimitiveSet, PrimitiveSetBuilder, StreamingAeadSet};
pub use primitive::{
    BoxedRead, BoxedWrite, EncryptingWrite, PrimitiveWrapper, StreamingAead, StreamingAeadExt,
};
pub use types::{FramingType, KeyId, KeyStatus};
