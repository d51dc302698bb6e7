//! Proptest generators for property-based testing.

use proptest::prelude::*;

use streamset_segmented::{MAX_SEGMENT_SIZE, MIN_SEGMENT_SIZE};

/// Generate plaintext of at most `max_len` bytes.
pub fn plaintext(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate associated data.
pub fn associated_data() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=32)
}

/// Generate a small valid segment size.
pub fn segment_size() -> impl Strategy<Value = usize> {
    MIN_SEGMENT_SIZE..=(MIN_SEGMENT_SIZE * 16).min(MAX_SEGMENT_SIZE)
}

/// Shape of a keyset for trial tests.
#[derive(Debug, Clone)]
pub struct KeysetShape {
    /// Number of keys.
    pub count: usize,
    /// Index of the primary.
    pub primary: usize,
    /// Index of the key that produced the ciphertext.
    pub source: usize,
}

impl Arbitrary for KeysetShape {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (1usize..=6)
            .prop_flat_map(|count| (Just(count), 0..count, 0..count))
            .prop_map(|(count, primary, source)| KeysetShape {
                count,
                primary,
                source,
            })
            .boxed()
    }
}
