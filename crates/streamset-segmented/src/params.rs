//! Segment size parameters.

use serde::{Deserialize, Serialize};
use streamset_core::{Result, StreamError};

use crate::crypto::TAG_LEN;

/// Default ciphertext segment size (4 KiB).
pub const DEFAULT_SEGMENT_SIZE: usize = 4096;

/// Smallest accepted ciphertext segment size.
pub const MIN_SEGMENT_SIZE: usize = 64;

/// Largest accepted ciphertext segment size (8 MiB).
pub const MAX_SEGMENT_SIZE: usize = 8 << 20;

/// Parameters of the segmented cipher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentedParams {
    /// Size of every ciphertext segment except the last, tag included.
    pub segment_size: usize,
}

impl SegmentedParams {
    /// Create validated parameters.
    pub fn new(segment_size: usize) -> Result<Self> {
        let params = Self { segment_size };
        params.validate()?;
        Ok(params)
    }

    /// Check that the segment size is in range.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_SEGMENT_SIZE..=MAX_SEGMENT_SIZE).contains(&self.segment_size) {
            return Err(StreamError::InvalidParameters(format!(
                "segment size {} outside {}..={}",
                self.segment_size, MIN_SEGMENT_SIZE, MAX_SEGMENT_SIZE
            )));
        }
        Ok(())
    }

    /// Plaintext bytes carried by a full segment.
    pub fn plaintext_segment_size(&self) -> usize {
        self.segment_size - TAG_LEN
    }

    /// Exact ciphertext length for a plaintext of `plaintext_len` bytes.
    pub fn ciphertext_len(&self, plaintext_len: u64) -> u64 {
        let per_segment = self.plaintext_segment_size() as u64;
        // The final segment always exists, even when it carries nothing
        let segments = if plaintext_len == 0 {
            1
        } else {
            plaintext_len.div_ceil(per_segment)
        };
        crate::crypto::HEADER_LEN as u64 + plaintext_len + segments * TAG_LEN as u64
    }
}

impl Default for SegmentedParams {
    fn default() -> Self {
        Self {
            segment_size: DEFAULT_SEGMENT_SIZE,
        }
    }
}
