//! Configuration for the keyset wrapper.

use serde::{Deserialize, Serialize};
use streamset_core::{Result, StreamError};

/// Order in which candidate keys are tried during decryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialOrder {
    /// Keyset order, exactly as the entries were added.
    #[default]
    KeysetOrder,
    /// The primary first, then the rest in keyset order.
    PrimaryFirst,
}

/// Configuration for [`StreamingAeadWrapper`](crate::StreamingAeadWrapper).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapperConfig {
    /// Order of trial decryption.
    pub trial_order: TrialOrder,
    /// Whether keys with legacy prefixed framing take part in decryption.
    ///
    /// The primary always does, whatever its framing.
    pub include_prefixed_keys: bool,
    /// Upper bound on the bytes buffered for replay while trying keys.
    pub max_rewind_bytes: usize,
    /// Size of the read used to probe a candidate's first segment.
    pub probe_len: usize,
}

impl WrapperConfig {
    /// Check that the limits are usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_rewind_bytes == 0 {
            return Err(StreamError::InvalidParameters(
                "max_rewind_bytes must be positive".to_string(),
            ));
        }
        if self.probe_len == 0 {
            return Err(StreamError::InvalidParameters(
                "probe_len must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            trial_order: TrialOrder::KeysetOrder,
            include_prefixed_keys: true,
            max_rewind_bytes: 16 << 20,
            probe_len: 8 * 1024,
        }
    }
}
