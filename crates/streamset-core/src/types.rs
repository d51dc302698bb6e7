//! Strong type definitions for keyset entries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a key inside a keyset.
///
/// Ids are assigned by whoever produced the keyset. They are not embedded in
/// RAW ciphertexts, which is why decryption has to try candidates.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyId(pub u32);

impl KeyId {
    /// Create a KeyId from its numeric value.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the numeric value.
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", self.0)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for KeyId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Lifecycle status of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStatus {
    /// Usable for encryption (if primary) and decryption.
    Enabled,
    /// Kept in the keyset but never used.
    Disabled,
    /// Key material is gone.
    Destroyed,
}

impl KeyStatus {
    /// Whether entries with this status take part in any operation.
    pub const fn is_enabled(&self) -> bool {
        matches!(self, KeyStatus::Enabled)
    }
}

/// How ciphertexts produced under a key are framed.
///
/// New streaming ciphertexts are always RAW. Keys marked `WithPrefix` come
/// from older keysets and are still accepted for decryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramingType {
    /// No key-identifying prefix.
    Raw,
    /// Legacy framing with a key-identifying prefix.
    WithPrefix,
}

impl FramingType {
    /// Whether this is RAW framing.
    pub const fn is_raw(&self) -> bool {
        matches!(self, FramingType::Raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_id_display() {
        assert_eq!(KeyId::new(42).to_string(), "42");
        assert_eq!(format!("{:?}", KeyId::new(7)), "KeyId(7)");
    }

    #[test]
    fn test_key_status_enabled() {
        assert!(KeyStatus::Enabled.is_enabled());
        assert!(!KeyStatus::Disabled.is_enabled());
        assert!(!KeyStatus::Destroyed.is_enabled());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&FramingType::WithPrefix).unwrap(),
            "\"with_prefix\""
        );
        let status: KeyStatus = serde_json::from_str("\"disabled\"").unwrap();
        assert_eq!(status, KeyStatus::Disabled);
        let id: KeyId = serde_json::from_str("17").unwrap();
        assert_eq!(id, KeyId(17));
    }
}
