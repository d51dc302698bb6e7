//! The resolved keyset: an ordered set of primitives with one primary.
//!
//! Parsing keysets and turning key material into primitives happens
//! elsewhere. This module only models the result: which primitives exist,
//! in what order, and which of them is primary.

use std::fmt;
use std::sync::Arc;

use crate::error::{Result, StreamError};
use crate::primitive::StreamingAead;
use crate::types::{FramingType, KeyId, KeyStatus};

/// A keyset of streaming AEAD primitives.
pub type StreamingAeadSet = PrimitiveSet<dyn StreamingAead>;

/// A single resolved key.
pub struct KeyEntry<P: ?Sized> {
    key_id: KeyId,
    primitive: Arc<P>,
    framing: FramingType,
    status: KeyStatus,
}

impl<P: ?Sized> KeyEntry<P> {
    /// Create an entry.
    pub fn new(key_id: KeyId, primitive: Arc<P>, framing: FramingType, status: KeyStatus) -> Self {
        Self {
            key_id,
            primitive,
            framing,
            status,
        }
    }

    /// An enabled entry with RAW framing.
    pub fn raw(key_id: KeyId, primitive: Arc<P>) -> Self {
        Self::new(key_id, primitive, FramingType::Raw, KeyStatus::Enabled)
    }

    /// Get the key id.
    pub fn key_id(&self) -> KeyId {
        self.key_id
    }

    /// Get the primitive.
    pub fn primitive(&self) -> &Arc<P> {
        &self.primitive
    }

    /// Get the framing type.
    pub fn framing(&self) -> FramingType {
        self.framing
    }

    /// Get the status.
    pub fn status(&self) -> KeyStatus {
        self.status
    }
}

impl<P: ?Sized> Clone for KeyEntry<P> {
    fn clone(&self) -> Self {
        Self {
            key_id: self.key_id,
            primitive: Arc::clone(&self.primitive),
            framing: self.framing,
            status: self.status,
        }
    }
}

impl<P: ?Sized> fmt::Debug for KeyEntry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyEntry")
            .field("key_id", &self.key_id)
            .field("framing", &self.framing)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// An ordered, immutable set of enabled primitives.
///
/// Entries keep the order in which they were added (keyset order). At most
/// one entry is primary. A set without a primary can be built, but cannot
/// be wrapped into a usable primitive.
pub struct PrimitiveSet<P: ?Sized> {
    entries: Vec<KeyEntry<P>>,
    primary: Option<usize>,
}

impl<P: ?Sized> PrimitiveSet<P> {
    /// Start building a set.
    pub fn builder() -> PrimitiveSetBuilder<P> {
        PrimitiveSetBuilder::new()
    }

    /// All entries in keyset order.
    pub fn entries(&self) -> &[KeyEntry<P>] {
        &self.entries
    }

    /// Iterate over entries in keyset order.
    pub fn iter(&self) -> std::slice::Iter<'_, KeyEntry<P>> {
        self.entries.iter()
    }

    /// The primary entry, if one was designated.
    pub fn primary(&self) -> Option<&KeyEntry<P>> {
        self.primary.and_then(|i| self.entries.get(i))
    }

    /// Position of the primary entry in [`PrimitiveSet::entries`].
    pub fn primary_index(&self) -> Option<usize> {
        self.primary
    }

    /// Entries with the given key id.
    ///
    /// Keysets normally hold unique ids, but nothing here depends on it.
    pub fn entries_for(&self, key_id: KeyId) -> impl Iterator<Item = &KeyEntry<P>> {
        self.entries.iter().filter(move |e| e.key_id == key_id)
    }

    /// Entries with RAW framing.
    pub fn raw_entries(&self) -> impl Iterator<Item = &KeyEntry<P>> {
        self.entries.iter().filter(|e| e.framing.is_raw())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: ?Sized> Clone for PrimitiveSet<P> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            primary: self.primary,
        }
    }
}

impl<P: ?Sized> fmt::Debug for PrimitiveSet<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimitiveSet")
            .field("entries", &self.entries)
            .field("primary", &self.primary().map(KeyEntry::key_id))
            .finish()
    }
}

impl<'s, P: ?Sized> IntoIterator for &'s PrimitiveSet<P> {
    type Item = &'s KeyEntry<P>;
    type IntoIter = std::slice::Iter<'s, KeyEntry<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Builder for [`PrimitiveSet`].
pub struct PrimitiveSetBuilder<P: ?Sized> {
    entries: Vec<(KeyEntry<P>, bool)>,
}

impl<P: ?Sized> PrimitiveSetBuilder<P> {
    /// Start with no entries.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a non-primary entry.
    pub fn add(mut self, entry: KeyEntry<P>) -> Self {
        self.entries.push((entry, false));
        self
    }

    /// Add the primary entry.
    pub fn add_primary(mut self, entry: KeyEntry<P>) -> Self {
        self.entries.push((entry, true));
        self
    }

    /// Build the set.
    ///
    /// Entries that are not enabled are dropped. Fails if more than one
    /// entry is marked primary or if the primary is not enabled.
    pub fn build(self) -> Result<PrimitiveSet<P>> {
        let mut entries = Vec::with_capacity(self.entries.len());
        let mut primary = None;

        for (entry, is_primary) in self.entries {
            if is_primary {
                if primary.is_some() {
                    return Err(StreamError::InvalidKeyset(
                        "more than one primary entry".to_string(),
                    ));
                }
                if !entry.status.is_enabled() {
                    return Err(StreamError::InvalidKeyset(format!(
                        "primary key {} is {:?}",
                        entry.key_id, entry.status
                    )));
                }
                primary = Some(entries.len());
            }

            if !entry.status.is_enabled() {
                tracing::debug!(key_id = %entry.key_id, status = ?entry.status, "skipping key that is not enabled");
                continue;
            }
            entries.push(entry);
        }

        Ok(PrimitiveSet { entries, primary })
    }
}

impl<P: ?Sized> Default for PrimitiveSetBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}
