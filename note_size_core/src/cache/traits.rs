//! Cache trait definitions
//!
//! This module defines the core Cache trait that all cache implementations must implement.

use crate::error::Result;
use crate::types::NoteId;

/// Trait for every cache registered with the cache manager
pub trait Cache: Send + Sync {
    /// Stable name used as the key in the persisted cache file
    fn name(&self) -> &'static str;

    /// Drop every entry
    fn invalidate(&self);

    /// Number of entries held, summed over all internal maps
    fn cache_size(&self) -> usize;

    /// Whether a full warm-up (or a successful load) populated this cache
    ///
    /// Returns false while another thread holds the cache lock, so a
    /// warm-up in progress reads as "not yet initialized".
    fn is_initialized(&self) -> bool;

    fn set_initialized(&self, initialized: bool);

    /// Remove everything derived from one note; absent ids are a no-op
    fn evict_note(&self, _note_id: NoteId) {}

    /// Serialize the cache state for the persisted cache file
    fn export(&self) -> Result<Vec<u8>>;

    /// Replace the cache state with a previously exported one
    fn import(&self, data: &[u8]) -> Result<()>;
}
