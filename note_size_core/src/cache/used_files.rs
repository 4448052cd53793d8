//! Collection-wide size of referenced media

use crate::cache::lock::CacheLock;
use crate::cache::size_calculator::SizeCalculator;
use crate::cache::traits::Cache;
use crate::collection::Collection;
use crate::error::Result;
use crate::types::{FilesSize, MediaFile, NoteId};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Default, Serialize, Deserialize)]
struct UsedFilesState {
    used: Option<FilesSize>,
}

/// Aggregates referenced-file sizes over the whole collection
///
/// A file referenced by several notes is counted once. The aggregate is
/// dropped whenever any note is evicted.
pub struct UsedFilesCalculator {
    collection: Arc<dyn Collection>,
    size_calculator: Arc<SizeCalculator>,
    lock: CacheLock<UsedFilesState>,
}

impl UsedFilesCalculator {
    pub fn new(collection: Arc<dyn Collection>, size_calculator: Arc<SizeCalculator>) -> Self {
        Self {
            collection,
            size_calculator,
            lock: CacheLock::default(),
        }
    }

    /// Size and count of the distinct files referenced by any note
    pub fn get_used_files_size(&self, use_cache: bool) -> Result<FilesSize> {
        let _guard = self.lock.hold();
        if use_cache && let Some(used) = self.lock.read(|state| state.used) {
            return Ok(used);
        }

        let files = self.get_used_files(use_cache)?;
        let used = FilesSize {
            size: self.size_calculator.unique_files_size(&files, use_cache),
            count: files.len(),
        };
        debug!("Used files: {} file(s), {} bytes", used.count, used.size);

        self.lock.write(|state| state.used = Some(used));
        Ok(used)
    }

    /// Every media file referenced by at least one note
    pub fn get_used_files(&self, use_cache: bool) -> Result<HashSet<MediaFile>> {
        let note_ids = self.collection.all_note_ids()?;
        self.size_calculator.get_notes_files(&note_ids, use_cache)
    }
}

impl Cache for UsedFilesCalculator {
    fn name(&self) -> &'static str {
        "used_files_calculator"
    }

    fn invalidate(&self) {
        self.lock.reset();
    }

    fn cache_size(&self) -> usize {
        self.lock.read(|state| usize::from(state.used.is_some()))
    }

    fn is_initialized(&self) -> bool {
        self.lock.is_initialized()
    }

    fn set_initialized(&self, initialized: bool) {
        self.lock.set_initialized(initialized);
    }

    fn evict_note(&self, _note_id: NoteId) {
        self.lock.write(|state| state.used = None);
    }

    fn export(&self) -> Result<Vec<u8>> {
        self.lock.export_state()
    }

    fn import(&self, data: &[u8]) -> Result<()> {
        self.lock.import_state(data)
    }
}
