//! Reverse index from media files to the notes that reference them
//!
//! When media changes on disk only the notes referencing the changed files
//! need to be recomputed. The index is built lazily with one full
//! collection scan and then kept current through note additions and
//! evictions.

use crate::cache::lock::CacheLock;
use crate::cache::media_cache::MediaCache;
use crate::cache::size_calculator::SizeCalculator;
use crate::cache::traits::Cache;
use crate::collection::Collection;
use crate::error::Result;
use crate::types::{MediaFile, NoteId};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

type FileIndex = HashMap<MediaFile, HashSet<NoteId>>;

/// Media files that changed on disk and the notes they affect
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatedFiles {
    pub files: HashSet<MediaFile>,
    pub notes: HashSet<NoteId>,
}

#[derive(Default, Serialize, Deserialize)]
struct UpdatedFilesState {
    index: Option<FileIndex>,
}

pub struct UpdatedFilesCalculator {
    collection: Arc<dyn Collection>,
    size_calculator: Arc<SizeCalculator>,
    media_cache: Arc<MediaCache>,
    lock: CacheLock<UpdatedFilesState>,
}

impl UpdatedFilesCalculator {
    pub fn new(
        collection: Arc<dyn Collection>,
        size_calculator: Arc<SizeCalculator>,
        media_cache: Arc<MediaCache>,
    ) -> Self {
        Self {
            collection,
            size_calculator,
            media_cache,
            lock: CacheLock::default(),
        }
    }

    /// Notes referencing `file`, building the index on first use
    pub fn get_notes_using_file(&self, file: &str, use_cache: bool) -> Result<HashSet<NoteId>> {
        let _guard = self.lock.hold();
        self.build_index(use_cache)?;
        Ok(self.lock.read(|state| {
            state
                .index
                .as_ref()
                .and_then(|index| index.get(file))
                .cloned()
                .unwrap_or_default()
        }))
    }

    /// Detect changed media, refresh their cached sizes and report the
    /// notes whose sizes are now stale
    pub fn get_updated_files(&self) -> Result<UpdatedFiles> {
        let _guard = self.lock.hold();
        let files = self.media_cache.get_updated_files();
        if files.is_empty() {
            return Ok(UpdatedFiles::default());
        }

        self.build_index(true)?;
        let mut notes = HashSet::new();
        for file in &files {
            self.media_cache.get_file_size(file, false);
            if let Some(owners) = self
                .lock
                .read(|state| state.index.as_ref().and_then(|index| index.get(file)).cloned())
            {
                notes.extend(owners);
            }
        }

        info!(
            "{} updated media file(s) affect {} note(s)",
            files.len(),
            notes.len()
        );
        Ok(UpdatedFiles { files, notes })
    }

    /// Record the current files of a (re)computed note
    pub fn add_note(&self, note_id: NoteId, files: &HashSet<MediaFile>) {
        self.lock.write(|state| {
            if let Some(index) = state.index.as_mut() {
                remove_note(index, note_id);
                for file in files {
                    index.entry(file.clone()).or_default().insert(note_id);
                }
            }
        });
    }

    /// Scan the collection into the index unless it is already built
    pub fn build_index(&self, use_cache: bool) -> Result<()> {
        let _guard = self.lock.hold();
        if use_cache && self.lock.read(|state| state.index.is_some()) {
            return Ok(());
        }

        let note_ids = self.collection.all_note_ids()?;
        let mut index = FileIndex::new();
        for note_id in &note_ids {
            for file in self.size_calculator.get_note_files(*note_id, use_cache)? {
                index.entry(file).or_default().insert(*note_id);
            }
        }
        debug!(
            "Built media file index: {} file(s) over {} note(s)",
            index.len(),
            note_ids.len()
        );
        self.lock.write(|state| state.index = Some(index));
        Ok(())
    }
}

fn remove_note(index: &mut FileIndex, note_id: NoteId) {
    index.retain(|_, owners| {
        owners.remove(&note_id);
        !owners.is_empty()
    });
}

impl Cache for UpdatedFilesCalculator {
    fn name(&self) -> &'static str {
        "updated_files_calculator"
    }

    fn invalidate(&self) {
        self.lock.reset();
    }

    fn cache_size(&self) -> usize {
        self.lock
            .read(|state| state.index.as_ref().map_or(0, |index| index.len()))
    }

    fn is_initialized(&self) -> bool {
        self.lock.is_initialized()
    }

    fn set_initialized(&self, initialized: bool) {
        self.lock.set_initialized(initialized);
    }

    fn evict_note(&self, note_id: NoteId) {
        self.lock.write(|state| {
            if let Some(index) = state.index.as_mut() {
                remove_note(index, note_id);
            }
        });
    }

    fn export(&self) -> Result<Vec<u8>> {
        self.lock.export_state()
    }

    fn import(&self, data: &[u8]) -> Result<()> {
        self.lock.import_state(data)
    }
}
