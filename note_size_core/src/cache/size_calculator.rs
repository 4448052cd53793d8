//! Per-note sizes and referenced media files
//!
//! TEXTS is the UTF-8 byte length of every field, FILES the on-disk size of
//! every media file the note references (each file once per note), and
//! TOTAL their sum. Values are cached per note and are not refreshed on
//! edit: callers that know a note changed pass `use_cache = false` or evict.
//!
//! Aggregates over several notes must not add per-note FILES sizes, since a
//! file shared by N notes would be charged N times. They go through
//! [`SizeCalculator::unique_files_size`] instead.

use crate::cache::lock::CacheLock;
use crate::cache::media_cache::MediaCache;
use crate::cache::traits::Cache;
use crate::collection::Collection;
use crate::error::Result;
use crate::types::{MediaFile, Note, NoteId, SizeBytes, SizeType};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Default, Serialize, Deserialize)]
struct CalculatorState {
    sizes: HashMap<SizeType, HashMap<NoteId, SizeBytes>>,
    files: HashMap<NoteId, HashSet<MediaFile>>,
    file_sizes: HashMap<NoteId, HashMap<MediaFile, SizeBytes>>,
}

/// Multi-level per-note size cache
pub struct SizeCalculator {
    collection: Arc<dyn Collection>,
    media_cache: Arc<MediaCache>,
    lock: CacheLock<CalculatorState>,
}

impl SizeCalculator {
    pub fn new(collection: Arc<dyn Collection>, media_cache: Arc<MediaCache>) -> Self {
        Self {
            collection,
            media_cache,
            lock: CacheLock::default(),
        }
    }

    /// Size of a note by id, fetching it from the host only on a miss
    pub fn get_note_size(
        &self,
        note_id: NoteId,
        size_type: SizeType,
        use_cache: bool,
    ) -> Result<SizeBytes> {
        let _guard = self.lock.hold();
        if use_cache && let Some(size) = self.cached_size(note_id, size_type) {
            return Ok(size);
        }
        let note = self.collection.get_note(note_id)?;
        Ok(self.calculate_note_size(&note, size_type, use_cache))
    }

    pub fn calculate_note_size(
        &self,
        note: &Note,
        size_type: SizeType,
        use_cache: bool,
    ) -> SizeBytes {
        let _guard = self.lock.hold();
        if use_cache && let Some(size) = self.cached_size(note.id, size_type) {
            return size;
        }

        let size = match size_type {
            SizeType::Texts => note
                .fields
                .iter()
                .map(|field| SizeBytes(field.len() as u64))
                .sum(),
            SizeType::Files => self
                .calculate_note_file_sizes(note, use_cache)
                .into_values()
                .sum(),
            SizeType::Total => {
                self.calculate_note_size(note, SizeType::Texts, use_cache)
                    + self.calculate_note_size(note, SizeType::Files, use_cache)
            }
        };

        self.lock.write(|state| {
            state
                .sizes
                .entry(size_type)
                .or_default()
                .insert(note.id, size)
        });
        size
    }

    pub fn get_note_files(&self, note_id: NoteId, use_cache: bool) -> Result<HashSet<MediaFile>> {
        let _guard = self.lock.hold();
        if use_cache
            && let Some(files) = self.lock.read(|state| state.files.get(&note_id).cloned())
        {
            return Ok(files);
        }
        let note = self.collection.get_note(note_id)?;
        Ok(self.calculate_note_files(&note, use_cache))
    }

    /// Union of the media references of every field of the note
    pub fn calculate_note_files(&self, note: &Note, use_cache: bool) -> HashSet<MediaFile> {
        let _guard = self.lock.hold();
        if use_cache
            && let Some(files) = self.lock.read(|state| state.files.get(&note.id).cloned())
        {
            return files;
        }

        let files: HashSet<MediaFile> = note
            .fields
            .iter()
            .flat_map(|field| self.collection.files_in_str(field))
            .collect();

        self.lock
            .write(|state| state.files.insert(note.id, files.clone()));
        files
    }

    pub fn get_note_file_sizes(
        &self,
        note_id: NoteId,
        use_cache: bool,
    ) -> Result<HashMap<MediaFile, SizeBytes>> {
        let _guard = self.lock.hold();
        if use_cache
            && let Some(sizes) = self.lock.read(|state| state.file_sizes.get(&note_id).cloned())
        {
            return Ok(sizes);
        }
        let note = self.collection.get_note(note_id)?;
        Ok(self.calculate_note_file_sizes(&note, use_cache))
    }

    /// Size of each file the note references; missing files are zero
    pub fn calculate_note_file_sizes(
        &self,
        note: &Note,
        use_cache: bool,
    ) -> HashMap<MediaFile, SizeBytes> {
        let _guard = self.lock.hold();
        if use_cache
            && let Some(sizes) = self.lock.read(|state| state.file_sizes.get(&note.id).cloned())
        {
            return sizes;
        }

        let sizes: HashMap<MediaFile, SizeBytes> = self
            .calculate_note_files(note, use_cache)
            .into_iter()
            .map(|file| {
                let size = self.media_cache.get_file_size(&file, use_cache);
                (file, size)
            })
            .collect();

        self.lock
            .write(|state| state.file_sizes.insert(note.id, sizes.clone()));
        sizes
    }

    /// Union of the referenced files of several notes
    pub fn get_notes_files(
        &self,
        note_ids: &[NoteId],
        use_cache: bool,
    ) -> Result<HashSet<MediaFile>> {
        let mut files = HashSet::new();
        for note_id in note_ids {
            files.extend(self.get_note_files(*note_id, use_cache)?);
        }
        Ok(files)
    }

    /// Combined size of several notes, charging every shared file once
    pub fn get_notes_size(
        &self,
        note_ids: &[NoteId],
        size_type: SizeType,
        use_cache: bool,
    ) -> Result<SizeBytes> {
        match size_type {
            SizeType::Texts => {
                let mut total = SizeBytes::ZERO;
                for note_id in note_ids {
                    total += self.get_note_size(*note_id, SizeType::Texts, use_cache)?;
                }
                Ok(total)
            }
            SizeType::Files => {
                let files = self.get_notes_files(note_ids, use_cache)?;
                Ok(self.unique_files_size(&files, use_cache))
            }
            SizeType::Total => Ok(self.get_notes_size(note_ids, SizeType::Texts, use_cache)?
                + self.get_notes_size(note_ids, SizeType::Files, use_cache)?),
        }
    }

    /// Sum of the sizes of a set of distinct files
    ///
    /// The one place collection-wide file sizes are added up; every
    /// aggregate (selected notes, used files, collection summary) calls it.
    pub fn unique_files_size<'a, I>(&self, files: I, use_cache: bool) -> SizeBytes
    where
        I: IntoIterator<Item = &'a MediaFile>,
    {
        files
            .into_iter()
            .map(|file| self.media_cache.get_file_size(file, use_cache))
            .sum()
    }

    fn cached_size(&self, note_id: NoteId, size_type: SizeType) -> Option<SizeBytes> {
        self.lock.read(|state| {
            state
                .sizes
                .get(&size_type)
                .and_then(|sizes| sizes.get(&note_id))
                .copied()
        })
    }
}

impl Cache for SizeCalculator {
    fn name(&self) -> &'static str {
        "size_calculator"
    }

    fn invalidate(&self) {
        self.lock.reset();
    }

    fn cache_size(&self) -> usize {
        self.lock.read(|state| {
            state.sizes.values().map(|sizes| sizes.len()).sum::<usize>()
                + state.files.len()
                + state.file_sizes.len()
        })
    }

    fn is_initialized(&self) -> bool {
        self.lock.is_initialized()
    }

    fn set_initialized(&self, initialized: bool) {
        self.lock.set_initialized(initialized);
    }

    fn evict_note(&self, note_id: NoteId) {
        self.lock.write(|state| {
            for sizes in state.sizes.values_mut() {
                sizes.remove(&note_id);
            }
            state.files.remove(&note_id);
            state.file_sizes.remove(&note_id);
        });
        debug!("Evicted note {note_id} from size calculator");
    }

    fn export(&self) -> Result<Vec<u8>> {
        self.lock.export_state()
    }

    fn import(&self, data: &[u8]) -> Result<()> {
        self.lock.import_state(data)
    }
}
