//! Facade the UI layers talk to
//!
//! Owns the cache set, the persisted cache file and at most one background
//! warm-up. Also subscribes to host notifications to keep the caches
//! consistent with out-of-band collection changes.

use crate::cache::initializer::{CacheInitializer, WarmUpHandle, WarmUpOutcome, WarmUpState};
use crate::cache::manager::CacheManager;
use crate::cache::storage::CacheStorage;
use crate::collection::Collection;
use crate::collection_size::{CollectionSize, CollectionSizeCalculator};
use crate::config::{CacheConfig, FormatConfig};
use crate::error::{InternalError, Result};
use crate::events::CollectionEvents;
use crate::progress::ProgressProvider;
use crate::types::{CardId, FileType, FilesSize, MediaFile, Note, NoteId, SizeBytes, SizeType};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub cache: CacheConfig,
    pub format: FormatConfig,
    /// Full path of the persisted cache file
    pub cache_file: PathBuf,
}

/// What `startup` did to get the caches going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupMode {
    /// Caches were restored from the persisted file; when that file came
    /// from a finished warm-up and warm-up is enabled no new walk is started
    LoadedFromFile,
    /// A background warm-up was started
    WarmingUp,
    /// Caches fill lazily on first query
    Lazy,
}

/// One referenced file of a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteFile {
    pub name: MediaFile,
    pub size: SizeBytes,
    pub file_type: FileType,
    pub missing: bool,
}

pub struct NoteSizeService {
    collection: Arc<dyn Collection>,
    manager: Arc<CacheManager>,
    storage: CacheStorage,
    initializer: CacheInitializer,
    collection_size: CollectionSizeCalculator,
    config: ServiceConfig,
    warm_up: Mutex<Option<WarmUpHandle>>,
    last_warm_up: Mutex<WarmUpState>,
}

impl NoteSizeService {
    pub fn new(collection: Arc<dyn Collection>, config: ServiceConfig) -> Self {
        let manager = Arc::new(CacheManager::new(
            Arc::clone(&collection),
            config.format.precision,
        ));
        let initializer =
            CacheInitializer::new(Arc::clone(&manager), Arc::clone(&collection), &config.cache);
        let collection_size =
            CollectionSizeCalculator::new(Arc::clone(&collection), Arc::clone(&manager));

        Self {
            storage: CacheStorage::new(config.cache_file.clone()),
            collection,
            manager,
            initializer,
            collection_size,
            config,
            warm_up: Mutex::new(None),
            last_warm_up: Mutex::new(WarmUpState::Idle),
        }
    }

    pub fn manager(&self) -> &Arc<CacheManager> {
        &self.manager
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Restore persisted caches, and warm up unless they were fully initialized
    pub fn startup(&self, progress: Arc<dyn ProgressProvider>) -> Result<StartupMode> {
        let loaded = self.config.cache.store_cache_in_file_enabled && self.restore_from_file();
        if loaded && self.is_initialized() {
            return Ok(StartupMode::LoadedFromFile);
        }

        if self.config.cache.warmup_enabled {
            self.warm_up(progress)?;
            return Ok(StartupMode::WarmingUp);
        }

        Ok(if loaded {
            StartupMode::LoadedFromFile
        } else {
            StartupMode::Lazy
        })
    }

    /// Stop any warm-up and persist the caches if enabled
    pub fn shutdown(&self) {
        self.cancel_warm_up();
        self.wait_for_warm_up();
        if self.config.cache.store_cache_in_file_enabled {
            self.save_to_file();
        }
    }

    /// Start a background warm-up; fails if one is already running
    pub fn warm_up(&self, progress: Arc<dyn ProgressProvider>) -> Result<()> {
        let mut slot = self.warm_up.lock();
        if let Some(handle) = slot.as_ref()
            && !handle.is_finished()
        {
            return Err(InternalError::WarmUpRunning.into());
        }
        if let Some(finished) = slot.take() {
            self.record_outcome(&finished.join());
        }

        *slot = Some(self.initializer.spawn(progress)?);
        *self.last_warm_up.lock() = WarmUpState::Running;
        Ok(())
    }

    /// Block until the current warm-up ends; `None` if none was started
    pub fn wait_for_warm_up(&self) -> Option<Result<WarmUpOutcome>> {
        let handle = self.warm_up.lock().take()?;
        let result = handle.join();
        self.record_outcome(&result);
        Some(result)
    }

    pub fn cancel_warm_up(&self) {
        if let Some(handle) = self.warm_up.lock().as_ref() {
            handle.cancel();
        }
    }

    pub fn warm_up_state(&self) -> WarmUpState {
        match self.warm_up.lock().as_ref() {
            // A walk that panicked never got to record its state
            Some(handle) if handle.is_finished() && handle.state() == WarmUpState::Running => {
                WarmUpState::Failed
            }
            Some(handle) => handle.state(),
            None => *self.last_warm_up.lock(),
        }
    }

    /// Drop every cached value and the cache file, then warm up again
    pub fn refresh(&self, progress: Arc<dyn ProgressProvider>) -> Result<()> {
        self.cancel_warm_up();
        self.wait_for_warm_up();
        self.clear();
        self.warm_up(progress)
    }

    /// Drop every cached value and the cache file
    pub fn clear(&self) {
        self.manager.invalidate_all();
        self.storage.delete();
    }

    pub fn save_to_file(&self) -> bool {
        self.storage.save(&self.manager.caches())
    }

    /// Replace the caches with the file's contents, initialized flags included
    pub fn load_from_file(&self) -> bool {
        self.storage.load(&self.manager.caches())
    }

    /// Load the cache file, then re-stat media changed since it was written
    pub fn restore_from_file(&self) -> bool {
        if !self.load_from_file() {
            return false;
        }
        if let Err(e) = self.refresh_updated_media() {
            warn!("Could not check media for changes after loading cache: {e}");
        }
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.manager.is_initialized()
    }

    pub fn get_note_size(
        &self,
        note_id: NoteId,
        size_type: SizeType,
        use_cache: bool,
    ) -> Result<SizeBytes> {
        self.manager
            .size_calculator()
            .get_note_size(note_id, size_type, use_cache)
    }

    pub fn get_note_size_str(
        &self,
        note_id: NoteId,
        size_type: SizeType,
        use_cache: bool,
    ) -> Result<String> {
        self.manager
            .size_str_cache()
            .get_note_size_str(note_id, size_type, use_cache)
    }

    /// Size of the note owning `card_id`
    pub fn get_note_size_by_card(
        &self,
        card_id: CardId,
        size_type: SizeType,
        use_cache: bool,
    ) -> Result<SizeBytes> {
        let note_id = self.manager.item_id_cache().get_note_id_by_card_id(card_id)?;
        self.get_note_size(note_id, size_type, use_cache)
    }

    pub fn get_note_id_by_card(&self, card_id: CardId) -> Result<NoteId> {
        self.manager.item_id_cache().get_note_id_by_card_id(card_id)
    }

    /// Combined size of several notes, each shared file counted once
    pub fn get_notes_size(
        &self,
        note_ids: &[NoteId],
        size_type: SizeType,
        use_cache: bool,
    ) -> Result<SizeBytes> {
        self.manager
            .size_calculator()
            .get_notes_size(note_ids, size_type, use_cache)
    }

    pub fn get_note_files(&self, note_id: NoteId, use_cache: bool) -> Result<HashSet<MediaFile>> {
        self.manager
            .size_calculator()
            .get_note_files(note_id, use_cache)
    }

    /// Referenced files with size and type, largest first
    pub fn get_note_file_details(&self, note_id: NoteId, use_cache: bool) -> Result<Vec<NoteFile>> {
        let sizes = self
            .manager
            .size_calculator()
            .get_note_file_sizes(note_id, use_cache)?;
        let media_cache = self.manager.media_cache();
        let file_types = self.manager.file_type_helper();

        let mut files: Vec<NoteFile> = sizes
            .into_iter()
            .map(|(name, size)| NoteFile {
                file_type: file_types.get_file_type(&name, use_cache),
                missing: media_cache.is_missing(&name, true),
                name,
                size,
            })
            .collect();
        files.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.name.cmp(&b.name)));
        Ok(files)
    }

    pub fn get_used_files_size(&self, use_cache: bool) -> Result<FilesSize> {
        self.manager
            .used_files_calculator()
            .get_used_files_size(use_cache)
    }

    pub fn collection_size(&self, use_cache: bool) -> Result<CollectionSize> {
        self.collection_size.collection_size(use_cache)
    }

    pub fn evict_note(&self, note_id: NoteId) {
        self.manager.evict_note(note_id);
    }

    /// Evict a note and recompute everything derived from its current state
    pub fn refresh_note(&self, note_id: NoteId) -> Result<()> {
        self.manager.evict_note(note_id);
        let note = self.collection.get_note(note_id)?;
        self.populate_note(&note);
        Ok(())
    }

    /// Re-stat media changed on disk and refresh the notes referencing it
    ///
    /// Returns the number of notes refreshed.
    pub fn refresh_updated_media(&self) -> Result<usize> {
        let updated = self
            .manager
            .updated_files_calculator()
            .get_updated_files()?;

        let mut refreshed = 0;
        for note_id in updated.notes {
            match self.refresh_note(note_id) {
                Ok(()) => refreshed += 1,
                Err(e) if e.is_not_found() => {
                    debug!("Note {note_id} referencing updated media is gone");
                }
                Err(e) => return Err(e),
            }
        }
        if refreshed > 0 {
            info!("Refreshed {refreshed} note(s) after media changes");
        }
        Ok(refreshed)
    }

    fn populate_note(&self, note: &Note) {
        let size_str_cache = self.manager.size_str_cache();
        size_str_cache.calculate_note_size_str(note, SizeType::Total, false);
        for size_type in [SizeType::Texts, SizeType::Files] {
            size_str_cache.calculate_note_size_str(note, size_type, true);
        }

        let files = self
            .manager
            .size_calculator()
            .calculate_note_files(note, true);
        for file in &files {
            self.manager.file_type_helper().get_file_type(file, true);
        }
        self.manager
            .updated_files_calculator()
            .add_note(note.id, &files);
    }

    fn record_outcome(&self, result: &Result<WarmUpOutcome>) {
        let state = match result {
            Ok(WarmUpOutcome::Completed) => WarmUpState::Completed,
            Ok(WarmUpOutcome::Cancelled) => WarmUpState::Cancelled,
            Err(_) => WarmUpState::Failed,
        };
        *self.last_warm_up.lock() = state;
    }
}

impl CollectionEvents for NoteSizeService {
    fn on_note_added(&self, note: &Note) {
        self.manager.evict_note(note.id);
        self.populate_note(note);
    }

    fn on_notes_will_be_deleted(&self, note_ids: &[NoteId]) {
        for note_id in note_ids {
            self.manager.evict_note(*note_id);
        }
    }

    fn on_media_sync_started(&self) {
        debug!("Media sync started");
    }

    fn on_media_sync_finished(&self) {
        if let Err(e) = self.refresh_updated_media() {
            warn!("Failed to refresh notes after media sync: {e}");
        }
    }
}
