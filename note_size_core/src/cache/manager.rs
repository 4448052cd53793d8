//! Registry of every cache instance
//!
//! Caches are instance-owned and wired together here by explicit
//! composition. Eviction fans out sequentially; there is no cross-cache
//! transaction.

use crate::cache::file_type_helper::FileTypeHelper;
use crate::cache::item_id_cache::ItemIdCache;
use crate::cache::media_cache::MediaCache;
use crate::cache::size_calculator::SizeCalculator;
use crate::cache::size_formatter::SizeFormatter;
use crate::cache::size_str_cache::SizeStrCache;
use crate::cache::traits::Cache;
use crate::cache::updated_files::UpdatedFilesCalculator;
use crate::cache::used_files::UsedFilesCalculator;
use crate::collection::Collection;
use crate::types::NoteId;
use log::{debug, info};
use std::sync::Arc;

pub struct CacheManager {
    media_cache: Arc<MediaCache>,
    size_calculator: Arc<SizeCalculator>,
    size_formatter: Arc<SizeFormatter>,
    size_str_cache: Arc<SizeStrCache>,
    file_type_helper: Arc<FileTypeHelper>,
    item_id_cache: Arc<ItemIdCache>,
    used_files_calculator: Arc<UsedFilesCalculator>,
    updated_files_calculator: Arc<UpdatedFilesCalculator>,
}

impl CacheManager {
    /// Build the full cache set over one collection
    pub fn new(collection: Arc<dyn Collection>, precision: u8) -> Self {
        let media_cache = Arc::new(MediaCache::new(collection.media_dir()));
        let size_calculator = Arc::new(SizeCalculator::new(
            Arc::clone(&collection),
            Arc::clone(&media_cache),
        ));
        let size_formatter = Arc::new(SizeFormatter::new());
        let size_str_cache = Arc::new(SizeStrCache::new(
            Arc::clone(&size_calculator),
            Arc::clone(&size_formatter),
            precision,
        ));
        let used_files_calculator = Arc::new(UsedFilesCalculator::new(
            Arc::clone(&collection),
            Arc::clone(&size_calculator),
        ));
        let updated_files_calculator = Arc::new(UpdatedFilesCalculator::new(
            Arc::clone(&collection),
            Arc::clone(&size_calculator),
            Arc::clone(&media_cache),
        ));

        Self {
            media_cache,
            size_calculator,
            size_formatter,
            size_str_cache,
            file_type_helper: Arc::new(FileTypeHelper::new()),
            item_id_cache: Arc::new(ItemIdCache::new(collection)),
            used_files_calculator,
            updated_files_calculator,
        }
    }

    pub fn media_cache(&self) -> &Arc<MediaCache> {
        &self.media_cache
    }

    pub fn size_calculator(&self) -> &Arc<SizeCalculator> {
        &self.size_calculator
    }

    pub fn size_formatter(&self) -> &Arc<SizeFormatter> {
        &self.size_formatter
    }

    pub fn size_str_cache(&self) -> &Arc<SizeStrCache> {
        &self.size_str_cache
    }

    pub fn file_type_helper(&self) -> &Arc<FileTypeHelper> {
        &self.file_type_helper
    }

    pub fn item_id_cache(&self) -> &Arc<ItemIdCache> {
        &self.item_id_cache
    }

    pub fn used_files_calculator(&self) -> &Arc<UsedFilesCalculator> {
        &self.used_files_calculator
    }

    pub fn updated_files_calculator(&self) -> &Arc<UpdatedFilesCalculator> {
        &self.updated_files_calculator
    }

    /// Every registered cache, in persistence order
    pub fn caches(&self) -> Vec<Arc<dyn Cache>> {
        vec![
            Arc::clone(&self.media_cache) as Arc<dyn Cache>,
            Arc::clone(&self.size_calculator) as Arc<dyn Cache>,
            Arc::clone(&self.size_formatter) as Arc<dyn Cache>,
            Arc::clone(&self.size_str_cache) as Arc<dyn Cache>,
            Arc::clone(&self.file_type_helper) as Arc<dyn Cache>,
            Arc::clone(&self.item_id_cache) as Arc<dyn Cache>,
            Arc::clone(&self.used_files_calculator) as Arc<dyn Cache>,
            Arc::clone(&self.updated_files_calculator) as Arc<dyn Cache>,
        ]
    }

    pub fn invalidate_all(&self) {
        for cache in self.caches() {
            cache.invalidate();
        }
        info!("Invalidated all caches");
    }

    pub fn set_all_initialized(&self, initialized: bool) {
        for cache in self.caches() {
            cache.set_initialized(initialized);
        }
        debug!("Marked all caches initialized={initialized}");
    }

    /// True only when every cache is initialized and none is busy
    pub fn is_initialized(&self) -> bool {
        self.caches().iter().all(|cache| cache.is_initialized())
    }

    /// Total number of entries across all caches; a diagnostic, not bytes
    pub fn aggregate_size(&self) -> usize {
        self.caches().iter().map(|cache| cache.cache_size()).sum()
    }

    /// Per-cache entry counts
    pub fn cache_sizes(&self) -> Vec<(&'static str, usize)> {
        self.caches()
            .iter()
            .map(|cache| (cache.name(), cache.cache_size()))
            .collect()
    }

    /// Drop everything derived from `note_id` in every cache
    pub fn evict_note(&self, note_id: NoteId) {
        for cache in self.caches() {
            cache.evict_note(note_id);
        }
        debug!("Evicted note {note_id} from all caches");
    }
}
