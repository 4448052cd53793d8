//! Whole-collection size summary

use crate::cache::manager::CacheManager;
use crate::collection::Collection;
use crate::error::Result;
use crate::types::{FilesSize, MediaFile, SizeBytes, SizeType};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Breakdown of where a collection's bytes go
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSize {
    /// Field text of every note
    pub texts: SizeBytes,
    /// Distinct media files referenced by at least one note
    pub used_files: FilesSize,
    /// Media files no note references
    pub unused_files: FilesSize,
    /// Referenced files absent from the media directory
    pub missing_files: usize,
    pub total: SizeBytes,
}

pub struct CollectionSizeCalculator {
    collection: Arc<dyn Collection>,
    manager: Arc<CacheManager>,
}

impl CollectionSizeCalculator {
    pub fn new(collection: Arc<dyn Collection>, manager: Arc<CacheManager>) -> Self {
        Self {
            collection,
            manager,
        }
    }

    pub fn collection_size(&self, use_cache: bool) -> Result<CollectionSize> {
        let size_calculator = self.manager.size_calculator();
        let note_ids = self.collection.all_note_ids()?;

        let texts = size_calculator.get_notes_size(&note_ids, SizeType::Texts, use_cache)?;
        let used_files = self
            .manager
            .used_files_calculator()
            .get_used_files_size(use_cache)?;

        let check = self.collection.check_media()?;
        let unused: HashSet<MediaFile> = check.unused.into_iter().collect();
        let unused_files = FilesSize {
            size: size_calculator.unique_files_size(&unused, use_cache),
            count: unused.len(),
        };

        let size = CollectionSize {
            texts,
            used_files,
            unused_files,
            missing_files: check.missing.len(),
            total: texts + used_files.size + unused_files.size,
        };
        debug!("Collection size: {size:?}");
        Ok(size)
    }
}
