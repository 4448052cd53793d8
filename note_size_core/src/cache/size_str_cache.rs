//! Formatted note sizes as shown in list columns and editor buttons

use crate::cache::lock::CacheLock;
use crate::cache::size_calculator::SizeCalculator;
use crate::cache::size_formatter::SizeFormatter;
use crate::cache::traits::Cache;
use crate::error::Result;
use crate::types::{Note, NoteId, SizeBytes, SizeType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default, Serialize, Deserialize)]
struct SizeStrState {
    strings: HashMap<SizeType, HashMap<NoteId, String>>,
}

/// (note, size type) → formatted size string
pub struct SizeStrCache {
    size_calculator: Arc<SizeCalculator>,
    size_formatter: Arc<SizeFormatter>,
    precision: u8,
    lock: CacheLock<SizeStrState>,
}

impl SizeStrCache {
    pub fn new(
        size_calculator: Arc<SizeCalculator>,
        size_formatter: Arc<SizeFormatter>,
        precision: u8,
    ) -> Self {
        Self {
            size_calculator,
            size_formatter,
            precision,
            lock: CacheLock::default(),
        }
    }

    pub fn get_note_size_str(
        &self,
        note_id: NoteId,
        size_type: SizeType,
        use_cache: bool,
    ) -> Result<String> {
        let _guard = self.lock.hold();
        if use_cache && let Some(text) = self.cached(note_id, size_type) {
            return Ok(text);
        }
        let size = self
            .size_calculator
            .get_note_size(note_id, size_type, use_cache)?;
        Ok(self.store(note_id, size_type, size))
    }

    pub fn calculate_note_size_str(
        &self,
        note: &Note,
        size_type: SizeType,
        use_cache: bool,
    ) -> String {
        let _guard = self.lock.hold();
        if use_cache && let Some(text) = self.cached(note.id, size_type) {
            return text;
        }
        let size = self
            .size_calculator
            .calculate_note_size(note, size_type, use_cache);
        self.store(note.id, size_type, size)
    }

    fn cached(&self, note_id: NoteId, size_type: SizeType) -> Option<String> {
        self.lock.read(|state| {
            state
                .strings
                .get(&size_type)
                .and_then(|strings| strings.get(&note_id))
                .cloned()
        })
    }

    fn store(&self, note_id: NoteId, size_type: SizeType, size: SizeBytes) -> String {
        let text = self.size_formatter.bytes_to_str(size, self.precision);
        self.lock.write(|state| {
            state
                .strings
                .entry(size_type)
                .or_default()
                .insert(note_id, text.clone())
        });
        text
    }
}

impl Cache for SizeStrCache {
    fn name(&self) -> &'static str {
        "size_str_cache"
    }

    fn invalidate(&self) {
        self.lock.reset();
    }

    fn cache_size(&self) -> usize {
        self.lock
            .read(|state| state.strings.values().map(|strings| strings.len()).sum())
    }

    fn is_initialized(&self) -> bool {
        self.lock.is_initialized()
    }

    fn set_initialized(&self, initialized: bool) {
        self.lock.set_initialized(initialized);
    }

    fn evict_note(&self, note_id: NoteId) {
        self.lock.write(|state| {
            for strings in state.strings.values_mut() {
                strings.remove(&note_id);
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
