//! Card id to owning note id lookups
//!
//! List views hand out card ids while sizes are tracked per note.

use crate::cache::lock::CacheLock;
use crate::cache::traits::Cache;
use crate::collection::Collection;
use crate::error::Result;
use crate::types::{CardId, NoteId};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default, Serialize, Deserialize)]
struct ItemIdState {
    note_ids: HashMap<CardId, NoteId>,
}

/// Pull-through cache of the host's card → note relation
pub struct ItemIdCache {
    collection: Arc<dyn Collection>,
    lock: CacheLock<ItemIdState>,
}

impl ItemIdCache {
    pub fn new(collection: Arc<dyn Collection>) -> Self {
        Self {
            collection,
            lock: CacheLock::default(),
        }
    }

    /// Owning note of a card; a card the host no longer knows is an error
    pub fn get_note_id_by_card_id(&self, card_id: CardId) -> Result<NoteId> {
        let _guard = self.lock.hold();
        if let Some(note_id) = self.lock.read(|state| state.note_ids.get(&card_id).copied()) {
            return Ok(note_id);
        }
        let note_id = self.collection.card_note_id(card_id)?;
        debug!("Card {card_id} belongs to note {note_id}");
        self.lock
            .write(|state| state.note_ids.insert(card_id, note_id));
        Ok(note_id)
    }
}

impl Cache for ItemIdCache {
    fn name(&self) -> &'static str {
        "item_id_cache"
    }

    fn invalidate(&self) {
        self.lock.reset();
    }

    fn cache_size(&self) -> usize {
        self.lock.read(|state| state.note_ids.len())
    }

    fn is_initialized(&self) -> bool {
        self.lock.is_initialized()
    }

    fn set_initialized(&self, initialized: bool) {
        self.lock.set_initialized(initialized);
    }

    /// Several cards can point at one note, so this scans by value
    fn evict_note(&self, note_id: NoteId) {
        self.lock
            .write(|state| state.note_ids.retain(|_, owner| *owner != note_id));
    }

    fn export(&self) -> Result<Vec<u8>> {
        self.lock.export_state()
    }

    fn import(&self, data: &[u8]) -> Result<()> {
        self.lock.import_state(data)
    }
}
