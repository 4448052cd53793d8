//! Contract the host application fulfils for the cache layer
//!
//! The host owns notes, cards and the media directory. Caches only read
//! through this trait and never create or destroy host entities.

use crate::error::Result;
use crate::media_refs;
use crate::types::{CardId, MediaFile, Note, NoteId};
use std::path::Path;

/// Result of the host's "check media" pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaCheckOutput {
    /// Files present in the media directory that no note references
    pub unused: Vec<MediaFile>,
    /// Files referenced by notes but absent from the media directory
    pub missing: Vec<MediaFile>,
}

/// Host collection access used by every cache
pub trait Collection: Send + Sync {
    /// Look a note up by id; fails with a not-found error if it is gone
    fn get_note(&self, note_id: NoteId) -> Result<Note>;

    /// Owning note of a card; fails with a not-found error if it is gone
    fn card_note_id(&self, card_id: CardId) -> Result<NoteId>;

    fn all_note_ids(&self) -> Result<Vec<NoteId>>;

    fn all_card_ids(&self) -> Result<Vec<CardId>>;

    /// Directory media filenames are relative to
    fn media_dir(&self) -> &Path;

    /// Media filenames referenced by one field's markup
    fn files_in_str(&self, text: &str) -> Vec<MediaFile> {
        media_refs::extract_media_refs(text)
    }

    /// Delegated media check
    fn check_media(&self) -> Result<MediaCheckOutput>;
}
