//! Host lookup failures

use crate::types::{CardId, NoteId};
use thiserror::Error;

/// A note or card the caller asked about no longer exists in the host
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    #[error("Note not found: {0}")]
    Note(NoteId),

    #[error("Card not found: {0}")]
    Card(CardId),
}

impl NotFoundError {
    pub fn note(note_id: NoteId) -> Self {
        Self::Note(note_id)
    }

    pub fn card(card_id: CardId) -> Self {
        Self::Card(card_id)
    }
}
