//! Standard two-field note with three media files

use crate::mocks::MockCollection;
use note_size_core::{CardId, NoteId};
use std::sync::Arc;

/// Front field of the default note (52 bytes)
pub const FRONT_FIELD: &str = r#"Files: <img src="picture.jpg"> <img src="sound.mp3">"#;

/// Back field of the default note (56 bytes)
pub const BACK_FIELD: &str = r#"Files: <img src="picture.jpg"> <img src="animation.gif">"#;

/// Media files of the default note and their contents
pub const DEFAULT_MEDIA: [(&str, &[u8]); 3] = [
    ("picture.jpg", b"picture"),
    ("sound.mp3", b"sound"),
    ("animation.gif", b"animation"),
];

/// A collection holding the default note and its two cards
pub struct Fixture {
    pub collection: Arc<MockCollection>,
    pub note_id: NoteId,
    pub card_ids: [CardId; 2],
}

/// Build the default fixture: picture.jpg (7 B), sound.mp3 (5 B) and
/// animation.gif (9 B), referenced by note 1 with cards 11 and 12
///
/// These exact field strings size to 108 B of text, 21 B of files and
/// 129 B total. The often quoted 122 B / 143 B figures cannot be reached
/// from them, so assertions use the measured values.
pub fn default_fixture() -> Fixture {
    let collection = Arc::new(MockCollection::new());
    for (name, content) in DEFAULT_MEDIA {
        collection.add_media_file(name, content);
    }
    let note_id = collection.add_note_with_cards(1, &[FRONT_FIELD, BACK_FIELD], &[11, 12]);

    Fixture {
        collection,
        note_id,
        card_ids: [CardId(11), CardId(12)],
    }
}

/// Builds note fields out of text and media references
#[derive(Debug, Default, Clone)]
pub struct NoteBuilder {
    fields: Vec<String>,
    cards: Vec<i64>,
}

impl NoteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plain-text field
    pub fn field(mut self, text: &str) -> Self {
        self.fields.push(text.to_string());
        self
    }

    /// Append a field holding one `<img>` reference
    pub fn image(mut self, file: &str) -> Self {
        self.fields.push(format!(r#"<img src="{file}">"#));
        self
    }

    /// Append a field holding one `[sound:]` tag
    pub fn sound(mut self, file: &str) -> Self {
        self.fields.push(format!("[sound:{file}]"));
        self
    }

    pub fn card(mut self, card_id: i64) -> Self {
        self.cards.push(card_id);
        self
    }

    pub fn fields(&self) -> Vec<&str> {
        self.fields.iter().map(String::as_str).collect()
    }

    /// Insert the note into `collection` under `id`
    pub fn insert(self, collection: &MockCollection, id: i64) -> NoteId {
        collection.add_note_with_cards(id, &self.fields(), &self.cards)
    }
}
