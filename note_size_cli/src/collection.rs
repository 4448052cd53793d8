//! Exported collection host adapter
//!
//! Reads a collection export: a JSON document listing notes with their
//! fields and card ids, plus the media directory the notes reference.
//!
//! ```json
//! { "notes": [ { "id": 1, "fields": ["front", "<img src=\"a.jpg\">"], "cards": [11, 12] } ] }
//! ```

use note_size_core::error::{IoError, IoOperation, NotFoundError};
use note_size_core::{CardId, Collection, MediaCheckOutput, MediaFile, Note, NoteId};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Failures opening an export
#[derive(Error, Debug)]
pub enum CollectionFileError {
    #[error("Cannot read collection file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Collection file {} is not a valid export", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Card {card} is listed under both note {first} and note {second}")]
    DuplicateCard {
        card: CardId,
        first: NoteId,
        second: NoteId,
    },
}

#[derive(Debug, Deserialize)]
struct ExportFile {
    #[serde(default)]
    notes: Vec<ExportNote>,
}

#[derive(Debug, Deserialize)]
struct ExportNote {
    id: i64,
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default)]
    cards: Vec<i64>,
}

/// Read-only collection loaded from an export
#[derive(Debug)]
pub struct ExportedCollection {
    media_dir: PathBuf,
    notes: BTreeMap<NoteId, Note>,
    cards: BTreeMap<CardId, NoteId>,
}

impl ExportedCollection {
    /// Load an export and bind it to its media directory
    pub fn open(path: &Path, media_dir: &Path) -> Result<Self, CollectionFileError> {
        let content = fs::read_to_string(path).map_err(|source| CollectionFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let export: ExportFile =
            serde_json::from_str(&content).map_err(|source| CollectionFileError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut notes = BTreeMap::new();
        let mut cards = BTreeMap::new();
        for entry in export.notes {
            let note_id = NoteId(entry.id);
            for card in entry.cards {
                let card_id = CardId(card);
                if let Some(first) = cards.insert(card_id, note_id)
                    && first != note_id
                {
                    return Err(CollectionFileError::DuplicateCard {
                        card: card_id,
                        first,
                        second: note_id,
                    });
                }
            }
            notes.insert(note_id, Note::new(note_id, entry.fields));
        }

        log::debug!(
            "Loaded {} notes and {} cards from {}",
            notes.len(),
            cards.len(),
            path.display()
        );

        Ok(Self {
            media_dir: media_dir.to_path_buf(),
            notes,
            cards,
        })
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    fn referenced_files(&self) -> HashSet<MediaFile> {
        self.notes
            .values()
            .flat_map(|note| note.fields.iter())
            .flat_map(|field| self.files_in_str(field))
            .collect()
    }

    fn files_on_disk(&self) -> note_size_core::Result<HashSet<MediaFile>> {
        if !self.media_dir.is_dir() {
            log::warn!("Media directory {} does not exist", self.media_dir.display());
            return Ok(HashSet::new());
        }

        let mut on_disk = HashSet::new();
        for entry in WalkDir::new(&self.media_dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                IoError::new(IoOperation::ListMedia, &self.media_dir, e.into())
            })?;
            if entry.file_type().is_file() {
                on_disk.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(on_disk)
    }
}

impl Collection for ExportedCollection {
    fn get_note(&self, note_id: NoteId) -> note_size_core::Result<Note> {
        self.notes
            .get(&note_id)
            .cloned()
            .ok_or_else(|| NotFoundError::note(note_id).into())
    }

    fn card_note_id(&self, card_id: CardId) -> note_size_core::Result<NoteId> {
        self.cards
            .get(&card_id)
            .copied()
            .ok_or_else(|| NotFoundError::card(card_id).into())
    }

    fn all_note_ids(&self) -> note_size_core::Result<Vec<NoteId>> {
        Ok(self.notes.keys().copied().collect())
    }

    fn all_card_ids(&self) -> note_size_core::Result<Vec<CardId>> {
        Ok(self.cards.keys().copied().collect())
    }

    fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    fn check_media(&self) -> note_size_core::Result<MediaCheckOutput> {
        let referenced = self.referenced_files();
        let on_disk = self.files_on_disk()?;

        let mut unused: Vec<MediaFile> = on_disk.difference(&referenced).cloned().collect();
        let mut missing: Vec<MediaFile> = referenced.difference(&on_disk).cloned().collect();
        unused.sort();
        missing.sort();
        Ok(MediaCheckOutput { unused, missing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_export(dir: &TempDir, json: &str) -> PathBuf {
        let path = dir.path().join("collection.json");
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_open_indexes_notes_and_cards() {
        let dir = TempDir::new().unwrap();
        let path = write_export(
            &dir,
            r#"{"notes": [
                {"id": 1, "fields": ["a", "b"], "cards": [10, 11]},
                {"id": 2, "fields": ["c"]}
            ]}"#,
        );

        let collection = ExportedCollection::open(&path, dir.path()).unwrap();

        assert_eq!(collection.note_count(), 2);
        assert_eq!(collection.card_count(), 2);
        assert_eq!(collection.card_note_id(CardId(11)).unwrap(), NoteId(1));
        assert_eq!(collection.get_note(NoteId(2)).unwrap().fields, vec!["c"]);
        assert!(collection.get_note(NoteId(3)).unwrap_err().is_not_found());
        assert!(collection.card_note_id(CardId(99)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_export(&dir, "{not json");

        let error = ExportedCollection::open(&path, dir.path()).unwrap_err();
        assert!(matches!(error, CollectionFileError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let error =
            ExportedCollection::open(&dir.path().join("absent.json"), dir.path()).unwrap_err();
        assert!(matches!(error, CollectionFileError::Read { .. }));
    }

    #[test]
    fn test_card_shared_between_notes_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_export(
            &dir,
            r#"{"notes": [{"id": 1, "cards": [5]}, {"id": 2, "cards": [5]}]}"#,
        );

        let error = ExportedCollection::open(&path, dir.path()).unwrap_err();
        assert!(matches!(error, CollectionFileError::DuplicateCard { .. }));
    }

    #[test]
    fn test_check_media_splits_unused_and_missing() {
        let dir = TempDir::new().unwrap();
        let media = dir.path().join("collection.media");
        fs::create_dir(&media).unwrap();
        fs::write(media.join("used.jpg"), b"1234").unwrap();
        fs::write(media.join("spare.mp3"), b"12").unwrap();
        let path = write_export(
            &dir,
            r#"{"notes": [{"id": 1, "fields": ["<img src=\"used.jpg\">[sound:gone.mp3]"]}]}"#,
        );

        let collection = ExportedCollection::open(&path, &media).unwrap();
        let check = collection.check_media().unwrap();

        assert_eq!(check.unused, vec!["spare.mp3"]);
        assert_eq!(check.missing, vec!["gone.mp3"]);
    }

    #[test]
    fn test_check_media_without_media_dir() {
        let dir = TempDir::new().unwrap();
        let path = write_export(&dir, r#"{"notes": [{"id": 1, "fields": ["<img src=\"a.png\">"]}]}"#);

        let collection = ExportedCollection::open(&path, &dir.path().join("nowhere")).unwrap();
        let check = collection.check_media().unwrap();

        assert!(check.unused.is_empty());
        assert_eq!(check.missing, vec!["a.png"]);
    }
}
