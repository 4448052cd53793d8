//! In-memory host collection backed by a temporary media directory

use note_size_core::error::{IoError, NotFoundError};
use note_size_core::{CardId, Collection, Error, MediaCheckOutput, Note, NoteId, Result};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tempfile::TempDir;

/// Mock collection for testing
///
/// Notes and cards live in memory; media files are real files in a
/// temporary directory so the media cache can stat them.
pub struct MockCollection {
    media_dir: TempDir,
    notes: RwLock<BTreeMap<NoteId, Note>>,
    cards: RwLock<BTreeMap<CardId, NoteId>>,
    note_lookups: AtomicUsize,
    card_lookups: AtomicUsize,
    failing: AtomicBool,
}

impl Default for MockCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCollection {
    /// Create an empty collection with a fresh media directory
    pub fn new() -> Self {
        Self {
            media_dir: TempDir::new().expect("create temporary media directory"),
            notes: RwLock::new(BTreeMap::new()),
            cards: RwLock::new(BTreeMap::new()),
            note_lookups: AtomicUsize::new(0),
            card_lookups: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// Write a media file, replacing any previous content
    pub fn add_media_file(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.media_dir.path().join(name);
        fs::write(&path, content).expect("write media file");
        path
    }

    pub fn remove_media_file(&self, name: &str) {
        fs::remove_file(self.media_dir.path().join(name)).expect("remove media file");
    }

    /// Insert a note without cards
    pub fn add_note(&self, id: i64, fields: &[&str]) -> NoteId {
        let note_id = NoteId(id);
        let fields = fields.iter().map(|field| field.to_string()).collect();
        self.notes.write().insert(note_id, Note::new(note_id, fields));
        note_id
    }

    /// Insert a note together with the cards generated from it
    pub fn add_note_with_cards(&self, id: i64, fields: &[&str], card_ids: &[i64]) -> NoteId {
        let note_id = self.add_note(id, fields);
        let mut cards = self.cards.write();
        for card_id in card_ids {
            cards.insert(CardId(*card_id), note_id);
        }
        note_id
    }

    /// Replace a note's fields behind the caches' back
    pub fn update_note(&self, note_id: NoteId, fields: &[&str]) {
        let fields = fields.iter().map(|field| field.to_string()).collect();
        self.notes.write().insert(note_id, Note::new(note_id, fields));
    }

    /// Delete a note and its cards
    pub fn remove_note(&self, note_id: NoteId) {
        self.notes.write().remove(&note_id);
        self.cards.write().retain(|_, owner| *owner != note_id);
    }

    /// Snapshot of a note as stored, bypassing lookup counting
    pub fn note(&self, note_id: NoteId) -> Option<Note> {
        self.notes.read().get(&note_id).cloned()
    }

    /// Make every lookup fail with an I/O error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `get_note` calls served so far
    pub fn note_lookups(&self) -> usize {
        self.note_lookups.load(Ordering::SeqCst)
    }

    /// Number of `card_note_id` calls served so far
    pub fn card_lookups(&self) -> usize {
        self.card_lookups.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Io(IoError::from(io::Error::other(
                "collection unavailable",
            ))));
        }
        Ok(())
    }

    fn referenced_files(&self) -> HashSet<String> {
        self.notes
            .read()
            .values()
            .flat_map(|note| note.fields.iter())
            .flat_map(|field| self.files_in_str(field))
            .collect()
    }
}

impl Collection for MockCollection {
    fn get_note(&self, note_id: NoteId) -> Result<Note> {
        self.note_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.notes
            .read()
            .get(&note_id)
            .cloned()
            .ok_or_else(|| NotFoundError::note(note_id).into())
    }

    fn card_note_id(&self, card_id: CardId) -> Result<NoteId> {
        self.card_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.cards
            .read()
            .get(&card_id)
            .copied()
            .ok_or_else(|| NotFoundError::card(card_id).into())
    }

    fn all_note_ids(&self) -> Result<Vec<NoteId>> {
        self.check_available()?;
        Ok(self.notes.read().keys().copied().collect())
    }

    fn all_card_ids(&self) -> Result<Vec<CardId>> {
        self.check_available()?;
        Ok(self.cards.read().keys().copied().collect())
    }

    fn media_dir(&self) -> &Path {
        self.media_dir.path()
    }

    fn check_media(&self) -> Result<MediaCheckOutput> {
        self.check_available()?;
        let referenced = self.referenced_files();

        let mut on_disk = HashSet::new();
        for entry in fs::read_dir(self.media_dir.path())? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                on_disk.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }

        let mut unused: Vec<String> = on_disk.difference(&referenced).cloned().collect();
        let mut missing: Vec<String> = referenced.difference(&on_disk).cloned().collect();
        unused.sort();
        missing.sort();
        Ok(MediaCheckOutput { unused, missing })
    }
}
