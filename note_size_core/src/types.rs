//! Identity and size types shared by every cache

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Host-owned note identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NoteId(pub i64);

/// Host-owned card identity; many cards may belong to one note
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardId(pub i64);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Media filename relative to the host's media directory
pub type MediaFile = String;

/// Non-negative byte count
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SizeBytes(pub u64);

impl SizeBytes {
    pub const ZERO: SizeBytes = SizeBytes(0);

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Add for SizeBytes {
    type Output = SizeBytes;

    fn add(self, rhs: SizeBytes) -> SizeBytes {
        SizeBytes(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for SizeBytes {
    fn add_assign(&mut self, rhs: SizeBytes) {
        *self = *self + rhs;
    }
}

impl Sum for SizeBytes {
    fn sum<I: Iterator<Item = SizeBytes>>(iter: I) -> SizeBytes {
        iter.fold(SizeBytes::ZERO, Add::add)
    }
}

impl From<u64> for SizeBytes {
    fn from(value: u64) -> Self {
        SizeBytes(value)
    }
}

impl fmt::Display for SizeBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which part of a note is being sized
///
/// Used as a key dimension inside the per-note caches so one eviction path
/// covers all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeType {
    Total,
    Texts,
    Files,
}

impl SizeType {
    pub const ALL: [SizeType; 3] = [SizeType::Total, SizeType::Texts, SizeType::Files];
}

impl fmt::Display for SizeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SizeType::Total => "total",
            SizeType::Texts => "texts",
            SizeType::Files => "files",
        };
        f.write_str(name)
    }
}

/// Broad media classification of a filename
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    Image,
    Audio,
    Video,
    Other,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileType::Image => "image",
            FileType::Audio => "audio",
            FileType::Video => "video",
            FileType::Other => "other",
        };
        f.write_str(name)
    }
}

/// Combined size and number of a set of distinct media files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesSize {
    pub size: SizeBytes,
    pub count: usize,
}

/// Snapshot of a host note: its identity and raw field contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub fields: Vec<String>,
}

impl Note {
    pub fn new(id: NoteId, fields: Vec<String>) -> Self {
        Self { id, fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_bytes_sum_and_add() {
        let total: SizeBytes = [SizeBytes(3), SizeBytes(4), SizeBytes(5)].into_iter().sum();
        assert_eq!(total, SizeBytes(12));
        assert_eq!(SizeBytes(u64::MAX) + SizeBytes(1), SizeBytes(u64::MAX));
    }

    #[test]
    fn test_size_type_display() {
        assert_eq!(SizeType::Total.to_string(), "total");
        assert_eq!(SizeType::Texts.to_string(), "texts");
        assert_eq!(SizeType::Files.to_string(), "files");
    }
}
