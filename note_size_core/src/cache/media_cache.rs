//! On-disk sizes of media files
//!
//! Sizes are stat'ed lazily under the host's media directory. The last
//! observed size and modification time per file are kept so that media
//! changed behind our back (media sync, external editors) can be detected.

use crate::cache::lock::CacheLock;
use crate::cache::traits::Cache;
use crate::error::Result;
use crate::types::{MediaFile, SizeBytes};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct FileStat {
    size: u64,
    modified_nanos: Option<u64>,
    exists: bool,
}

impl FileStat {
    const MISSING: FileStat = FileStat {
        size: 0,
        modified_nanos: None,
        exists: false,
    };
}

#[derive(Default, Serialize, Deserialize)]
struct MediaState {
    files: HashMap<MediaFile, FileStat>,
}

/// Cache of media file sizes keyed by filename
pub struct MediaCache {
    media_dir: PathBuf,
    lock: CacheLock<MediaState>,
}

impl MediaCache {
    pub fn new(media_dir: impl Into<PathBuf>) -> Self {
        Self {
            media_dir: media_dir.into(),
            lock: CacheLock::default(),
        }
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Size of a media file; a missing file counts as zero bytes
    pub fn get_file_size(&self, file: &str, use_cache: bool) -> SizeBytes {
        SizeBytes(self.get_stat(file, use_cache).size)
    }

    /// Whether the file was absent on disk when last stat'ed
    pub fn is_missing(&self, file: &str, use_cache: bool) -> bool {
        !self.get_stat(file, use_cache).exists
    }

    /// Previously queried files whose size or modification time changed
    pub fn get_updated_files(&self) -> HashSet<MediaFile> {
        let _guard = self.lock.hold();
        let known: Vec<(MediaFile, FileStat)> = self.lock.read(|state| {
            state
                .files
                .iter()
                .map(|(file, stat)| (file.clone(), *stat))
                .collect()
        });

        let updated: HashSet<MediaFile> = known
            .into_iter()
            .filter(|(file, cached)| self.stat_on_disk(file) != *cached)
            .map(|(file, _)| file)
            .collect();

        if !updated.is_empty() {
            debug!("{} media file(s) changed on disk", updated.len());
        }
        updated
    }

    fn get_stat(&self, file: &str, use_cache: bool) -> FileStat {
        let _guard = self.lock.hold();
        if use_cache && let Some(stat) = self.lock.read(|state| state.files.get(file).copied()) {
            return stat;
        }

        let stat = self.stat_on_disk(file);
        if !stat.exists {
            warn!(
                "Media file not found: {}",
                self.media_dir.join(file).display()
            );
        }
        self.lock
            .write(|state| state.files.insert(file.to_string(), stat));
        stat
    }

    fn stat_on_disk(&self, file: &str) -> FileStat {
        let path = self.media_dir.join(file);
        match fs::metadata(&path) {
            Ok(metadata) => FileStat {
                size: metadata.len(),
                modified_nanos: metadata
                    .modified()
                    .ok()
                    .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
                    .and_then(|elapsed| u64::try_from(elapsed.as_nanos()).ok()),
                exists: true,
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => FileStat::MISSING,
            Err(e) => {
                warn!("Cannot stat media file {}: {e}", path.display());
                FileStat::MISSING
            }
        }
    }
}

impl Cache for MediaCache {
    fn name(&self) -> &'static str {
        "media_cache"
    }

    fn invalidate(&self) {
        self.lock.reset();
    }

    fn cache_size(&self) -> usize {
        self.lock.read(|state| state.files.len())
    }

    fn is_initialized(&self) -> bool {
        self.lock.is_initialized()
    }

    fn set_initialized(&self, initialized: bool) {
        self.lock.set_initialized(initialized);
    }

    fn export(&self) -> Result<Vec<u8>> {
        self.lock.export_state()
    }

    fn import(&self, data: &[u8]) -> Result<()> {
        self.lock.import_state(data)
    }
}
