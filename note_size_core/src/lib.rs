//! Note Size Core Library
//!
//! Computes the storage size of notes (field text, referenced media and
//! their total) on top of a host-owned collection, behind a set of
//! pull-through caches that can be warmed up in the background and
//! persisted across restarts.

pub mod cache;
pub mod collection;
pub mod collection_size;
pub mod config;
pub mod error;
pub mod events;
pub mod media_refs;
pub mod progress;
pub mod service;
pub mod types;

// Re-export main types
pub use cache::{
    Cache, CacheInitializer, CacheManager, CacheStorage, CancellationToken, SizeFormatter,
    WarmUpHandle, WarmUpOutcome, WarmUpState, bytes_to_str, str_to_bytes,
};
pub use collection::{Collection, MediaCheckOutput};
pub use collection_size::{CollectionSize, CollectionSizeCalculator};
pub use config::{CacheConfig, FormatConfig, LevelsConfig, SizeLevel};
pub use error::{Error, Result};
pub use events::{CollectionEvents, EventDispatcher};
pub use progress::{
    ChannelProvider, NullProvider, ProgressProvider, ProgressUpdate, WarmUpStage,
};
pub use service::{NoteFile, NoteSizeService, ServiceConfig, StartupMode};
pub use types::{CardId, FileType, FilesSize, MediaFile, Note, NoteId, SizeBytes, SizeType};
