//! Caches mapping notes, cards and media files to sizes
//!
//! Every cache owns its state behind a single re-entrant lock
//! ([`CacheLock`]) and implements the [`Cache`] trait so that
//! [`CacheManager`] can invalidate, persist and evict them uniformly.

pub mod file_type_helper;
pub mod initializer;
pub mod item_id_cache;
pub mod lock;
pub mod manager;
pub mod media_cache;
pub mod size_calculator;
pub mod size_formatter;
pub mod size_str_cache;
pub mod storage;
pub mod traits;
pub mod updated_files;
pub mod used_files;

pub use file_type_helper::FileTypeHelper;
pub use initializer::{CacheInitializer, CancellationToken, WarmUpHandle, WarmUpOutcome, WarmUpState};
pub use item_id_cache::ItemIdCache;
pub use lock::CacheLock;
pub use manager::CacheManager;
pub use media_cache::MediaCache;
pub use size_calculator::SizeCalculator;
pub use size_formatter::{SizeFormatter, bytes_to_str, str_to_bytes};
pub use size_str_cache::SizeStrCache;
pub use storage::{CACHE_FORMAT_VERSION, CacheStorage};
pub use traits::Cache;
pub use updated_files::UpdatedFilesCalculator;
pub use used_files::UsedFilesCalculator;
