//! Persisted cache file errors

use thiserror::Error;

/// Errors raised while encoding or decoding the persisted cache file
#[derive(Error, Debug)]
pub enum StorageError {
    /// The file was written by a different cache format
    #[error("Cache file version {found} does not match expected version {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    /// A cache that should be in the file is not
    #[error("Cache file has no entry for cache '{cache}'")]
    MissingCache { cache: String },

    /// Binary encoding or decoding failed
    #[error("Cache codec error: {message}")]
    Codec { message: String },
}

impl StorageError {
    pub fn version_mismatch(found: u32, expected: u32) -> Self {
        Self::VersionMismatch { found, expected }
    }

    pub fn missing_cache(cache: &str) -> Self {
        Self::MissingCache {
            cache: cache.to_string(),
        }
    }

    pub fn codec(message: &str) -> Self {
        Self::Codec {
            message: message.to_string(),
        }
    }
}
