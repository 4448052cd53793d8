//! Typed configuration for the cache layer
//!
//! Every section has explicit defaults; user overrides are merged on top by
//! the embedding application and checked with `validate()` at load time.

use crate::cache::size_formatter::str_to_bytes;
use crate::error::{Result, ValidationError};
use crate::types::SizeBytes;
use serde::{Deserialize, Serialize};

/// Cache lifecycle settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Walk the whole collection in the background at startup
    pub warmup_enabled: bool,
    /// Persist caches across restarts
    pub store_cache_in_file_enabled: bool,
    /// Report warm-up progress every this many items
    pub progress_stride: usize,
    /// Name of the persisted cache file inside the data directory
    pub file_name: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            warmup_enabled: true,
            store_cache_in_file_enabled: true,
            progress_stride: 100,
            file_name: "note_size_cache.bin".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        if self.progress_stride == 0 {
            return Err(
                ValidationError::invalid_setting("cache.progress_stride", "must be at least 1")
                    .into(),
            );
        }
        if self.file_name.trim().is_empty() {
            return Err(ValidationError::invalid_setting("cache.file_name", "must not be empty").into());
        }
        Ok(())
    }
}

/// Size string formatting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Decimal digits shown for KB and above
    pub precision: u8,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self { precision: 1 }
    }
}

impl FormatConfig {
    pub const MAX_PRECISION: u8 = 6;

    pub fn validate(&self) -> Result<()> {
        if self.precision > Self::MAX_PRECISION {
            return Err(ValidationError::invalid_setting(
                "format.precision",
                format!("must be at most {}, got {}", Self::MAX_PRECISION, self.precision),
            )
            .into());
        }
        Ok(())
    }
}

/// One size band, e.g. "Large notes are red"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeLevel {
    pub name: String,
    pub color: String,
    /// Exclusive upper bound as a size string ("100 KB"); `None` means unbounded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<String>,
}

impl SizeLevel {
    pub fn new(name: &str, color: &str, max_size: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            color: color.to_string(),
            max_size: max_size.map(str::to_string),
        }
    }

    /// Parsed upper bound
    pub fn max_bytes(&self) -> Result<Option<SizeBytes>> {
        self.max_size.as_deref().map(str_to_bytes).transpose()
    }
}

/// Ordered size bands used to colour sizes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelsConfig {
    pub levels: Vec<SizeLevel>,
}

impl Default for LevelsConfig {
    fn default() -> Self {
        Self {
            levels: vec![
                SizeLevel::new("Small", "#4caf50", Some("100 KB")),
                SizeLevel::new("Medium", "#ff9800", Some("1 MB")),
                SizeLevel::new("Large", "#f44336", None),
            ],
        }
    }
}

impl LevelsConfig {
    /// Thresholds must parse and ascend strictly; only the last level may be
    /// unbounded
    pub fn validate(&self) -> Result<()> {
        if self.levels.is_empty() {
            return Err(ValidationError::invalid_setting("levels", "at least one level is needed").into());
        }

        let last = self.levels.len() - 1;
        let mut previous: Option<SizeBytes> = None;
        for (index, level) in self.levels.iter().enumerate() {
            match level.max_bytes()? {
                Some(max) => {
                    if let Some(prev) = previous
                        && max <= prev
                    {
                        return Err(ValidationError::invalid_setting(
                            "levels",
                            format!(
                                "threshold of '{}' must be larger than the previous one",
                                level.name
                            ),
                        )
                        .into());
                    }
                    previous = Some(max);
                }
                None if index != last => {
                    return Err(ValidationError::invalid_setting(
                        "levels",
                        format!("only the last level may omit max_size, '{}' does", level.name),
                    )
                    .into());
                }
                None => {}
            }
        }
        Ok(())
    }

    /// First level whose bound exceeds `size`, else the last level
    pub fn level_for(&self, size: SizeBytes) -> Option<&SizeLevel> {
        self.levels
            .iter()
            .find(|level| match level.max_bytes() {
                Ok(Some(max)) => size < max,
                Ok(None) => true,
                Err(_) => false,
            })
            .or_else(|| self.levels.last())
    }
}
