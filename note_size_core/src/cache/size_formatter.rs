//! Human-readable byte sizes and their inverse parse
//!
//! Units are binary (1024) and stop at GB: larger values keep scaling the
//! GB figure ("1626.8 GB"), there is no TB.

use crate::cache::lock::CacheLock;
use crate::cache::traits::Cache;
use crate::error::{Result, SizeParseFailure, ValidationError};
use crate::types::SizeBytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
const DIVISOR: f64 = 1024.0;

/// Format a byte count, e.g. `bytes_to_str(SizeBytes(1433), 1) == "1.4 KB"`
///
/// Plain bytes are always shown as an integer; every other unit gets
/// `precision` decimal digits.
pub fn bytes_to_str(size: SizeBytes, precision: u8) -> String {
    let mut value = size.as_u64() as f64;
    let mut unit = 0;

    while value >= DIVISOR && unit < UNITS.len() - 1 {
        value /= DIVISOR;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", size.as_u64(), UNITS[0])
    } else {
        format!("{:.*} {}", usize::from(precision), value, UNITS[unit])
    }
}

/// Parse a size string such as `"1.4 KB"`, `"12kb"` or `"100 B"`
///
/// Units are case-insensitive and the space before them is optional. A bare
/// number is taken as bytes.
pub fn str_to_bytes(input: &str) -> Result<SizeBytes> {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    if number.is_empty() {
        return Err(ValidationError::invalid_size(input, SizeParseFailure::MissingNumber).into());
    }
    let value: f64 = number
        .parse()
        .map_err(|_| ValidationError::invalid_size(input, SizeParseFailure::MalformedNumber))?;

    let unit = unit.trim();
    let multiplier = match unit.to_ascii_uppercase().as_str() {
        "" | "B" => 1.0,
        "KB" => DIVISOR,
        "MB" => DIVISOR * DIVISOR,
        "GB" => DIVISOR * DIVISOR * DIVISOR,
        _ => {
            return Err(ValidationError::invalid_size(
                input,
                SizeParseFailure::UnknownUnit(unit.to_string()),
            )
            .into());
        }
    };

    Ok(SizeBytes((value * multiplier).round() as u64))
}

#[derive(Default, Serialize, Deserialize)]
struct FormatterState {
    strings: HashMap<(u64, u8), String>,
}

/// Memoizing wrapper around [`bytes_to_str`]
///
/// Entries are never evicted one by one, only by invalidating the cache.
#[derive(Default)]
pub struct SizeFormatter {
    lock: CacheLock<FormatterState>,
}

impl SizeFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes_to_str(&self, size: SizeBytes, precision: u8) -> String {
        let key = (size.as_u64(), precision);
        let _guard = self.lock.hold();
        if let Some(cached) = self.lock.read(|state| state.strings.get(&key).cloned()) {
            return cached;
        }
        let formatted = bytes_to_str(size, precision);
        self.lock
            .write(|state| state.strings.insert(key, formatted.clone()));
        formatted
    }
}

impl Cache for SizeFormatter {
    fn name(&self) -> &'static str {
        "size_formatter"
    }

    fn invalidate(&self) {
        self.lock.reset();
    }

    fn cache_size(&self) -> usize {
        self.lock.read(|state| state.strings.len())
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
