//! Rejected user input: size strings and configuration values

use std::fmt;
use thiserror::Error;

/// Why a size string did not parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeParseFailure {
    MissingNumber,
    MalformedNumber,
    UnknownUnit(String),
}

impl fmt::Display for SizeParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingNumber => f.write_str("missing number"),
            Self::MalformedNumber => f.write_str("malformed number"),
            Self::UnknownUnit(unit) => write!(f, "unknown unit '{unit}' (expected B, KB, MB or GB)"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid size '{input}': {failure}")]
    InvalidSize {
        input: String,
        failure: SizeParseFailure,
    },

    /// A configuration value outside its allowed range
    #[error("Invalid {key}: {message}")]
    InvalidSetting { key: String, message: String },
}

impl ValidationError {
    pub fn invalid_size(input: &str, failure: SizeParseFailure) -> Self {
        Self::InvalidSize {
            input: input.to_string(),
            failure,
        }
    }

    pub fn invalid_setting(key: &str, message: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.to_string(),
            message: message.into(),
        }
    }
}
