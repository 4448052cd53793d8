//! Filesystem failures around the media directory and the cache file

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// What the failing filesystem call was doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOperation {
    CreateDir,
    Read,
    Write,
    Rename,
    ListMedia,
    /// Raised by a host without more detail
    Other,
}

impl fmt::Display for IoOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::CreateDir => "creating directory",
            Self::Read => "reading",
            Self::Write => "writing",
            Self::Rename => "renaming to",
            Self::ListMedia => "listing media in",
            Self::Other => "accessing",
        };
        f.write_str(verb)
    }
}

#[derive(Error, Debug)]
#[error("{}", describe(self))]
pub struct IoError {
    pub operation: IoOperation,
    pub path: Option<PathBuf>,
    #[source]
    pub source: std::io::Error,
}

impl IoError {
    pub fn new(operation: IoOperation, path: &Path, source: std::io::Error) -> Self {
        Self {
            operation,
            path: Some(path.to_path_buf()),
            source,
        }
    }

    /// True when the path the operation touched does not exist
    pub fn is_missing_path(&self) -> bool {
        self.source.kind() == std::io::ErrorKind::NotFound
    }
}

impl From<std::io::Error> for IoError {
    fn from(source: std::io::Error) -> Self {
        Self {
            operation: IoOperation::Other,
            path: None,
            source,
        }
    }
}

fn describe(error: &IoError) -> String {
    match &error.path {
        Some(path) => format!(
            "I/O error {} {}: {}",
            error.operation,
            path.display(),
            error.source
        ),
        None => format!("I/O error: {}", error.source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_operation_and_path_are_displayed() {
        let error = IoError::new(
            IoOperation::Write,
            Path::new("/data/note_size_cache.tmp"),
            io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
        );
        let text = error.to_string();
        assert_eq!(
            text,
            "I/O error writing /data/note_size_cache.tmp: read-only"
        );
        assert!(!error.is_missing_path());
    }

    #[test]
    fn test_bare_io_error_has_no_path() {
        let error = IoError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(error.operation, IoOperation::Other);
        assert!(error.path.is_none());
        assert!(error.is_missing_path());
        assert_eq!(error.to_string(), "I/O error: gone");
    }
}
