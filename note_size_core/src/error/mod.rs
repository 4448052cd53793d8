//! Error types for the note size core library
//!
//! Errors are grouped by who is at fault so callers can decide what to
//! surface: a vanished note is the host's business, a corrupt cache file is
//! recovered locally, a bad size string is the user's.

use thiserror::Error;

pub mod internal;
pub mod io;
pub mod not_found;
pub mod storage;
pub mod validation;

pub use self::io::{IoError, IoOperation};
pub use internal::InternalError;
pub use not_found::NotFoundError;
pub use storage::StorageError;
pub use validation::{SizeParseFailure, ValidationError};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the note size core library
///
/// - Not found: the host no longer knows a note or card
/// - Validation: unparsable size strings, invalid configuration
/// - Storage: persisted cache encoding or version problems
/// - I/O: filesystem failures with path context
/// - Internal: worker thread failures
#[derive(Error, Debug)]
pub enum Error {
    /// Host entity lookups that came back empty
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// Input validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Persisted cache errors
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// I/O related errors
    #[error(transparent)]
    Io(#[from] IoError),

    /// Internal library errors
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl Error {
    /// True when the host reported a missing note or card
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io(IoError::from(source))
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Self::Storage(StorageError::codec(&err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CardId, NoteId};
    use std::io;

    #[test]
    fn test_note_not_found_display() {
        let error = Error::from(NotFoundError::note(NoteId(42)));
        assert!(error.is_not_found());
        assert!(error.to_string().contains("Note not found"));
        assert!(error.to_string().contains("42"));
    }

    #[test]
    fn test_card_not_found_display() {
        let error = Error::from(NotFoundError::card(CardId(7)));
        assert!(error.is_not_found());
        assert!(error.to_string().contains("Card not found: 7"));
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "gone");
        let error: Error = io_error.into();

        match error {
            Error::Io(io_err) => {
                assert_eq!(io_err.operation, IoOperation::Other);
                assert!(io_err.is_missing_path());
            }
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_storage_version_mismatch_display() {
        let error = Error::from(StorageError::version_mismatch(1, 3));
        let text = error.to_string();
        assert!(text.contains("version"));
        assert!(text.contains('1'));
        assert!(text.contains('3'));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
