//! Error Types
//!
//! All engine operations report failures through [`DbError`]. The first four
//! variants are ordinary command outcomes (a GET on a missing key is not an
//! I/O problem); the last two cover persistence.
//!
//! Background tasks never surface errors to clients. They log the failure
//! and retry on their next tick.

use thiserror::Error;

/// Errors produced by the database engine.
#[derive(Debug, Error)]
pub enum DbError {
    /// GET or TTL on a key that does not exist.
    #[error("key not found")]
    KeyNotFound,

    /// GET found the key but its deadline is in the past.
    #[error("key expired")]
    KeyExpired,

    /// SET on a key that is already present and live.
    #[error("key already exists")]
    KeyAlreadyExists,

    /// A persisted value carried a type tag outside the supported set.
    #[error("unsupported value type: {0}")]
    UnsupportedValueType(String),

    /// File open/read/write/rename/truncate failure.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// A corrupt AOF line or snapshot entry.
    #[error("malformed record: {0}")]
    MalformedRecord(String),
}

impl DbError {
    /// True for the command-outcome variants that a client can trigger
    /// with well-formed input (as opposed to persistence failures). The
    /// command layer uses this to decide what deserves a server-side log
    /// line.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DbError::KeyNotFound
                | DbError::KeyExpired
                | DbError::KeyAlreadyExists
                | DbError::UnsupportedValueType(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(DbError::KeyNotFound.is_client_error());
        assert!(DbError::KeyExpired.is_client_error());
        assert!(DbError::KeyAlreadyExists.is_client_error());
        assert!(DbError::UnsupportedValueType("list".into()).is_client_error());

        assert!(!DbError::Io(std::io::Error::other("disk full")).is_client_error());
        assert!(!DbError::MalformedRecord("junk".into()).is_client_error());
    }
}
