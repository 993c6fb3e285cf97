//! Error types for the user vault.
//!
//! This module defines the semantic errors surfaced by [`crate::UserStore`],
//! following the project's error handling conventions with `thiserror`.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::record::UserId;

/// Errors that can occur while loading or mutating the user store.
///
/// Absent records on read paths are not errors; they degrade to `None` or a
/// caller-supplied default. These variants cover the mutation and
/// initialization failures that must reach the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The user directory or a record file could not be read.
    #[error("failed to read user data at '{path}': {message}")]
    ReadError {
        /// Path that failed to read.
        path: Utf8PathBuf,
        /// Description of the I/O error.
        message: String,
    },

    /// A record file could not be written.
    #[error("failed to write user record '{path}': {message}")]
    WriteError {
        /// Path of the record file.
        path: Utf8PathBuf,
        /// Description of the I/O error.
        message: String,
    },

    /// A persisted record could not be parsed at load time.
    ///
    /// This is fatal for store initialization; a store never partially loads.
    #[error("corrupt user record '{path}': {message}")]
    CorruptRecord {
        /// Path of the offending record file.
        path: Utf8PathBuf,
        /// Description of the parse failure.
        message: String,
    },

    /// A record with this ID already exists.
    #[error("user {id} already exists")]
    DuplicateId {
        /// The conflicting user ID.
        id: UserId,
    },

    /// No record with this ID exists.
    #[error("user {id} not found")]
    NotFound {
        /// The missing user ID.
        id: UserId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_error_formats_correctly() {
        let err = StoreError::ReadError {
            path: Utf8PathBuf::from("/data/users"),
            message: "permission denied".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "failed to read user data at '/data/users': permission denied"
        );
    }

    #[test]
    fn corrupt_record_formats_correctly() {
        let err = StoreError::CorruptRecord {
            path: Utf8PathBuf::from("/data/users/12.json"),
            message: "expected value at line 1".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "corrupt user record '/data/users/12.json': expected value at line 1"
        );
    }

    #[test]
    fn duplicate_id_formats_correctly() {
        let err = StoreError::DuplicateId { id: 42 };
        assert_eq!(err.to_string(), "user 42 already exists");
    }

    #[test]
    fn not_found_formats_correctly() {
        let err = StoreError::NotFound { id: -7 };
        assert_eq!(err.to_string(), "user -7 not found");
    }
}
