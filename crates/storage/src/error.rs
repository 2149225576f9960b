//! Typed error enum for the storage layer.
//!
//! Callers match on specific failure modes (duplicate key, index conflict,
//! transient connectivity) instead of downcasting opaque boxes.

use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

/// Server error codes for duplicate keys (`E11000` and its legacy update form).
const DUPLICATE_KEY_CODES: [i32; 2] = [11000, 11001];
/// `IndexOptionsConflict` and `IndexKeySpecsConflict`.
const INDEX_CONFLICT_CODES: [i32; 2] = [85, 86];

/// Storage-layer error with variants covering every expected failure mode.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Unique constraint violation, on insert or while building a unique index.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// An index with the same name or keys already exists with other options.
    #[error("index conflict: {0}")]
    IndexConflict(String),

    /// Connection, authentication, timeout or any other driver failure.
    #[error("database error: {0}")]
    Database(#[source] mongodb::error::Error),

    /// Store output could not be read into domain types.
    #[error("data corruption: {context}")]
    DataCorruption {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Caller passed something the store cannot represent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// In-process store state is unusable (poisoned lock).
    #[error("internal: {0}")]
    Internal(String),
}

impl StorageError {
    /// Whether this error is likely transient (worth retrying).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Database(err) => matches!(
                err.kind.as_ref(),
                ErrorKind::Io(_)
                    | ErrorKind::ServerSelection { .. }
                    | ErrorKind::ConnectionPoolCleared { .. }
            ),
            _ => false,
        }
    }

    /// Whether this error is a unique-constraint violation.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }

    pub(crate) fn corrupt(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::DataCorruption { context: context.into(), source: Box::new(source) }
    }
}

/// Server-side error code carried by a command or write failure.
fn server_code(err: &mongodb::error::Error) -> Option<(i32, String)> {
    match err.kind.as_ref() {
        ErrorKind::Command(cmd) => Some((cmd.code, cmd.message.clone())),
        ErrorKind::Write(WriteFailure::WriteError(write)) => Some((write.code, write.message.clone())),
        ErrorKind::Write(WriteFailure::WriteConcernError(concern)) => {
            Some((concern.code, concern.message.clone()))
        },
        _ => None,
    }
}

/// Classifies driver errors by server code instead of a blanket `#[from]`.
///
/// - codes 11000/11001 → `Duplicate`
/// - codes 85/86 → `IndexConflict`
/// - everything else → `Database`
impl From<mongodb::error::Error> for StorageError {
    fn from(err: mongodb::error::Error) -> Self {
        match server_code(&err) {
            Some((code, message)) if DUPLICATE_KEY_CODES.contains(&code) => Self::Duplicate(message),
            Some((code, message)) if INDEX_CONFLICT_CODES.contains(&code) => {
                Self::IndexConflict(message)
            },
            _ => Self::Database(err),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::corrupt("JSON serialization/deserialization", err)
    }
}
