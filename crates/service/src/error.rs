//! Typed error enum for the service layer.
//!
//! Unifies storage and input failures with the residual-duplicates condition
//! the operator has to act on.

use rewards_dedup_core::{CoreError, GroupKeyValue};
use rewards_dedup_storage::StorageError;
use thiserror::Error;

/// Service-layer error.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage operation failed (connectivity, permissions, unexpected output).
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Target, field or collection name rejected before touching the store.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] CoreError),

    /// The unique index was rejected because duplicates are still present,
    /// typically inserted by a concurrent writer after the last scan.
    #[error(
        "duplicates remain in {collection}: unique index {index} rejected ({detail}); {} colliding key values{}",
        .total,
        format_collisions(.collisions, .total)
    )]
    ResidualDuplicates {
        collection: String,
        index: String,
        collisions: Vec<GroupKeyValue>,
        total: usize,
        detail: String,
    },
}

fn format_collisions(collisions: &[GroupKeyValue], total: &usize) -> String {
    if collisions.is_empty() {
        return String::new();
    }
    let listed: Vec<String> = collisions.iter().map(ToString::to_string).collect();
    let more = total.saturating_sub(collisions.len());
    if more > 0 {
        format!(": {} and {more} more", listed.join(", "))
    } else {
        format!(": {}", listed.join(", "))
    }
}

impl ServiceError {
    /// Whether this error is likely transient (worth retrying).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Whether the run stopped because duplicates survived the deletion passes.
    pub fn is_residual_duplicates(&self) -> bool {
        matches!(self, Self::ResidualDuplicates { .. })
    }
}
