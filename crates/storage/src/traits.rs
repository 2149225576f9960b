//! Record store trait abstraction.

use async_trait::async_trait;
use rewards_dedup_core::{DedupTarget, DuplicateGroup, IndexSpec, RecordId};

use crate::error::StorageError;

/// Operations the deduplicator needs from a document store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Round-trip to the store to confirm connectivity and credentials.
    async fn ping(&self) -> Result<(), StorageError>;

    /// Groups of two or more records sharing the target's key value.
    async fn find_duplicate_groups(
        &self,
        target: &DedupTarget,
    ) -> Result<Vec<DuplicateGroup>, StorageError>;

    /// Delete one record by identity. Returns `false` if it was already gone.
    async fn delete_by_id(&self, collection: &str, id: &RecordId) -> Result<bool, StorageError>;

    /// Create an index, returning its name. Creating an identical existing
    /// index succeeds. A unique index over duplicated values fails with
    /// [`StorageError::Duplicate`].
    async fn create_index(&self, collection: &str, spec: &IndexSpec)
    -> Result<String, StorageError>;

    /// Insert a raw JSON document. Unique indexes are enforced.
    async fn insert_record(
        &self,
        collection: &str,
        record: serde_json::Value,
    ) -> Result<RecordId, StorageError>;
}
