//! Concurrent-writer scenarios: stores that mutate the collection between
//! the steps of a dedup pass.

#![allow(clippy::unwrap_used, reason = "test code")]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rewards_dedup_core::{
    DedupOptions, DedupTarget, DuplicateGroup, IndexOutcome, IndexSpec, RecordId,
};
use rewards_dedup_storage::{MemoryStore, RecordStore, StorageError};
use serde_json::{json, Value};

use super::DedupService;
use crate::ServiceError;

const TRANSFERS: &str = "click_transfers";

#[derive(Default)]
struct Hooks {
    /// Records written by another client right after the first scan.
    after_first_scan: Vec<Value>,
    /// Records written by another client just before the index build.
    before_index: Vec<Value>,
    /// Another client deletes each record right before we do.
    steal_deletes: bool,
}

struct RacingStore {
    inner: MemoryStore,
    hooks: Mutex<Hooks>,
}

impl RacingStore {
    fn new(inner: MemoryStore, hooks: Hooks) -> Self {
        Self { inner, hooks: Mutex::new(hooks) }
    }

    async fn write_all(&self, collection: &str, records: Vec<Value>) {
        for record in records {
            self.inner.insert_record(collection, record).await.unwrap();
        }
    }
}

#[async_trait]
impl RecordStore for RacingStore {
    async fn ping(&self) -> Result<(), StorageError> {
        self.inner.ping().await
    }

    async fn find_duplicate_groups(
        &self,
        target: &DedupTarget,
    ) -> Result<Vec<DuplicateGroup>, StorageError> {
        let groups = self.inner.find_duplicate_groups(target).await?;
        let pending = std::mem::take(&mut self.hooks.lock().unwrap().after_first_scan);
        self.write_all(&target.collection, pending).await;
        Ok(groups)
    }

    async fn delete_by_id(&self, collection: &str, id: &RecordId) -> Result<bool, StorageError> {
        let steal = self.hooks.lock().unwrap().steal_deletes;
        if steal {
            self.inner.delete_by_id(collection, id).await?;
        }
        self.inner.delete_by_id(collection, id).await
    }

    async fn create_index(&self, collection: &str, spec: &IndexSpec) -> Result<String, StorageError> {
        let pending = std::mem::take(&mut self.hooks.lock().unwrap().before_index);
        self.write_all(collection, pending).await;
        self.inner.create_index(collection, spec).await
    }

    async fn insert_record(&self, collection: &str, record: Value) -> Result<RecordId, StorageError> {
        self.inner.insert_record(collection, record).await
    }
}

async fn seeded() -> MemoryStore {
    let store = MemoryStore::new();
    for (id, sig, ts) in [(1, "k1", 100), (2, "k1", 200), (3, "k2", 50)] {
        store
            .insert_record(TRANSFERS, json!({ "_id": id, "signature": sig, "timestamp": ts }))
            .await
            .unwrap();
    }
    store
}

fn target() -> DedupTarget {
    DedupTarget::transfers(TRANSFERS).unwrap()
}

#[tokio::test]
async fn test_vanished_record_is_skipped() {
    let inner = seeded().await;
    let racing = RacingStore::new(inner.clone(), Hooks { steal_deletes: true, ..Hooks::default() });
    let service = DedupService::new(Arc::new(racing));

    let report = service.deduplicate(&target(), DedupOptions::default()).await.unwrap();

    assert!(report.deleted.is_empty());
    assert_eq!(report.skipped, vec![RecordId::Int(1)]);
    assert!(matches!(report.index, IndexOutcome::Created { .. }));
    assert_eq!(inner.count(TRANSFERS).unwrap(), 2);
}

#[tokio::test]
async fn test_duplicate_between_passes_is_absorbed() {
    let inner = seeded().await;
    let hooks = Hooks {
        after_first_scan: vec![json!({ "_id": 10, "signature": "k2", "timestamp": 75 })],
        ..Hooks::default()
    };
    let service = DedupService::new(Arc::new(RacingStore::new(inner.clone(), hooks)));

    let report = service.deduplicate(&target(), DedupOptions::default()).await.unwrap();

    assert_eq!(report.passes, 2);
    assert_eq!(report.deleted, vec![RecordId::Int(1), RecordId::Int(3)]);
    let ids: Vec<_> = inner.records(TRANSFERS).unwrap().into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![RecordId::Int(2), RecordId::Int(10)]);
}

#[tokio::test]
async fn test_single_pass_leaves_late_duplicate_for_the_index() {
    let inner = seeded().await;
    let hooks = Hooks {
        after_first_scan: vec![json!({ "_id": 10, "signature": "k2", "timestamp": 75 })],
        ..Hooks::default()
    };
    let service = DedupService::new(Arc::new(RacingStore::new(inner.clone(), hooks)));

    let options = DedupOptions::default().with_max_passes(1);
    let err = service.deduplicate(&target(), options).await.unwrap_err();

    assert!(err.is_residual_duplicates());
    // The first pass still ran.
    assert_eq!(inner.count(TRANSFERS).unwrap(), 3);
}

#[tokio::test]
async fn test_duplicate_before_index_is_reported() {
    let inner = seeded().await;
    let hooks = Hooks {
        before_index: vec![json!({ "signature": "k1", "timestamp": 300 })],
        ..Hooks::default()
    };
    let service = DedupService::new(Arc::new(RacingStore::new(inner.clone(), hooks)));

    let err = service.deduplicate(&target(), DedupOptions::default()).await.unwrap_err();

    let ServiceError::ResidualDuplicates { collection, index, collisions, total, .. } = err else {
        panic!("expected residual duplicates, got {err:?}");
    };
    assert_eq!(collection, TRANSFERS);
    assert_eq!(index, "signature_1");
    assert_eq!(total, 1);
    assert_eq!(collisions[0].0, vec![json!("k1")]);
    assert!(inner.index_names(TRANSFERS).unwrap().is_empty());
}
