//! In-process record store.
//!
//! Groups, deletes and unique indexes behave like the MongoDB backend closely
//! enough for the dedup pass. Missing key fields compare as `null` and numbers
//! compare by value. Creating an identical index twice is a no-op, and unique
//! indexes reject both conflicting inserts and construction over existing
//! duplicates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rewards_dedup_core::{
    DedupTarget, DuplicateGroup, FieldName, GroupKey, GroupKeyValue, IndexSpec, RecordId,
    RecordRef, Timestamp,
};
use serde_json::{Map, Value};

use crate::error::StorageError;
use crate::traits::RecordStore;

#[derive(Debug, Default)]
struct MemCollection {
    records: Vec<(RecordId, Map<String, Value>)>,
    indexes: Vec<IndexSpec>,
    next_id: i64,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<HashMap<String, MemCollection>>>,
}

fn lock(
    mutex: &Mutex<HashMap<String, MemCollection>>,
) -> Result<MutexGuard<'_, HashMap<String, MemCollection>>, StorageError> {
    mutex
        .lock()
        .map_err(|e: PoisonError<_>| StorageError::Internal(format!("memory store lock poisoned: {e}")))
}

/// Resolve a dotted path through nested objects.
fn lookup_path<'a>(record: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = record.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn key_values(record: &Map<String, Value>, fields: &[FieldName]) -> Vec<Value> {
    fields.iter().map(|f| lookup_path(record, f.as_str()).cloned().unwrap_or(Value::Null)).collect()
}

/// Numbers compare by value, as MongoDB does in `$group` and unique indexes.
fn canonical(value: &Value) -> Value {
    match value {
        Value::Number(n) => {
            n.as_f64().and_then(serde_json::Number::from_f64).map_or_else(|| value.clone(), Value::Number)
        },
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        Value::Object(fields) => {
            Value::Object(fields.iter().map(|(k, v)| (k.clone(), canonical(v))).collect())
        },
        other => other.clone(),
    }
}

fn canonical_key(record: &Map<String, Value>, fields: &[FieldName]) -> Vec<Value> {
    key_values(record, fields).iter().map(canonical).collect()
}

fn record_id_from_json(value: &Value) -> RecordId {
    match value {
        Value::Number(n) => n.as_i64().map_or_else(|| RecordId::Other(n.to_string()), RecordId::Int),
        Value::String(s) => RecordId::Text(s.clone()),
        Value::Object(obj) => match obj.get("$oid").and_then(Value::as_str) {
            Some(hex) if obj.len() == 1 => RecordId::ObjectId(hex.to_owned()),
            _ => RecordId::Other(value.to_string()),
        },
        other => RecordId::Other(other.to_string()),
    }
}

impl MemCollection {
    /// Groups of records with equal values over `fields`, in first-seen order.
    fn groups(&self, fields: &[FieldName], timestamp_field: Option<&str>) -> Vec<DuplicateGroup> {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<DuplicateGroup> = Vec::new();
        for (id, record) in &self.records {
            let values = key_values(record, fields);
            let fingerprint = Value::Array(values.iter().map(canonical).collect()).to_string();
            let timestamp =
                Timestamp::from_json(timestamp_field.and_then(|f| lookup_path(record, f)));
            let member = RecordRef::new(id.clone(), timestamp);
            match positions.get(&fingerprint) {
                Some(&pos) => groups[pos].members.push(member),
                None => {
                    positions.insert(fingerprint, groups.len());
                    groups.push(DuplicateGroup {
                        key_value: GroupKeyValue(values),
                        members: vec![member],
                    });
                },
            }
        }
        groups
    }

    fn first_collision(&self, key: &GroupKey) -> Option<GroupKeyValue> {
        self.groups(key.fields(), None)
            .into_iter()
            .find(DuplicateGroup::is_duplicate)
            .map(|g| g.key_value)
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a collection's records, `_id` included.
    pub fn records(&self, collection: &str) -> Result<Vec<(RecordId, Value)>, StorageError> {
        let collections = lock(&self.collections)?;
        Ok(collections
            .get(collection)
            .map(|c| c.records.iter().map(|(id, r)| (id.clone(), Value::Object(r.clone()))).collect())
            .unwrap_or_default())
    }

    pub fn count(&self, collection: &str) -> Result<usize, StorageError> {
        let collections = lock(&self.collections)?;
        Ok(collections.get(collection).map_or(0, |c| c.records.len()))
    }

    pub fn index_names(&self, collection: &str) -> Result<Vec<String>, StorageError> {
        let collections = lock(&self.collections)?;
        Ok(collections
            .get(collection)
            .map(|c| c.indexes.iter().map(IndexSpec::name).collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn ping(&self) -> Result<(), StorageError> {
        lock(&self.collections).map(|_| ())
    }

    async fn find_duplicate_groups(
        &self,
        target: &DedupTarget,
    ) -> Result<Vec<DuplicateGroup>, StorageError> {
        let collections = lock(&self.collections)?;
        let Some(collection) = collections.get(&target.collection) else {
            return Ok(Vec::new());
        };
        Ok(collection
            .groups(target.key.fields(), Some(target.timestamp_field.as_str()))
            .into_iter()
            .filter(DuplicateGroup::is_duplicate)
            .collect())
    }

    async fn delete_by_id(&self, collection: &str, id: &RecordId) -> Result<bool, StorageError> {
        let mut collections = lock(&self.collections)?;
        let Some(collection) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = collection.records.len();
        collection.records.retain(|(existing, _)| existing != id);
        Ok(collection.records.len() < before)
    }

    async fn create_index(
        &self,
        collection: &str,
        spec: &IndexSpec,
    ) -> Result<String, StorageError> {
        let mut collections = lock(&self.collections)?;
        let entry = collections.entry(collection.to_owned()).or_default();
        let name = spec.name();
        if let Some(existing) = entry.indexes.iter().find(|i| i.name() == name) {
            if existing == spec {
                return Ok(name);
            }
            return Err(StorageError::IndexConflict(format!(
                "index {name} already exists with different options"
            )));
        }
        if spec.unique {
            let key = GroupKey::new(spec.fields.clone())
                .map_err(|e| StorageError::InvalidInput(e.to_string()))?;
            if let Some(collision) = entry.first_collision(&key) {
                return Err(StorageError::Duplicate(format!(
                    "E11000 duplicate key error collection: {collection} index: {name} dup key: {collision}"
                )));
            }
        }
        entry.indexes.push(spec.clone());
        Ok(name)
    }

    async fn insert_record(
        &self,
        collection: &str,
        record: Value,
    ) -> Result<RecordId, StorageError> {
        let Value::Object(mut record) = record else {
            return Err(StorageError::InvalidInput("record must be a JSON object".to_owned()));
        };
        let mut collections = lock(&self.collections)?;
        let entry = collections.entry(collection.to_owned()).or_default();

        let id = match record.remove("_id") {
            Some(raw) => record_id_from_json(&raw),
            None => {
                entry.next_id = entry.next_id.saturating_add(1);
                RecordId::Int(entry.next_id)
            },
        };
        if entry.records.iter().any(|(existing, _)| *existing == id) {
            return Err(StorageError::Duplicate(format!(
                "E11000 duplicate key error collection: {collection} index: _id_ dup key: {id}"
            )));
        }
        for index in entry.indexes.iter().filter(|i| i.unique) {
            let fields = &index.fields;
            let candidate = canonical_key(&record, fields);
            if entry.records.iter().any(|(_, existing)| canonical_key(existing, fields) == candidate) {
                return Err(StorageError::Duplicate(format!(
                    "E11000 duplicate key error collection: {collection} index: {} dup key: {}",
                    index.name(),
                    GroupKeyValue(key_values(&record, fields))
                )));
            }
        }
        // Auto-assigned ids stay clear of explicit integer ids.
        if let RecordId::Int(n) = &id {
            entry.next_id = entry.next_id.max(*n);
        }
        entry.records.push((id.clone(), record));
        Ok(id)
    }
}
