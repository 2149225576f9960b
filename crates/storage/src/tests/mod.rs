//! Test utilities and module declarations for storage tests.

use crate::{MemoryStore, RecordStore};
use serde_json::json;


pub const TRANSFERS: &str = "boon_transfers";

#[expect(clippy::unwrap_used, reason = "test code")]
pub async fn seed_transfers(store: &MemoryStore, rows: &[(i64, &str, i64)]) {
    for (id, signature, timestamp) in rows {
        store
            .insert_record(
                TRANSFERS,
                json!({ "_id": id, "signature": signature, "timestamp": timestamp, "slot": 1 }),
            )
            .await
            .unwrap();
    }
}
