//! Aggregation pipeline that finds duplicate groups.
//!
//! Key fields are projected into positional slots (`k0`, `k1`, ...) because
//! `$group` `_id` sub-document keys cannot contain dots. Each slot is wrapped
//! in `$ifNull` so a missing field groups with an explicit `null`, the same
//! way a unique index sees it.

use mongodb::bson::{doc, Bson, Document};
use rewards_dedup_core::{DedupTarget, DuplicateGroup, GroupKeyValue, RecordRef};

use super::convert::{bson_to_json, record_id_from_bson, timestamp_from_bson};
use crate::error::StorageError;

fn key_slot(index: usize) -> String {
    format!("k{index}")
}

pub(crate) fn duplicate_groups_pipeline(target: &DedupTarget) -> Vec<Document> {
    let mut group_id = Document::new();
    for (i, field) in target.key.fields().iter().enumerate() {
        group_id.insert(key_slot(i), doc! { "$ifNull": [format!("${field}"), Bson::Null] });
    }
    vec![
        doc! {
            "$group": {
                "_id": group_id,
                "count": { "$sum": 1 },
                "docs": {
                    "$push": {
                        "id": "$_id",
                        "ts": format!("${}", target.timestamp_field),
                    },
                },
            },
        },
        doc! { "$match": { "count": { "$gt": 1 } } },
        doc! { "$sort": { "_id": 1 } },
    ]
}

pub(crate) fn parse_group(doc: &Document, key_len: usize) -> Result<DuplicateGroup, StorageError> {
    let group_id = doc.get_document("_id").map_err(|e| StorageError::corrupt("group _id", e))?;
    let key_value = GroupKeyValue(
        (0..key_len)
            .map(|i| group_id.get(key_slot(i)).map_or(serde_json::Value::Null, bson_to_json))
            .collect(),
    );

    let docs = doc.get_array("docs").map_err(|e| StorageError::corrupt("group docs", e))?;
    let mut members = Vec::with_capacity(docs.len());
    for entry in docs {
        let Bson::Document(member) = entry else {
            return Err(StorageError::InvalidInput(format!(
                "group member is not a document: {}",
                bson_to_json(entry)
            )));
        };
        let id = member.get("id").ok_or_else(|| {
            StorageError::InvalidInput(format!("group member without _id in {key_value}"))
        })?;
        let timestamp = timestamp_from_bson(member.get("ts"));
        members.push(RecordRef::new(record_id_from_bson(id), timestamp));
    }
    Ok(DuplicateGroup { key_value, members })
}

#[cfg(test)]
mod tests {
    use mongodb::bson::oid::ObjectId;
    use rewards_dedup_core::{RecordId, Timestamp};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_pipeline_groups_on_positional_slots() {
        let pipeline = duplicate_groups_pipeline(&DedupTarget::wallet_rewards());
        assert_eq!(pipeline.len(), 3);

        let group = pipeline[0].get_document("$group").unwrap();
        let id = group.get_document("_id").unwrap();
        assert_eq!(id.len(), 7);
        assert_eq!(id.get_document("k0").unwrap(), &doc! { "$ifNull": ["$wallet_address", null] });
        assert_eq!(id.get_document("k6").unwrap(), &doc! { "$ifNull": ["$amount", null] });

        let push = group.get_document("docs").unwrap().get_document("$push").unwrap();
        assert_eq!(push.get_str("id").unwrap(), "$_id");
        assert_eq!(push.get_str("ts").unwrap(), "$timestamp");

        let matcher = pipeline[1].get_document("$match").unwrap();
        assert_eq!(matcher, &doc! { "count": { "$gt": 1 } });
    }

    #[test]
    fn test_pipeline_handles_dotted_fields() {
        let target = DedupTarget::resolve(
            None,
            Some("boon_transfers".to_owned()),
            &["token_transfers.mint".to_owned()],
            None,
        )
        .unwrap();
        let pipeline = duplicate_groups_pipeline(&target);
        let id = pipeline[0].get_document("$group").unwrap().get_document("_id").unwrap();
        assert_eq!(
            id.get_document("k0").unwrap(),
            &doc! { "$ifNull": ["$token_transfers.mint", null] }
        );
    }

    #[test]
    fn test_every_slot_folds_missing_into_null() {
        let pipeline = duplicate_groups_pipeline(&DedupTarget::transfers("boon_transfers").unwrap());
        let id = pipeline[0].get_document("$group").unwrap().get_document("_id").unwrap();
        for (_, slot) in id {
            let Bson::Document(expr) = slot else {
                panic!("slot should be an expression document, got {slot}");
            };
            let args = expr.get_array("$ifNull").unwrap();
            assert_eq!(args.len(), 2);
            assert_eq!(args[1], Bson::Null);
        }
    }

    #[test]
    fn test_parse_group() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        let raw = doc! {
            "_id": { "k0": "5xSig" },
            "count": 2,
            "docs": [
                { "id": a, "ts": 100_i64 },
                { "id": b },
            ],
        };
        let group = parse_group(&raw, 1).unwrap();
        assert_eq!(group.key_value, GroupKeyValue(vec![json!("5xSig")]));
        assert_eq!(group.members.len(), 2);
        assert_eq!(group.members[0].id, RecordId::ObjectId(a.to_hex()));
        assert_eq!(group.members[0].timestamp, Timestamp::Numeric(100.0));
        assert_eq!(group.members[1].timestamp, Timestamp::Missing);
    }

    #[test]
    fn test_parse_group_missing_key_field_is_null() {
        let raw = doc! { "_id": { "k0": "w1" }, "count": 2, "docs": [ { "id": 1 }, { "id": 2 } ] };
        let group = parse_group(&raw, 2).unwrap();
        assert_eq!(group.key_value, GroupKeyValue(vec![json!("w1"), serde_json::Value::Null]));
    }

    #[test]
    fn test_parse_group_rejects_malformed_output() {
        let no_docs = doc! { "_id": { "k0": "x" }, "count": 2 };
        assert!(matches!(parse_group(&no_docs, 1), Err(StorageError::DataCorruption { .. })));

        let bad_member = doc! { "_id": { "k0": "x" }, "docs": [ 5 ] };
        assert!(matches!(parse_group(&bad_member, 1), Err(StorageError::InvalidInput(_))));
    }
}
