//! BSON ↔ domain conversions.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use rewards_dedup_core::{RecordId, Timestamp};

use crate::error::StorageError;

pub(crate) fn record_id_from_bson(value: &Bson) -> RecordId {
    match value {
        Bson::ObjectId(oid) => RecordId::ObjectId(oid.to_hex()),
        Bson::Int32(n) => RecordId::Int(i64::from(*n)),
        Bson::Int64(n) => RecordId::Int(*n),
        Bson::String(s) => RecordId::Text(s.clone()),
        other => RecordId::Other(other.clone().into_canonical_extjson().to_string()),
    }
}

pub(crate) fn record_id_to_bson(id: &RecordId) -> Result<Bson, StorageError> {
    match id {
        RecordId::ObjectId(hex) => ObjectId::parse_str(hex)
            .map(Bson::ObjectId)
            .map_err(|e| StorageError::InvalidInput(format!("bad ObjectId {hex:?}: {e}"))),
        RecordId::Int(n) => Ok(Bson::Int64(*n)),
        RecordId::Text(s) => Ok(Bson::String(s.clone())),
        RecordId::Other(json) => {
            let value: serde_json::Value = serde_json::from_str(json)?;
            Bson::try_from(value).map_err(|e| StorageError::corrupt(format!("record id {json}"), e))
        },
    }
}

#[allow(clippy::cast_precision_loss, reason = "unix timestamps fit well inside f64 precision")]
pub(crate) fn timestamp_from_bson(value: Option<&Bson>) -> Timestamp {
    match value {
        None | Some(Bson::Null | Bson::Undefined) => Timestamp::Missing,
        Some(Bson::Int32(n)) => Timestamp::Numeric(f64::from(*n)),
        Some(Bson::Int64(n)) => Timestamp::Numeric(*n as f64),
        Some(Bson::Double(n)) => Timestamp::Numeric(*n),
        Some(Bson::Decimal128(d)) => {
            let text = d.to_string();
            text.parse().map_or(Timestamp::Text(text), Timestamp::Numeric)
        },
        Some(Bson::Timestamp(ts)) => Timestamp::Numeric(f64::from(ts.time)),
        Some(Bson::DateTime(dt)) => DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis())
            .map_or(Timestamp::Missing, Timestamp::Instant),
        Some(Bson::String(s)) => Timestamp::from_json(Some(&serde_json::Value::String(s.clone()))),
        Some(other) => Timestamp::Text(other.to_string()),
    }
}

pub(crate) fn bson_to_json(value: &Bson) -> serde_json::Value {
    value.clone().into_relaxed_extjson()
}

pub(crate) fn json_to_document(value: serde_json::Value) -> Result<Document, StorageError> {
    match Bson::try_from(value) {
        Ok(Bson::Document(doc)) => Ok(doc),
        Ok(other) => Err(StorageError::InvalidInput(format!(
            "record must be a JSON object, got {}",
            bson_to_json(&other)
        ))),
        Err(e) => Err(StorageError::InvalidInput(format!("record is not valid extended JSON: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::doc;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_object_id_round_trips_through_record_id() {
        let oid = ObjectId::new();
        let id = record_id_from_bson(&Bson::ObjectId(oid));
        assert_eq!(id, RecordId::ObjectId(oid.to_hex()));
        assert_eq!(record_id_to_bson(&id).unwrap(), Bson::ObjectId(oid));
    }

    #[test]
    fn test_exotic_id_keeps_its_type() {
        let original = Bson::Double(2.5);
        let id = record_id_from_bson(&original);
        assert!(matches!(id, RecordId::Other(_)));
        assert_eq!(record_id_to_bson(&id).unwrap(), original);
    }

    #[test]
    fn test_invalid_object_id_is_rejected() {
        let err = record_id_to_bson(&RecordId::ObjectId("nope".to_owned())).unwrap_err();
        assert!(matches!(err, StorageError::InvalidInput(_)));
    }

    #[test]
    fn test_timestamp_kinds() {
        assert_eq!(timestamp_from_bson(None), Timestamp::Missing);
        assert_eq!(timestamp_from_bson(Some(&Bson::Null)), Timestamp::Missing);
        assert_eq!(timestamp_from_bson(Some(&Bson::Int32(100))), Timestamp::Numeric(100.0));
        assert_eq!(
            timestamp_from_bson(Some(&Bson::Int64(1_700_000_000))),
            Timestamp::Numeric(1_700_000_000.0)
        );
        let now = mongodb::bson::DateTime::now();
        assert!(matches!(timestamp_from_bson(Some(&Bson::DateTime(now))), Timestamp::Instant(_)));
        assert!(matches!(
            timestamp_from_bson(Some(&Bson::String("2024-01-01T00:00:00Z".to_owned()))),
            Timestamp::Instant(_)
        ));
    }

    #[test]
    fn test_json_to_document() {
        let doc = json_to_document(json!({ "signature": "sig", "timestamp": 5 })).unwrap();
        assert_eq!(doc.get_str("signature").unwrap(), "sig");
        assert!(json_to_document(json!([1, 2])).is_err());
        assert_eq!(bson_to_json(&Bson::Document(doc! { "a": 1 })), json!({ "a": 1 }));
    }
}
