//! Records as seen by the deduplicator: identity, timestamp and key value.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comparable timestamp read from a record.
///
/// Variants are ordered `Missing < Numeric < Text < Instant`, so a record
/// carrying any timestamp outranks one without. Numerics compare with
/// `f64::total_cmp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Timestamp {
    Missing,
    Numeric(f64),
    Text(String),
    Instant(DateTime<Utc>),
}

impl Timestamp {
    const fn rank(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Numeric(_) => 1,
            Self::Text(_) => 2,
            Self::Instant(_) => 3,
        }
    }

    /// Interpret a JSON value the way the ingestion service writes timestamps:
    /// unix seconds as numbers, occasionally RFC 3339 strings.
    #[must_use]
    pub fn from_json(value: Option<&serde_json::Value>) -> Self {
        match value {
            None | Some(serde_json::Value::Null) => Self::Missing,
            Some(serde_json::Value::Number(n)) => n.as_f64().map_or(Self::Missing, Self::Numeric),
            Some(serde_json::Value::String(s)) => match DateTime::parse_from_rfc3339(s) {
                Ok(dt) => Self::Instant(dt.with_timezone(&Utc)),
                Err(_) => Self::Text(s.clone()),
            },
            Some(other) => Self::Text(other.to_string()),
        }
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Numeric(a), Self::Numeric(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Instant(a), Self::Instant(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timestamp {}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("<missing>"),
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Instant(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

/// Store-assigned record identity (`_id`).
///
/// Ordered by variant, then by value. ObjectId hex strings order by creation
/// time, so the greatest ObjectId is the most recently inserted record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RecordId {
    Int(i64),
    Text(String),
    ObjectId(String),
    /// Canonical extended JSON of any other identity type.
    Other(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::ObjectId(hex) => write!(f, "ObjectId(\"{hex}\")"),
            Self::Other(json) => f.write_str(json),
        }
    }
}

/// Identity and timestamp of one group member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub id: RecordId,
    pub timestamp: Timestamp,
}

impl RecordRef {
    #[must_use]
    pub fn new(id: RecordId, timestamp: Timestamp) -> Self {
        Self { id, timestamp }
    }
}

/// Values of the group key fields, in key order. Missing fields are `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKeyValue(pub Vec<serde_json::Value>);

impl fmt::Display for GroupKeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str(")")
    }
}

/// Records sharing one group key value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub key_value: GroupKeyValue,
    pub members: Vec<RecordRef>,
}

impl DuplicateGroup {
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        self.members.len() > 1
    }

    /// Number of records beyond the one that survives.
    #[must_use]
    pub fn surplus(&self) -> usize {
        self.members.len().saturating_sub(1)
    }
}
