use std::result::Result as StdResult;

use thiserror::Error;

/// Errors raised while building dedup targets and other domain values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid field name {name:?}: {reason}")]
    InvalidFieldName { name: String, reason: &'static str },

    #[error("invalid collection name {name:?}: {reason}")]
    InvalidCollection { name: String, reason: &'static str },

    #[error("group key must name at least one field")]
    EmptyKey,

    #[error("field {0:?} appears more than once in the group key")]
    RepeatedKeyField(String),

    #[error("missing {0}")]
    MissingTargetPart(&'static str),

    #[error("unknown preset {0:?} (expected one of: transfers, wallet-rewards, supported-projects, known-tokens)")]
    UnknownPreset(String),
}

pub type Result<T> = StdResult<T, CoreError>;
