//! Index definitions for the rewards collections.
//!
//! Transfers:
//! - `{ "signature": 1 }` unique
//! - `{ "slot": 1 }`, `{ "timestamp": 1 }`
//! - `native_transfers.toUserAccount`, `native_transfers.amount`
//! - `token_transfers.toUserAccount`, `token_transfers.tokenAmount`, `token_transfers.mint`
//!
//! Wallet rewards:
//! - the seven-field reward tuple, unique
//! - `{ "wallet_address": 1, "distributor": 1 }`
//! - `signature`, `wallet_address`, `distributor`, `timestamp`, `slot`
//!
//! Supported projects and known tokens carry only their unique key
//! (`token_mint` and `mint`).

use std::fmt;

use serde::Serialize;

use crate::target::{FieldName, GroupKey, Preset};

/// Ascending index over one or more fields. Every index the rewards
/// collections carry is ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSpec {
    pub fields: Vec<FieldName>,
    pub unique: bool,
}

impl IndexSpec {
    /// Unique index over every field of the key.
    #[must_use]
    pub fn unique_on(key: &GroupKey) -> Self {
        Self { fields: key.fields().to_vec(), unique: true }
    }

    #[must_use]
    pub fn ascending(fields: &[FieldName]) -> Self {
        Self { fields: fields.to_vec(), unique: false }
    }

    /// Name MongoDB generates when none is given, e.g. `wallet_address_1_distributor_1`.
    #[must_use]
    pub fn name(&self) -> String {
        self.fields.iter().map(|field| format!("{field}_1")).collect::<Vec<_>>().join("_")
    }

    /// Whether this index covers exactly the given key, in order.
    #[must_use]
    pub fn covers(&self, key: &GroupKey) -> bool {
        self.fields == key.fields()
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())?;
        if self.unique {
            f.write_str(" (unique)")?;
        }
        Ok(())
    }
}

fn fields(names: &[&str]) -> Vec<FieldName> {
    names.iter().filter_map(|n| FieldName::new(*n).ok()).collect()
}

/// Full index set the ingestion service expects on a collection of this kind.
/// The unique natural-key index always comes first.
#[must_use]
pub fn index_layout(preset: Preset) -> Vec<IndexSpec> {
    let mut layout = vec![IndexSpec::unique_on(&preset.key())];
    let secondary: &[&[&str]] = match preset {
        Preset::Transfers => &[
            &["slot"],
            &["timestamp"],
            &["native_transfers.toUserAccount"],
            &["native_transfers.amount"],
            &["token_transfers.toUserAccount"],
            &["token_transfers.tokenAmount"],
            &["token_transfers.mint"],
        ],
        Preset::WalletRewards => &[
            &["wallet_address", "distributor"],
            &["signature"],
            &["wallet_address"],
            &["distributor"],
            &["timestamp"],
            &["slot"],
        ],
        Preset::SupportedProjects | Preset::KnownTokens => &[],
    };
    layout.extend(secondary.iter().map(|names| IndexSpec::ascending(&fields(names))));
    layout
}
