//! What to deduplicate: collection, natural key and timestamp field.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_TIMESTAMP_FIELD, KNOWN_TOKEN_KEY_FIELD, KNOWN_TOKENS_COLLECTION,
    KNOWN_TRANSFER_COLLECTIONS, SUPPORTED_PROJECT_KEY_FIELD, SUPPORTED_PROJECTS_COLLECTION,
    TRANSFER_KEY_FIELD, WALLET_REWARD_KEY_FIELDS, WALLET_REWARDS_COLLECTION,
};
use crate::error::{CoreError, Result};

/// A validated document field path such as `signature` or `token_transfers.mint`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldName(String);

impl FieldName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let invalid = |reason| CoreError::InvalidFieldName { name: name.clone(), reason };
        if name.is_empty() {
            return Err(invalid("field name is empty"));
        }
        if name.starts_with('$') {
            return Err(invalid("field name must not start with '$'"));
        }
        if name.contains('\0') {
            return Err(invalid("field name must not contain NUL"));
        }
        if name.split('.').any(str::is_empty) {
            return Err(invalid("field path has an empty segment"));
        }
        Ok(Self(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FieldName {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<FieldName> for String {
    fn from(value: FieldName) -> Self {
        value.0
    }
}

impl FromStr for FieldName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s.trim())
    }
}

/// Ordered, non-empty, repeat-free list of fields forming a natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldName>", into = "Vec<FieldName>")]
pub struct GroupKey(Vec<FieldName>);

impl GroupKey {
    pub fn new(fields: Vec<FieldName>) -> Result<Self> {
        if fields.is_empty() {
            return Err(CoreError::EmptyKey);
        }
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].contains(field) {
                return Err(CoreError::RepeatedKeyField(field.to_string()));
            }
        }
        Ok(Self(fields))
    }

    /// Parse a list of raw field names.
    pub fn parse<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields = names.into_iter().map(|n| n.as_ref().parse()).collect::<Result<Vec<_>>>()?;
        Self::new(fields)
    }

    #[must_use]
    pub fn single(field: FieldName) -> Self {
        Self(vec![field])
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldName] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, field: &FieldName) -> bool {
        self.0.contains(field)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(field.as_str())?;
        }
        Ok(())
    }
}

impl TryFrom<Vec<FieldName>> for GroupKey {
    type Error = CoreError;

    fn try_from(value: Vec<FieldName>) -> Result<Self> {
        Self::new(value)
    }
}

impl From<GroupKey> for Vec<FieldName> {
    fn from(value: GroupKey) -> Self {
        value.0
    }
}

/// Validate a MongoDB collection name.
pub fn validate_collection(name: &str) -> Result<()> {
    let invalid = |reason| CoreError::InvalidCollection { name: name.to_owned(), reason };
    if name.trim().is_empty() {
        return Err(invalid("collection name is empty"));
    }
    if name.contains('$') {
        return Err(invalid("collection name must not contain '$'"));
    }
    if name.contains('\0') {
        return Err(invalid("collection name must not contain NUL"));
    }
    if name.starts_with("system.") {
        return Err(invalid("system collections are off limits"));
    }
    Ok(())
}

/// Known collection kinds with fixed key layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// Per-distributor transfer collections, keyed by transaction signature.
    Transfers,
    /// The `rewards_wallets` collection, keyed by the full reward tuple.
    WalletRewards,
    /// The `supported_projects` collection, keyed by `token_mint`.
    SupportedProjects,
    /// The `known_tokens` collection, keyed by `mint`.
    KnownTokens,
}

impl Preset {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transfers => "transfers",
            Self::WalletRewards => "wallet-rewards",
            Self::SupportedProjects => "supported-projects",
            Self::KnownTokens => "known-tokens",
        }
    }

    #[must_use]
    pub fn key(self) -> GroupKey {
        let names: &[&str] = match self {
            Self::Transfers => &[TRANSFER_KEY_FIELD],
            Self::WalletRewards => &WALLET_REWARD_KEY_FIELDS,
            Self::SupportedProjects => &[SUPPORTED_PROJECT_KEY_FIELD],
            Self::KnownTokens => &[KNOWN_TOKEN_KEY_FIELD],
        };
        GroupKey(names.iter().map(|n| FieldName((*n).to_owned())).collect())
    }

    #[must_use]
    pub const fn default_collection(self) -> Option<&'static str> {
        match self {
            Self::Transfers => None,
            Self::WalletRewards => Some(WALLET_REWARDS_COLLECTION),
            Self::SupportedProjects => Some(SUPPORTED_PROJECTS_COLLECTION),
            Self::KnownTokens => Some(KNOWN_TOKENS_COLLECTION),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "transfers" | "transfer" => Ok(Self::Transfers),
            "wallet-rewards" | "rewards-wallets" => Ok(Self::WalletRewards),
            "supported-projects" => Ok(Self::SupportedProjects),
            "known-tokens" => Ok(Self::KnownTokens),
            other => Err(CoreError::UnknownPreset(other.to_owned())),
        }
    }
}

/// One collection to deduplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupTarget {
    pub collection: String,
    pub key: GroupKey,
    pub timestamp_field: FieldName,
}

impl DedupTarget {
    pub fn new(collection: impl Into<String>, key: GroupKey, timestamp_field: FieldName) -> Result<Self> {
        let collection = collection.into();
        validate_collection(&collection)?;
        Ok(Self { collection, key, timestamp_field })
    }

    /// A transfer collection keyed on `signature`.
    pub fn transfers(collection: impl Into<String>) -> Result<Self> {
        Self::new(collection, Preset::Transfers.key(), default_timestamp_field())
    }

    /// The wallet reward collection keyed on the full reward tuple.
    #[must_use]
    pub fn wallet_rewards() -> Self {
        Self {
            collection: WALLET_REWARDS_COLLECTION.to_owned(),
            key: Preset::WalletRewards.key(),
            timestamp_field: default_timestamp_field(),
        }
    }

    /// Every transfer collection the ingestion service writes, then `rewards_wallets`.
    #[must_use]
    pub fn known_targets() -> Vec<Self> {
        KNOWN_TRANSFER_COLLECTIONS
            .iter()
            .map(|name| Self {
                collection: (*name).to_owned(),
                key: Preset::Transfers.key(),
                timestamp_field: default_timestamp_field(),
            })
            .chain(std::iter::once(Self::wallet_rewards()))
            .collect()
    }

    /// Build a target from optional parts. Preset values act as defaults,
    /// explicit parts override them.
    pub fn resolve(
        preset: Option<Preset>,
        collection: Option<String>,
        key: &[String],
        timestamp_field: Option<String>,
    ) -> Result<Self> {
        let collection = collection
            .filter(|c| !c.trim().is_empty())
            .or_else(|| preset.and_then(Preset::default_collection).map(str::to_owned))
            .ok_or(CoreError::MissingTargetPart("collection"))?;
        let key = if key.is_empty() {
            preset.map(Preset::key).ok_or(CoreError::MissingTargetPart("group key"))?
        } else {
            GroupKey::parse(key)?
        };
        let timestamp_field = match timestamp_field {
            Some(field) => field.parse()?,
            None => default_timestamp_field(),
        };
        Self::new(collection, key, timestamp_field)
    }
}

fn default_timestamp_field() -> FieldName {
    FieldName(DEFAULT_TIMESTAMP_FIELD.to_owned())
}

impl fmt::Display for DedupTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by ({}) latest {}", self.collection, self.key, self.timestamp_field)
    }
}
