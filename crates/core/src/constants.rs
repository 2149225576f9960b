//! Shared constants for rewards-dedup.
//!
//! Collection names and field names used by the rewards ingestion service.

/// Database holding every rewards collection.
pub const DEFAULT_DATABASE: &str = "rewards_db";

/// Collection of per-wallet reward records.
pub const WALLET_REWARDS_COLLECTION: &str = "rewards_wallets";

/// Per-distributor transfer collections written by the ingestion service.
pub const KNOWN_TRANSFER_COLLECTIONS: [&str; 5] = [
    "boon_transfers",
    "distribute_transfers",
    "tnt_transfers",
    "iplr_transfers",
    "click_transfers",
];

/// Natural key of a transfer record.
pub const TRANSFER_KEY_FIELD: &str = "signature";

/// Natural key of a wallet reward record. The timestamp is part of the key,
/// so only exact full-tuple matches count as duplicates.
pub const WALLET_REWARD_KEY_FIELDS: [&str; 7] =
    ["wallet_address", "distributor", "signature", "slot", "timestamp", "token", "amount"];

/// Projects the ingestion service tracks, one per token mint.
pub const SUPPORTED_PROJECTS_COLLECTION: &str = "supported_projects";

/// Natural key of a supported project.
pub const SUPPORTED_PROJECT_KEY_FIELD: &str = "token_mint";

/// Token metadata cache, one record per mint.
pub const KNOWN_TOKENS_COLLECTION: &str = "known_tokens";

/// Natural key of a known token.
pub const KNOWN_TOKEN_KEY_FIELD: &str = "mint";

/// Field holding the record timestamp on every rewards collection.
pub const DEFAULT_TIMESTAMP_FIELD: &str = "timestamp";

/// Default upper bound on scan/delete passes before the unique index is built.
pub const DEFAULT_MAX_PASSES: u32 = 3;

/// Default MongoDB server selection timeout in seconds.
pub const DEFAULT_SERVER_TIMEOUT_SECS: u64 = 10;

/// Maximum colliding key values listed in a residual-duplicates error.
pub const MAX_REPORTED_COLLISIONS: usize = 20;

/// Application name reported to the MongoDB server.
pub const APP_NAME: &str = "rewards-dedup";
