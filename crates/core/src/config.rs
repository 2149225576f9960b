//! Connection and run settings resolved from flags, environment and defaults.

use std::fmt;
use std::time::Duration;

use crate::constants::{DEFAULT_DATABASE, DEFAULT_MAX_PASSES, DEFAULT_SERVER_TIMEOUT_SECS};
use crate::env_config::lookup_parse_with_default;
use crate::error::{CoreError, Result};

pub const ENV_MONGO_URL: &str = "MONGO_URL";
pub const ENV_MONGO_DB: &str = "MONGO_DB";
pub const ENV_MAX_PASSES: &str = "REWARDS_DEDUP_MAX_PASSES";
pub const ENV_SERVER_TIMEOUT_SECS: &str = "REWARDS_DEDUP_SERVER_TIMEOUT_SECS";

/// Where and how to reach the document store.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub uri: String,
    pub database: String,
    pub server_timeout: Duration,
}

impl StoreSettings {
    /// Resolve from the process environment. Explicit overrides win.
    pub fn from_env(uri: Option<String>, database: Option<String>) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), uri, database)
    }

    pub fn from_lookup<F>(lookup: F, uri: Option<String>, database: Option<String>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let uri = uri
            .or_else(|| lookup(ENV_MONGO_URL))
            .filter(|u| !u.trim().is_empty())
            .ok_or(CoreError::MissingTargetPart("connection string (--uri or MONGO_URL)"))?;
        let database = database
            .or_else(|| lookup(ENV_MONGO_DB))
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_owned());
        let timeout_secs =
            lookup_parse_with_default(&lookup, ENV_SERVER_TIMEOUT_SECS, DEFAULT_SERVER_TIMEOUT_SECS);
        Ok(Self { uri, database, server_timeout: Duration::from_secs(timeout_secs) })
    }

    /// Connection string with any `user:password@` section masked.
    #[must_use]
    pub fn redacted_uri(&self) -> String {
        redact_credentials(&self.uri)
    }
}

impl fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSettings")
            .field("uri", &self.redacted_uri())
            .field("database", &self.database)
            .field("server_timeout", &self.server_timeout)
            .finish()
    }
}

fn redact_credentials(uri: &str) -> String {
    let Some(scheme_end) = uri.find("://") else {
        return uri.to_owned();
    };
    let rest_start = scheme_end.saturating_add(3);
    let rest = &uri[rest_start..];
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{}***{}", &uri[..rest_start], &rest[at..]),
        None => uri.to_owned(),
    }
}

/// Knobs for a single deduplication run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupOptions {
    /// Scan and report only; delete nothing and leave indexes untouched.
    pub dry_run: bool,
    /// Upper bound on scan/delete passes before the unique index is built.
    pub max_passes: u32,
}

impl Default for DedupOptions {
    fn default() -> Self {
        Self { dry_run: false, max_passes: DEFAULT_MAX_PASSES }
    }
}

impl DedupOptions {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    #[must_use]
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let max_passes = lookup_parse_with_default(&lookup, ENV_MAX_PASSES, DEFAULT_MAX_PASSES);
        Self::default().with_max_passes(max_passes)
    }

    /// Clamp to at least one pass.
    #[must_use]
    pub fn with_max_passes(mut self, max_passes: u32) -> Self {
        if max_passes == 0 {
            tracing::warn!("max passes of 0 requested, running a single pass");
        }
        self.max_passes = max_passes.max(1);
        self
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
