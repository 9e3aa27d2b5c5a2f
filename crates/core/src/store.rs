//! RecordStore trait — durable storage for everything the agent shares with
//! the admin surface.
//!
//! The store owns Configuration, Filter Rules, Memory Facts, Admin
//! Identities, and the append-only Exchange Log. It is read concurrently by
//! message pipelines and written concurrently by dashboard handlers; every
//! read observes a committed value, and the pipeline re-reads rather than
//! caching across a suspension point.

use crate::error::{ConfigFault, StoreError};
use crate::message::{ExchangeRecord, FilterRule, MemoryFact};
use async_trait::async_trait;

/// The fixed set of runtime configuration keys.
///
/// Absence of a required key at evaluation time is a `ConfigFault`, not a
/// silent default.
pub mod keys {
    /// The system personality prompt.
    pub const PERSONALITY: &str = "personality";
    /// Probability in [0,1] of an ambient (non-mention) reply.
    pub const REPLY_CHANCE: &str = "reply_chance";
    /// Which model the provider should be asked for.
    pub const MODEL_ID: &str = "model_id";

    /// Every key the dashboard may write.
    pub const ALL: [&str; 3] = [PERSONALITY, REPLY_CHANCE, MODEL_ID];

    /// Keys that must exist for the pipeline to evaluate a message.
    pub const REQUIRED: [&str; 3] = [PERSONALITY, REPLY_CHANCE, MODEL_ID];
}

/// Parse a stored reply-chance value into a probability.
///
/// The invariant is enforced at both ends: the dashboard rejects writes
/// that fail this parse, and a value that slips through anyway is a
/// configuration fault for the single evaluation that read it — never a
/// silent zero and never a process crash.
pub fn parse_reply_chance(raw: &str) -> std::result::Result<f64, ConfigFault> {
    let chance: f64 = raw.trim().parse().map_err(|_| ConfigFault::Invalid {
        key: keys::REPLY_CHANCE.into(),
        value: raw.into(),
        reason: "not a number".into(),
    })?;

    if !(0.0..=1.0).contains(&chance) {
        return Err(ConfigFault::Invalid {
            key: keys::REPLY_CHANCE.into(),
            value: raw.into(),
            reason: "not a probability in [0,1]".into(),
        });
    }

    Ok(chance)
}

/// The core RecordStore trait.
///
/// Implementations: SQLite (production), in-memory (tests/ephemeral).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "memory").
    fn name(&self) -> &str;

    // --- Configuration ---

    /// Read a single configuration value.
    async fn config_value(&self, key: &str) -> std::result::Result<Option<String>, StoreError>;

    /// Insert or replace a configuration value.
    async fn set_config_value(
        &self,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), StoreError>;

    /// List all configuration entries (dashboard view).
    async fn config_entries(&self) -> std::result::Result<Vec<(String, String)>, StoreError>;

    // --- Filter rules ---

    /// All filter rules, both directions.
    async fn filter_rules(&self) -> std::result::Result<Vec<FilterRule>, StoreError>;

    /// Add a rule; returns its id.
    async fn add_filter_rule(&self, rule: FilterRule) -> std::result::Result<String, StoreError>;

    /// Remove a rule by id. Returns whether a row existed.
    async fn remove_filter_rule(&self, id: &str) -> std::result::Result<bool, StoreError>;

    // --- Memory facts ---

    /// All facts recorded for a user, oldest first.
    async fn facts_for(&self, user_id: &str)
    -> std::result::Result<Vec<MemoryFact>, StoreError>;

    /// Record a fact; returns its id.
    async fn add_fact(&self, fact: MemoryFact) -> std::result::Result<String, StoreError>;

    /// Remove a fact by id. Returns whether a row existed.
    async fn remove_fact(&self, id: &str) -> std::result::Result<bool, StoreError>;

    // --- Admin identities ---

    /// All admin user ids.
    async fn admins(&self) -> std::result::Result<Vec<String>, StoreError>;

    /// Whether a user may issue privileged commands.
    async fn is_admin(&self, user_id: &str) -> std::result::Result<bool, StoreError>;

    /// Grant admin to a user id (idempotent).
    async fn add_admin(&self, user_id: &str) -> std::result::Result<(), StoreError>;

    /// Revoke admin. Returns whether a row existed.
    async fn remove_admin(&self, user_id: &str) -> std::result::Result<bool, StoreError>;

    // --- Exchange log ---

    /// Append one completed exchange. Never updates or deletes.
    async fn append_exchange(
        &self,
        record: ExchangeRecord,
    ) -> std::result::Result<(), StoreError>;

    /// The most recent `limit` exchanges, newest first.
    async fn recent_exchanges(
        &self,
        limit: usize,
    ) -> std::result::Result<Vec<ExchangeRecord>, StoreError>;
}
