//! SQLite record store.
//!
//! A single database file with five tables:
//! - `config`       — runtime configuration key/value pairs
//! - `filters`      — input/output block patterns
//! - `user_memory`  — per-user memory facts
//! - `admins`       — identities allowed to issue privileged commands
//! - `exchange_log` — append-only audit log of completed exchanges
//!
//! Concurrent readers (message pipelines) and writers (dashboard handlers)
//! share one pool; SQLite's transaction model guarantees every read sees a
//! committed value.

use async_trait::async_trait;
use banter_core::error::StoreError;
use banter_core::message::{ExchangeRecord, FilterRule, MemoryFact};
use banter_core::store::RecordStore;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// A production SQLite record store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the store at a file path.
    ///
    /// The database and all tables are created automatically.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite record store initialized at {path}");
        Ok(store)
    }

    /// Run schema migrations.
    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS config (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("config table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS filters (
                id        TEXT PRIMARY KEY,
                pattern   TEXT NOT NULL,
                direction TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("filters table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_memory (
                id      TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                fact    TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("user_memory table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_user_memory_user ON user_memory(user_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("user_memory index: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS admins (
                user_id TEXT PRIMARY KEY
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("admins table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS exchange_log (
                id          TEXT PRIMARY KEY,
                sender_id   TEXT NOT NULL,
                sender_name TEXT,
                input       TEXT NOT NULL,
                output      TEXT NOT NULL,
                created_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("exchange_log table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_exchange_log_created \
             ON exchange_log(created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("exchange_log index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Write a configuration value only if the key does not exist yet.
    ///
    /// Used by `banter init` so re-running it never clobbers dashboard edits.
    pub async fn seed_config_value(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT OR IGNORE INTO config (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("seed config: {e}")))?;
        Ok(())
    }

    fn row_to_rule(row: &sqlx::sqlite::SqliteRow) -> Result<FilterRule, StoreError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let pattern: String = row
            .try_get("pattern")
            .map_err(|e| StoreError::QueryFailed(format!("pattern column: {e}")))?;
        let direction_str: String = row
            .try_get("direction")
            .map_err(|e| StoreError::QueryFailed(format!("direction column: {e}")))?;
        let direction = direction_str
            .parse()
            .map_err(|e: String| StoreError::QueryFailed(e))?;

        Ok(FilterRule {
            id,
            pattern,
            direction,
        })
    }

    fn row_to_exchange(row: &sqlx::sqlite::SqliteRow) -> Result<ExchangeRecord, StoreError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let sender_id: String = row
            .try_get("sender_id")
            .map_err(|e| StoreError::QueryFailed(format!("sender_id column: {e}")))?;
        let sender_name: Option<String> = row
            .try_get("sender_name")
            .map_err(|e| StoreError::QueryFailed(format!("sender_name column: {e}")))?;
        let input: String = row
            .try_get("input")
            .map_err(|e| StoreError::QueryFailed(format!("input column: {e}")))?;
        let output: String = row
            .try_get("output")
            .map_err(|e| StoreError::QueryFailed(format!("output column: {e}")))?;
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::QueryFailed(format!("created_at column: {e}")))?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(ExchangeRecord {
            id,
            sender_id,
            sender_name,
            input,
            output,
            created_at,
        })
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn config_value(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT value FROM config WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("config read: {e}")))?;

        row.map(|r| {
            r.try_get("value")
                .map_err(|e| StoreError::QueryFailed(format!("value column: {e}")))
        })
        .transpose()
    }

    async fn set_config_value(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO config (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("config write: {e}")))?;
        Ok(())
    }

    async fn config_entries(&self) -> Result<Vec<(String, String)>, StoreError> {
        let rows = sqlx::query("SELECT key, value FROM config ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("config list: {e}")))?;

        rows.iter()
            .map(|r| {
                let key: String = r
                    .try_get("key")
                    .map_err(|e| StoreError::QueryFailed(format!("key column: {e}")))?;
                let value: String = r
                    .try_get("value")
                    .map_err(|e| StoreError::QueryFailed(format!("value column: {e}")))?;
                Ok((key, value))
            })
            .collect()
    }

    async fn filter_rules(&self) -> Result<Vec<FilterRule>, StoreError> {
        let rows = sqlx::query("SELECT id, pattern, direction FROM filters")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("filter list: {e}")))?;

        rows.iter().map(Self::row_to_rule).collect()
    }

    async fn add_filter_rule(&self, rule: FilterRule) -> Result<String, StoreError> {
        sqlx::query("INSERT INTO filters (id, pattern, direction) VALUES (?, ?, ?)")
            .bind(&rule.id)
            .bind(&rule.pattern)
            .bind(rule.direction.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("filter insert: {e}")))?;
        Ok(rule.id)
    }

    async fn remove_filter_rule(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM filters WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("filter delete: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    async fn facts_for(&self, user_id: &str) -> Result<Vec<MemoryFact>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, user_id, fact FROM user_memory WHERE user_id = ? ORDER BY rowid",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("fact list: {e}")))?;

        rows.iter()
            .map(|r| {
                let id: String = r
                    .try_get("id")
                    .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
                let user_id: String = r
                    .try_get("user_id")
                    .map_err(|e| StoreError::QueryFailed(format!("user_id column: {e}")))?;
                let fact: String = r
                    .try_get("fact")
                    .map_err(|e| StoreError::QueryFailed(format!("fact column: {e}")))?;
                Ok(MemoryFact { id, user_id, fact })
            })
            .collect()
    }

    async fn add_fact(&self, fact: MemoryFact) -> Result<String, StoreError> {
        sqlx::query("INSERT INTO user_memory (id, user_id, fact) VALUES (?, ?, ?)")
            .bind(&fact.id)
            .bind(&fact.user_id)
            .bind(&fact.fact)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("fact insert: {e}")))?;
        Ok(fact.id)
    }

    async fn remove_fact(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM user_memory WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("fact delete: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    async fn admins(&self) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT user_id FROM admins ORDER BY user_id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("admin list: {e}")))?;

        rows.iter()
            .map(|r| {
                r.try_get("user_id")
                    .map_err(|e| StoreError::QueryFailed(format!("user_id column: {e}")))
            })
            .collect()
    }

    async fn is_admin(&self, user_id: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM admins WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("admin check: {e}")))?;
        Ok(row.is_some())
    }

    async fn add_admin(&self, user_id: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT OR IGNORE INTO admins (user_id) VALUES (?)")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("admin insert: {e}")))?;
        Ok(())
    }

    async fn remove_admin(&self, user_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM admins WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("admin delete: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_exchange(&self, record: ExchangeRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO exchange_log (id, sender_id, sender_name, input, output, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.sender_id)
        .bind(&record.sender_name)
        .bind(&record.input)
        .bind(&record.output)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("exchange append: {e}")))?;
        Ok(())
    }

    async fn recent_exchanges(&self, limit: usize) -> Result<Vec<ExchangeRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, sender_id, sender_name, input, output, created_at \
             FROM exchange_log ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("exchange list: {e}")))?;

        rows.iter().map(Self::row_to_exchange).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banter_core::message::FilterDirection;
    use banter_core::store::keys;

    async fn temp_store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let store = SqliteStore::new(path.to_str().unwrap()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn config_roundtrip() {
        let (_dir, store) = temp_store().await;

        assert!(store.config_value(keys::PERSONALITY).await.unwrap().is_none());

        store
            .set_config_value(keys::PERSONALITY, "You are a pirate.")
            .await
            .unwrap();
        assert_eq!(
            store.config_value(keys::PERSONALITY).await.unwrap().as_deref(),
            Some("You are a pirate.")
        );

        // Replace, not append
        store
            .set_config_value(keys::PERSONALITY, "You are a librarian.")
            .await
            .unwrap();
        assert_eq!(
            store.config_value(keys::PERSONALITY).await.unwrap().as_deref(),
            Some("You are a librarian.")
        );
        assert_eq!(store.config_entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn seed_does_not_clobber() {
        let (_dir, store) = temp_store().await;

        store
            .set_config_value(keys::REPLY_CHANCE, "0.9")
            .await
            .unwrap();
        store.seed_config_value(keys::REPLY_CHANCE, "0.05").await.unwrap();

        assert_eq!(
            store.config_value(keys::REPLY_CHANCE).await.unwrap().as_deref(),
            Some("0.9")
        );
    }

    #[tokio::test]
    async fn filter_rule_crud() {
        let (_dir, store) = temp_store().await;

        let id = store
            .add_filter_rule(FilterRule::new("bomb", FilterDirection::Input))
            .await
            .unwrap();
        store
            .add_filter_rule(FilterRule::new("secret", FilterDirection::Output))
            .await
            .unwrap();

        let rules = store.filter_rules().await.unwrap();
        assert_eq!(rules.len(), 2);
        assert!(rules.iter().any(|r| r.pattern == "bomb"
            && r.direction == FilterDirection::Input));

        assert!(store.remove_filter_rule(&id).await.unwrap());
        assert!(!store.remove_filter_rule(&id).await.unwrap());
        assert_eq!(store.filter_rules().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn facts_scoped_per_user() {
        let (_dir, store) = temp_store().await;

        store
            .add_fact(MemoryFact::new("alice", "likes tea"))
            .await
            .unwrap();
        store
            .add_fact(MemoryFact::new("alice", "plays chess"))
            .await
            .unwrap();
        store.add_fact(MemoryFact::new("bob", "likes coffee")).await.unwrap();

        let alice = store.facts_for("alice").await.unwrap();
        assert_eq!(alice.len(), 2);
        assert_eq!(alice[0].fact, "likes tea");

        let bob = store.facts_for("bob").await.unwrap();
        assert_eq!(bob.len(), 1);

        assert!(store.facts_for("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn admin_membership() {
        let (_dir, store) = temp_store().await;

        assert!(!store.is_admin("alice").await.unwrap());
        store.add_admin("alice").await.unwrap();
        store.add_admin("alice").await.unwrap(); // idempotent
        assert!(store.is_admin("alice").await.unwrap());
        assert_eq!(store.admins().await.unwrap(), vec!["alice".to_string()]);

        assert!(store.remove_admin("alice").await.unwrap());
        assert!(!store.is_admin("alice").await.unwrap());
    }

    #[tokio::test]
    async fn exchange_log_is_append_only_and_ordered() {
        let (_dir, store) = temp_store().await;

        for i in 0..3 {
            store
                .append_exchange(ExchangeRecord::new(
                    "u1",
                    None,
                    format!("question {i}"),
                    format!("answer {i}"),
                ))
                .await
                .unwrap();
        }

        let recent = store.recent_exchanges(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        // Newest first
        assert_eq!(recent[0].input, "question 2");
        assert_eq!(recent[1].input, "question 1");
    }
}
