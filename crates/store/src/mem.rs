//! In-memory record store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use banter_core::error::StoreError;
use banter_core::message::{ExchangeRecord, FilterRule, MemoryFact};
use banter_core::store::RecordStore;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    config: HashMap<String, String>,
    filters: Vec<FilterRule>,
    facts: Vec<MemoryFact>,
    admins: Vec<String>,
    exchanges: Vec<ExchangeRecord>,
}

/// An in-memory store backed by a single RwLock.
///
/// Nothing survives a restart; that is the point.
pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn config_value(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.read().await.config.get(key).cloned())
    }

    async fn set_config_value(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .config
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn config_entries(&self) -> Result<Vec<(String, String)>, StoreError> {
        let inner = self.inner.read().await;
        let mut entries: Vec<(String, String)> = inner
            .config
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort();
        Ok(entries)
    }

    async fn filter_rules(&self) -> Result<Vec<FilterRule>, StoreError> {
        Ok(self.inner.read().await.filters.clone())
    }

    async fn add_filter_rule(&self, rule: FilterRule) -> Result<String, StoreError> {
        let id = rule.id.clone();
        self.inner.write().await.filters.push(rule);
        Ok(id)
    }

    async fn remove_filter_rule(&self, id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let len_before = inner.filters.len();
        inner.filters.retain(|r| r.id != id);
        Ok(inner.filters.len() < len_before)
    }

    async fn facts_for(&self, user_id: &str) -> Result<Vec<MemoryFact>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .facts
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn add_fact(&self, fact: MemoryFact) -> Result<String, StoreError> {
        let id = fact.id.clone();
        self.inner.write().await.facts.push(fact);
        Ok(id)
    }

    async fn remove_fact(&self, id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let len_before = inner.facts.len();
        inner.facts.retain(|f| f.id != id);
        Ok(inner.facts.len() < len_before)
    }

    async fn admins(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.inner.read().await.admins.clone())
    }

    async fn is_admin(&self, user_id: &str) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.admins.iter().any(|a| a == user_id))
    }

    async fn add_admin(&self, user_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.admins.iter().any(|a| a == user_id) {
            inner.admins.push(user_id.to_string());
        }
        Ok(())
    }

    async fn remove_admin(&self, user_id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let len_before = inner.admins.len();
        inner.admins.retain(|a| a != user_id);
        Ok(inner.admins.len() < len_before)
    }

    async fn append_exchange(&self, record: ExchangeRecord) -> Result<(), StoreError> {
        self.inner.write().await.exchanges.push(record);
        Ok(())
    }

    async fn recent_exchanges(&self, limit: usize) -> Result<Vec<ExchangeRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.exchanges.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banter_core::message::FilterDirection;

    #[tokio::test]
    async fn config_set_and_get() {
        let store = MemStore::new();
        store.set_config_value("personality", "friendly").await.unwrap();
        assert_eq!(
            store.config_value("personality").await.unwrap().as_deref(),
            Some("friendly")
        );
        assert!(store.config_value("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn filters_and_admins() {
        let store = MemStore::new();
        let id = store
            .add_filter_rule(FilterRule::new("x", FilterDirection::Output))
            .await
            .unwrap();
        assert_eq!(store.filter_rules().await.unwrap().len(), 1);
        assert!(store.remove_filter_rule(&id).await.unwrap());

        store.add_admin("a1").await.unwrap();
        store.add_admin("a1").await.unwrap();
        assert_eq!(store.admins().await.unwrap().len(), 1);
        assert!(store.is_admin("a1").await.unwrap());
    }

    #[tokio::test]
    async fn recent_exchanges_newest_first() {
        let store = MemStore::new();
        store
            .append_exchange(ExchangeRecord::new("u", None, "first", "a"))
            .await
            .unwrap();
        store
            .append_exchange(ExchangeRecord::new("u", None, "second", "b"))
            .await
            .unwrap();

        let recent = store.recent_exchanges(1).await.unwrap();
        assert_eq!(recent[0].input, "second");
    }
}
