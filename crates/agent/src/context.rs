//! Context assembly — the exact prompt payload for one model call.
//!
//! Assembles the system instruction from four layers:
//!
//! 1. **Personality** (required configuration) — a missing key is a fault
//! 2. **Memory facts** for the author — best-effort enrichment
//! 3. **Recent turns** for the channel — read-only view of the history cache
//! 4. **Web lookup** — only when the input looks like it wants fresh facts,
//!    and only best-effort
//!
//! Assembly is a pure read-and-compose step: it never mutates history or
//! facts.

use crate::history::HistoryCache;
use banter_core::channel::ChannelId;
use banter_core::error::{ConfigFault, Error};
use banter_core::lookup::Lookup;
use banter_core::store::{RecordStore, keys};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Recency tokens that make an input worth a web lookup.
const LOOKUP_HINT_TOKENS: [&str; 6] = [
    "latest",
    "news",
    "today",
    "current",
    "recent",
    "happening",
];

/// Heuristic: does this input want external context?
///
/// Interrogatives and news-class tokens qualify; everything else skips the
/// lookup entirely.
pub fn wants_lookup(text: &str) -> bool {
    if text.contains('?') {
        return true;
    }
    let lower = text.to_lowercase();
    LOOKUP_HINT_TOKENS.iter().any(|t| lower.contains(t))
}

/// The composed payload handed to the provider.
#[derive(Debug, Clone)]
pub struct PromptParts {
    /// System-role instruction string
    pub system: String,
    /// User-role string (the raw input, untouched)
    pub user: String,
}

/// Assembles prompts from the store, the history cache, and the lookup.
pub struct ContextAssembler {
    store: Arc<dyn RecordStore>,
    lookup: Arc<dyn Lookup>,
    history: Arc<HistoryCache>,
    lookup_timeout: Duration,
}

impl ContextAssembler {
    pub fn new(
        store: Arc<dyn RecordStore>,
        lookup: Arc<dyn Lookup>,
        history: Arc<HistoryCache>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            store,
            lookup,
            history,
            lookup_timeout,
        }
    }

    /// Build the prompt pair for one inbound message.
    pub async fn assemble(
        &self,
        channel_id: &ChannelId,
        user_id: &str,
        input: &str,
    ) -> Result<PromptParts, Error> {
        // Memory facts are enrichment: a store hiccup here must not sink
        // the whole evaluation.
        let memories = match self.store.facts_for(user_id).await {
            Ok(facts) => facts
                .iter()
                .map(|f| f.fact.as_str())
                .collect::<Vec<_>>()
                .join(" | "),
            Err(e) => {
                warn!(user = %user_id, error = %e, "Memory fact read failed; continuing without");
                String::new()
            }
        };

        let personality = self
            .store
            .config_value(keys::PERSONALITY)
            .await?
            .ok_or_else(|| ConfigFault::MissingKey(keys::PERSONALITY.into()))?;

        let recent = self.history.render(channel_id);

        let lookup_context = if wants_lookup(input) {
            self.fetch_lookup(input).await
        } else {
            String::new()
        };

        let mut system = personality;
        if !memories.is_empty() {
            system.push_str("\n\nThings you remember about this user: ");
            system.push_str(&memories);
        }
        if !recent.is_empty() {
            system.push_str("\n\nRecent conversation:\n");
            system.push_str(&recent);
        }
        if !lookup_context.is_empty() {
            system.push_str("\n\nContext from a quick web lookup:\n");
            system.push_str(&lookup_context);
        }

        Ok(PromptParts {
            system,
            user: input.to_string(),
        })
    }

    /// Run the lookup under its timeout; any failure is an empty fragment.
    async fn fetch_lookup(&self, query: &str) -> String {
        match tokio::time::timeout(self.lookup_timeout, self.lookup.lookup(query)).await {
            Ok(Ok(fragment)) => fragment,
            Ok(Err(e)) => {
                debug!(error = %e, "Lookup failed; continuing without web context");
                String::new()
            }
            Err(_) => {
                debug!("Lookup timed out; continuing without web context");
                String::new()
            }
        }
    }
}
