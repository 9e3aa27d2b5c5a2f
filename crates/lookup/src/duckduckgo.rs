//! DuckDuckGo Instant Answer lookup.
//!
//! Uses the public JSON API (`api.duckduckgo.com?format=json`). The answer
//! quality varies; we take the abstract when present and fall back to the
//! first few related-topic snippets.

use async_trait::async_trait;
use banter_core::error::LookupError;
use banter_core::lookup::Lookup;
use serde::Deserialize;
use tracing::debug;

/// How many related-topic snippets to include when there is no abstract.
const MAX_TOPICS: usize = 3;

pub struct DuckDuckGoLookup {
    base_url: String,
    client: reqwest::Client,
}

impl DuckDuckGoLookup {
    pub fn new(timeout_secs: u64) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LookupError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: "https://api.duckduckgo.com".into(),
            client,
        })
    }

    /// Override the API endpoint (for tests against a local server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Flatten an instant-answer response into a short context fragment.
    fn summarize(answer: InstantAnswer) -> String {
        if !answer.abstract_text.is_empty() {
            return answer.abstract_text;
        }

        let snippets: Vec<String> = answer
            .related_topics
            .into_iter()
            .filter_map(|t| t.text)
            .filter(|t| !t.is_empty())
            .take(MAX_TOPICS)
            .collect();

        snippets.join(" | ")
    }
}

#[async_trait]
impl Lookup for DuckDuckGoLookup {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn lookup(&self, query: &str) -> std::result::Result<String, LookupError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LookupError::Timeout(e.to_string())
                } else {
                    LookupError::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(LookupError::Network(format!(
                "Lookup endpoint returned status {}",
                response.status()
            )));
        }

        let answer: InstantAnswer = response
            .json()
            .await
            .map_err(|e| LookupError::Malformed(e.to_string()))?;

        let fragment = Self::summarize(answer);
        debug!(query_len = query.len(), fragment_len = fragment.len(), "Lookup complete");
        Ok(fragment)
    }
}

// --- API wire types ---

#[derive(Deserialize)]
struct InstantAnswer {
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,

    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Deserialize)]
struct RelatedTopic {
    #[serde(rename = "Text", default)]
    text: Option<String>,
}
