//! Record and rule value objects shared across the system.
//!
//! These flow between the pipeline, the record store, and the dashboard:
//! an inbound message produces (at most) one `ExchangeRecord`; filter rules
//! and memory facts are operator-curated rows read on every evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One completed exchange: what the user said and what the agent answered.
///
/// Append-only. Written once per finalized reply (including refusals,
/// redactions, and recovered model faults), never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRecord {
    /// Unique record ID
    pub id: String,

    /// Platform user ID of the speaker
    pub sender_id: String,

    /// Human-readable speaker name (if the platform provided one)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,

    /// The inbound text as received
    pub input: String,

    /// The delivered text (post-gate: possibly the refusal or redaction string)
    pub output: String,

    /// When the exchange was finalized
    pub created_at: DateTime<Utc>,
}

impl ExchangeRecord {
    /// Create a new record stamped with the current time.
    pub fn new(
        sender_id: impl Into<String>,
        sender_name: Option<String>,
        input: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender_id: sender_id.into(),
            sender_name,
            input: input.into(),
            output: output.into(),
            created_at: Utc::now(),
        }
    }
}

/// A durable per-user fact injected into every prompt for that user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryFact {
    /// Unique fact ID
    pub id: String,

    /// The platform user this fact is about
    pub user_id: String,

    /// The fact text
    pub fact: String,
}

impl MemoryFact {
    pub fn new(user_id: impl Into<String>, fact: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            fact: fact.into(),
        }
    }
}

/// Which side of the model call a filter rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterDirection {
    /// Checked against inbound text before any model call
    Input,
    /// Checked against generated text before send/log
    Output,
}

impl FilterDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

impl std::str::FromStr for FilterDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "input" => Ok(Self::Input),
            "output" => Ok(Self::Output),
            other => Err(format!("unknown filter direction '{other}'")),
        }
    }
}

/// A substring block pattern. Duplicates are harmless but wasteful, so no
/// uniqueness is enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRule {
    /// Unique rule ID
    pub id: String,

    /// Case-insensitive substring to match
    pub pattern: String,

    /// Which direction this rule gates
    pub direction: FilterDirection,
}

impl FilterRule {
    pub fn new(pattern: impl Into<String>, direction: FilterDirection) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            pattern: pattern.into(),
            direction,
        }
    }
}
