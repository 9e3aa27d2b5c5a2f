//! Lookup trait — the optional external web-lookup collaborator.
//!
//! Best effort by contract: any failure or timeout yields an empty context
//! fragment at the call site, never a pipeline failure.

use crate::error::LookupError;
use async_trait::async_trait;

#[async_trait]
pub trait Lookup: Send + Sync {
    /// A human-readable name for this lookup source (e.g., "duckduckgo").
    fn name(&self) -> &str;

    /// Look up a query, returning a short context fragment.
    ///
    /// An empty string is a valid "nothing found" answer.
    async fn lookup(&self, query: &str) -> std::result::Result<String, LookupError>;
}
