//! Error types for the banter domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. The taxonomy matters for
//! recovery: a `ConfigFault` or `ProviderError` aborts (or is recovered
//! within) a single message evaluation, a `LookupError` is swallowed into an
//! empty context fragment, and none of them may take down the process.

use thiserror::Error;

/// The top-level error type for all banter operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Configuration faults (runtime keys, not startup config) ---
    #[error("Configuration fault: {0}")]
    Config(#[from] ConfigFault),

    // --- Remote model errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Web lookup errors ---
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    // --- Record store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Channel errors ---
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// A required runtime configuration key is missing or unusable.
///
/// These surface to operators through logs and abort the single in-flight
/// message evaluation. They are never a reason to crash message handling or
/// to substitute a silent default.
#[derive(Debug, Clone, Error)]
pub enum ConfigFault {
    #[error("Required configuration key missing: {0}")]
    MissingKey(String),

    #[error("Configuration key '{key}' has unusable value {value:?}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Best-effort web lookup failures — always recovered into empty context.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    #[error("Lookup request failed: {0}")]
    Network(String),

    #[error("Lookup timed out: {0}")]
    Timeout(String),

    #[error("Lookup response unusable: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    #[error("Message delivery failed to {channel}: {reason}")]
    DeliveryFailed { channel: String, reason: String },

    #[error("Channel connection lost: {0}")]
    ConnectionLost(String),
}
