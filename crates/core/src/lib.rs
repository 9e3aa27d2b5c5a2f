//! # Banter Core
//!
//! Domain types, traits, and error definitions for the banter response agent.
//! This crate has **zero framework dependencies** — it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here — the chat platform,
//! the language model, the web lookup, and the record store. Implementations
//! live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod channel;
pub mod error;
pub mod lookup;
pub mod message;
pub mod provider;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use channel::{Channel, ChannelId, InboundMessage};
pub use error::{
    ChannelError, ConfigFault, Error, LookupError, ProviderError, Result, StoreError,
};
pub use lookup::Lookup;
pub use message::{ExchangeRecord, FilterDirection, FilterRule, MemoryFact};
pub use provider::{CompletionRequest, CompletionResponse, Provider, Usage};
pub use store::{RecordStore, keys};
