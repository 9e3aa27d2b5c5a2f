//! Chat platform adapters for banter.
//!
//! Each adapter implements the `Channel` trait from core: it yields inbound
//! message events (with the platform's mention flag already resolved) and
//! carries replies back out. The gateway transport itself is the adapter's
//! concern; the pipeline never sees it.

pub mod discord;

pub use discord::{DiscordChannel, DiscordConfig};
