//! Best-effort web lookup implementations for banter.
//!
//! Lookups enrich the prompt context and nothing more: any failure at this
//! layer becomes an empty fragment at the call site.

pub mod duckduckgo;
pub mod noop;

pub use duckduckgo::DuckDuckGoLookup;
pub use noop::NoopLookup;
