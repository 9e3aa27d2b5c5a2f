//! Record store implementations for banter.
//!
//! The store is the sole arbiter of durability: configuration, filter
//! rules, memory facts, admin identities, and the exchange log all live
//! here. Backends:
//! - **SQLite** — production, single file, WAL mode
//! - **Memory** — tests and ephemeral sessions

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub mod mem;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

pub use mem::MemStore;
