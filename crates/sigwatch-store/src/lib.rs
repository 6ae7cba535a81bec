//! sigwatch-store - SQLite-backed signal store.
//!
//! A small key-indexed record store queried by prepared statements. All
//! rusqlite work runs on the blocking pool; the async surface is what the
//! poller and the REST endpoints call.

pub mod error;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::SqliteStore;
