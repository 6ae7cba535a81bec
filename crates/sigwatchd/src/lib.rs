//! sigwatchd - the signal hub daemon.
//!
//! Wires the SQLite store, the poll-detect-broadcast hub and the HTTP/WS
//! server together from a single TOML configuration file.

pub mod config;
pub mod error;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
