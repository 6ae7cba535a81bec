//! Structured logging and Prometheus metrics for sigwatch.
//!
//! Observability is additive only: counters and logs never change the
//! externally visible behavior of the hub.

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
