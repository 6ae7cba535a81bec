//! Prometheus metrics for the signal hub.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means a duplicate metric name, which should crash at startup rather than
//! fail silently. These panics only occur during static initialization.

use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_gauge, IntCounter, IntGauge};

/// Total poll cycles attempted against the store.
pub static POLL_CYCLES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("sigwatch_poll_cycles_total", "Total store poll cycles").unwrap()
});

/// Total poll cycles that failed (store unreachable, malformed row).
pub static POLL_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("sigwatch_poll_errors_total", "Total failed store poll cycles").unwrap()
});

/// Total broadcast passes triggered by a detected change.
pub static BROADCASTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "sigwatch_broadcasts_total",
        "Total change-triggered broadcast passes"
    )
    .unwrap()
});

/// Total per-connection send failures observed during broadcast passes.
pub static SEND_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "sigwatch_send_failures_total",
        "Total failed subscriber sends (connection pruned)"
    )
    .unwrap()
});

/// Total non-upgrade requests rejected at the streaming endpoint.
pub static HANDSHAKE_REJECTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "sigwatch_handshake_rejects_total",
        "Total non-WebSocket requests rejected with 426"
    )
    .unwrap()
});

/// Currently registered subscriber connections.
pub static CONNECTED_SUBSCRIBERS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "sigwatch_connected_subscribers",
        "Currently registered subscriber connections"
    )
    .unwrap()
});
