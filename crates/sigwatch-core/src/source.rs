//! The fetch seam between the poller and the external store.

use std::future::Future;

use crate::signal::Snapshot;

/// Source of signal state, polled by the hub on a fixed cadence.
///
/// Implemented by the SQLite store in production and by scripted fakes in
/// the hub's tests. A fetch either yields the complete current state or
/// fails as a whole; a malformed row must fail the fetch rather than be
/// partially trusted.
pub trait SignalSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the current state of all signals.
    fn fetch_all(&self) -> impl Future<Output = Result<Snapshot, Self::Error>> + Send;
}
