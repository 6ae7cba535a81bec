//! The state poller: fetch, detect, broadcast, sleep, repeat.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use sigwatch_core::SignalSource;
use sigwatch_telemetry::metrics::{BROADCASTS_TOTAL, POLL_CYCLES_TOTAL, POLL_ERRORS_TOTAL};

use crate::detect::snapshot_changed;
use crate::hub::Hub;

/// Run one poll cycle. Returns whether a broadcast pass happened.
///
/// Fetch errors are non-fatal and self-healing: the cycle is skipped, the
/// stored snapshot stays untouched, and the next cycle retries
/// unconditionally with no backoff.
pub async fn poll_once<S: SignalSource>(hub: &Hub, source: &S) -> bool {
    POLL_CYCLES_TOTAL.inc();

    let next = match source.fetch_all().await {
        Ok(next) => next,
        Err(e) => {
            POLL_ERRORS_TOTAL.inc();
            warn!(error = %e, "Store fetch failed, keeping previous snapshot");
            return false;
        }
    };

    let prev = hub.current_snapshot();
    if !snapshot_changed(&prev, &next) {
        trace!("No change detected");
        return false;
    }

    let next = Arc::new(next);
    let payload = match Hub::encode_document(&next) {
        Ok(payload) => payload,
        Err(e) => {
            // Keep the previous snapshot: the stored one must always be the
            // last detected-and-broadcast state.
            warn!(error = %e, "Failed to encode state document, skipping cycle");
            return false;
        }
    };

    hub.replace_snapshot(Arc::clone(&next));
    BROADCASTS_TOTAL.inc();
    debug!(
        signals = next.len(),
        subscribers = hub.registry().len(),
        "Change detected, broadcasting"
    );
    hub.broadcast(&payload);
    true
}

/// Run the poll loop for the lifetime of the hub.
///
/// There is no iteration cap and no cancellation signal: the loop ends only
/// when the owning task is torn down with the process.
pub async fn run_poller<S: SignalSource>(hub: Arc<Hub>, source: S, poll_interval: Duration) {
    info!(interval_ms = poll_interval.as_millis() as u64, "Starting state poller");

    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        poll_once(&hub, &source).await;
    }
}
