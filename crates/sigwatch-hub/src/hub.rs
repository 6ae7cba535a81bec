//! Shared hub state: the last broadcast snapshot and the broadcast pass.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, trace, warn};

use sigwatch_core::{Snapshot, StateDocument};
use sigwatch_telemetry::metrics::SEND_FAILURES_TOTAL;

use crate::error::HubResult;
use crate::registry::ConnectionRegistry;

/// The long-lived hub instance.
///
/// Holds the last detected-and-broadcast snapshot (single writer: the
/// poller; readers: the dispatcher and the REST snapshot endpoint) and the
/// registry of live subscriber connections. The snapshot is replaced, never
/// mutated in place, so readers always see a fully consistent version.
pub struct Hub {
    snapshot: RwLock<Arc<Snapshot>>,
    registry: ConnectionRegistry,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(Snapshot::new())),
            registry: ConnectionRegistry::new(),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// The most recently detected-and-broadcast snapshot.
    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().clone()
    }

    /// Serialize the current snapshot into the wire document.
    pub fn current_document(&self) -> HubResult<String> {
        let snapshot = self.current_snapshot();
        Ok(serde_json::to_string(&StateDocument {
            signals: &snapshot,
            generated_at_ms: Utc::now().timestamp_millis(),
        })?)
    }

    /// Replace the stored snapshot. The lock is held only for the pointer
    /// swap, never for serialization.
    pub(crate) fn replace_snapshot(&self, next: Arc<Snapshot>) {
        *self.snapshot.write() = next;
    }

    /// Encode the given snapshot once into the canonical wire document
    /// shared by all sends of a broadcast pass.
    pub(crate) fn encode_document(snapshot: &Snapshot) -> HubResult<Arc<str>> {
        let json = serde_json::to_string(&StateDocument {
            signals: snapshot,
            generated_at_ms: Utc::now().timestamp_millis(),
        })?;
        Ok(Arc::from(json))
    }

    /// One broadcast pass: push the document to every registered connection.
    ///
    /// A failed or backed-up send deregisters that connection immediately
    /// and the pass continues with the rest; one bad subscriber never
    /// prevents delivery to the others. Failed sends are not retried; the
    /// subscriber must reconnect.
    pub fn broadcast(&self, payload: &Arc<str>) {
        let connections = self.registry.connections();
        if connections.is_empty() {
            trace!("No subscribers registered, skipping broadcast");
            return;
        }

        for (id, tx) in connections {
            match tx.try_send(payload.clone()) {
                Ok(()) => {}
                Err(TrySendError::Closed(_)) => {
                    debug!(connection = %id, "Subscriber gone, pruning");
                    SEND_FAILURES_TOTAL.inc();
                    self.registry.remove(id);
                }
                Err(TrySendError::Full(_)) => {
                    warn!(connection = %id, "Subscriber queue full, dropping slow consumer");
                    SEND_FAILURES_TOTAL.inc();
                    self.registry.remove(id);
                }
            }
        }
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}
