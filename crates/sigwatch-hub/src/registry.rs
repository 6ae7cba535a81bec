//! The live set of subscriber connections.
//!
//! Many writers (connect/disconnect events plus the dispatcher pruning
//! failed sends) and one bulk reader (the dispatcher's iteration). The
//! underlying map is mutex-guarded; the dispatcher takes a point-in-time
//! copy of the membership before sending so slow sends never hold the lock.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use sigwatch_telemetry::metrics::CONNECTED_SUBSCRIBERS;

/// Unique identity of one subscriber connection.
///
/// Never reused: each physical reconnection gets a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate the next connection id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outbound queue handle for one connection.
///
/// The hub only holds this sender; the transport itself is owned by the
/// server task pumping the paired receiver into the socket. A closed
/// channel means the connection is dead; a full channel means the consumer
/// is too slow and is dropped rather than throttled.
pub type OutboundSender = mpsc::Sender<Arc<str>>;

/// Mutex-guarded set of live subscriber connections.
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: Mutex<HashMap<ConnectionId, OutboundSender>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection.
    ///
    /// Registering an id that is already present replaces the stored sender,
    /// so a duplicate add never causes duplicate delivery.
    pub fn add(&self, id: ConnectionId, tx: OutboundSender) {
        let mut inner = self.inner.lock();
        if inner.insert(id, tx).is_none() {
            CONNECTED_SUBSCRIBERS.inc();
        }
        debug!(connection = %id, total = inner.len(), "Subscriber registered");
    }

    /// Deregister a connection. Removing an absent id is a no-op.
    pub fn remove(&self, id: ConnectionId) -> bool {
        let mut inner = self.inner.lock();
        let removed = inner.remove(&id).is_some();
        if removed {
            CONNECTED_SUBSCRIBERS.dec();
            debug!(connection = %id, total = inner.len(), "Subscriber deregistered");
        }
        removed
    }

    /// Point-in-time copy of the membership for a broadcast pass.
    pub fn connections(&self) -> Vec<(ConnectionId, OutboundSender)> {
        self.inner
            .lock()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let id = ConnectionId::next();
        let (tx, _rx) = mpsc::channel(4);

        registry.add(id, tx);
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert!(registry.is_empty());

        // Removing an id that was never present is also a no-op.
        assert!(!registry.remove(ConnectionId::next()));
    }

    #[test]
    fn duplicate_add_keeps_one_entry() {
        let registry = ConnectionRegistry::new();
        let id = ConnectionId::next();
        let (tx1, _rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel::<Arc<str>>(4);

        registry.add(id, tx1);
        registry.add(id, tx2);
        assert_eq!(registry.len(), 1);

        // The newest sender wins.
        let connections = registry.connections();
        connections[0].1.try_send(Arc::from("hello")).unwrap();
        assert_eq!(&*rx2.try_recv().unwrap(), "hello");
    }

    #[test]
    fn connection_ids_are_unique() {
        let a = ConnectionId::next();
        let b = ConnectionId::next();
        assert_ne!(a, b);
    }
}
