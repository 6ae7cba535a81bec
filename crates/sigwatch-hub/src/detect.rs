//! Snapshot change detection.

use sigwatch_core::Snapshot;

/// Decide whether a freshly fetched snapshot differs from the previous one.
///
/// Equality is full-mapping equality: the id sets must match in size and
/// membership, and for every shared id `status`, `distance_cm` and
/// `last_updated` must all compare equal. Any discrepancy, including a
/// cardinality change, counts as changed. The dispatcher always re-sends
/// the entire snapshot, never a delta.
pub fn snapshot_changed(prev: &Snapshot, next: &Snapshot) -> bool {
    if prev.len() != next.len() {
        return true;
    }
    next.iter()
        .any(|(id, signal)| prev.get(id).map_or(true, |p| p != signal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use sigwatch_core::{Signal, SignalId, SignalStatus};

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn signal(id: u32, status: SignalStatus, distance_cm: f64, updated: &str) -> Signal {
        Signal {
            id: SignalId(id),
            distance_cm,
            status,
            last_updated: ts(updated),
        }
    }

    fn snapshot(signals: Vec<Signal>) -> Snapshot {
        signals.into_iter().map(|s| (s.id, s)).collect()
    }

    #[test]
    fn identical_snapshots_are_unchanged() {
        let a = snapshot(vec![
            signal(1, SignalStatus::Red, 120.0, "2025-01-01 12:00:00"),
            signal(2, SignalStatus::Green, -1.0, "2025-01-01 12:00:01"),
        ]);
        let b = a.clone();
        assert!(!snapshot_changed(&a, &b));
    }

    #[test]
    fn empty_to_nonempty_is_changed() {
        let prev = Snapshot::new();
        let next = snapshot(vec![signal(1, SignalStatus::Red, 120.0, "2025-01-01 12:00:00")]);
        assert!(snapshot_changed(&prev, &next));
        // And back: vanished ids are a cardinality change.
        assert!(snapshot_changed(&next, &prev));
    }

    #[test]
    fn each_field_participates_in_equality() {
        let base = snapshot(vec![signal(1, SignalStatus::Red, 120.0, "2025-01-01 12:00:00")]);

        let status = snapshot(vec![signal(1, SignalStatus::Green, 120.0, "2025-01-01 12:00:00")]);
        assert!(snapshot_changed(&base, &status));

        let distance = snapshot(vec![signal(1, SignalStatus::Red, 121.0, "2025-01-01 12:00:00")]);
        assert!(snapshot_changed(&base, &distance));

        // Timestamp alone changing counts, even with identical readings.
        let updated = snapshot(vec![signal(1, SignalStatus::Red, 120.0, "2025-01-01 12:00:05")]);
        assert!(snapshot_changed(&base, &updated));

        // Fields changing without the timestamp moving also counts.
        let silent = snapshot(vec![signal(1, SignalStatus::Yellow, 120.0, "2025-01-01 12:00:00")]);
        assert!(snapshot_changed(&base, &silent));
    }

    #[test]
    fn same_size_different_membership_is_changed() {
        let a = snapshot(vec![signal(1, SignalStatus::Red, 120.0, "2025-01-01 12:00:00")]);
        let b = snapshot(vec![signal(2, SignalStatus::Red, 120.0, "2025-01-01 12:00:00")]);
        assert!(snapshot_changed(&a, &b));
    }

    #[test]
    fn zero_and_sentinel_distance_are_distinct() {
        let zero = snapshot(vec![signal(1, SignalStatus::Red, 0.0, "2025-01-01 12:00:00")]);
        let unknown = snapshot(vec![signal(1, SignalStatus::Red, -1.0, "2025-01-01 12:00:00")]);
        assert!(snapshot_changed(&zero, &unknown));
    }
}
