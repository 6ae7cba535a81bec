//! SQLite store access.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, Row};
use std::path::Path;
use tracing::debug;

use sigwatch_core::{Signal, SignalId, SignalPatch, SignalSource, Snapshot};

use crate::error::{StoreError, StoreResult};

/// Table DDL plus the seed row the reference deployment starts from.
const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS signals (
    id INTEGER PRIMARY KEY,
    distance_cm REAL NOT NULL DEFAULT -1,
    status TEXT NOT NULL DEFAULT 'red' CHECK (status IN ('red', 'yellow', 'green')),
    last_updated TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
INSERT OR IGNORE INTO signals (id, distance_cm, status) VALUES (1, -1, 'red');
";

const SELECT_COLUMNS: &str = "id, distance_cm, status, last_updated";

/// Pooled SQLite store for signal rows.
///
/// Cheap to clone; all statement execution happens on the blocking pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().build(manager)?;
        Ok(Self { pool })
    }

    /// Create the signals table and seed row if missing.
    pub async fn init_schema(&self) -> StoreResult<()> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> StoreResult<()> {
            let conn = pool.get()?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await??;
        debug!("Signal schema ready");
        Ok(())
    }

    /// Fetch the current state of all signals.
    ///
    /// A malformed row fails the whole fetch; the caller treats it like any
    /// other transient store failure rather than trusting a partial result.
    pub async fn fetch_all(&self) -> StoreResult<Snapshot> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> StoreResult<Snapshot> {
            let conn = pool.get()?;
            let mut stmt =
                conn.prepare_cached(&format!("SELECT {SELECT_COLUMNS} FROM signals"))?;
            let rows = stmt.query_map([], row_to_signal)?;

            let mut snapshot = Snapshot::new();
            for row in rows {
                let signal = row?;
                snapshot.insert(signal.id, signal);
            }
            Ok(snapshot)
        })
        .await?
    }

    /// Fetch one signal by id.
    pub async fn fetch_one(&self, id: SignalId) -> StoreResult<Option<Signal>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> StoreResult<Option<Signal>> {
            let conn = pool.get()?;
            let mut stmt = conn
                .prepare_cached(&format!("SELECT {SELECT_COLUMNS} FROM signals WHERE id = ?1"))?;
            Ok(stmt.query_row([id.0], row_to_signal).optional()?)
        })
        .await?
    }

    /// Apply a partial update to one signal.
    ///
    /// `last_updated` is always bumped to `CURRENT_TIMESTAMP` by the store;
    /// the updated row is returned, or `None` if the id does not exist.
    /// Validation of the patch happens at the request boundary, before this
    /// call.
    pub async fn update(&self, id: SignalId, patch: SignalPatch) -> StoreResult<Option<Signal>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> StoreResult<Option<Signal>> {
            let mut sets = Vec::new();
            let mut params: Vec<Value> = Vec::new();

            if let Some(status) = patch.status {
                params.push(Value::Text(status.as_str().to_string()));
                sets.push(format!("status = ?{}", params.len()));
            }
            if let Some(distance_cm) = patch.distance_cm {
                params.push(Value::Real(distance_cm));
                sets.push(format!("distance_cm = ?{}", params.len()));
            }
            sets.push("last_updated = CURRENT_TIMESTAMP".to_string());

            params.push(Value::Integer(i64::from(id.0)));
            let sql = format!(
                "UPDATE signals SET {} WHERE id = ?{} RETURNING {SELECT_COLUMNS}",
                sets.join(", "),
                params.len()
            );

            let conn = pool.get()?;
            let mut stmt = conn.prepare(&sql)?;
            Ok(stmt
                .query_row(rusqlite::params_from_iter(params), row_to_signal)
                .optional()?)
        })
        .await?
    }
}

/// Map one row to a `Signal`, failing on unexpected content.
fn row_to_signal(row: &Row<'_>) -> rusqlite::Result<Signal> {
    let status_text: String = row.get(2)?;
    let status = status_text.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Signal {
        id: SignalId(row.get(0)?),
        distance_cm: row.get(1)?,
        status,
        last_updated: row.get(3)?,
    })
}

impl SignalSource for SqliteStore {
    type Error = StoreError;

    async fn fetch_all(&self) -> Result<Snapshot, Self::Error> {
        SqliteStore::fetch_all(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigwatch_core::{SignalStatus, DISTANCE_UNKNOWN};
    use tempfile::TempDir;

    async fn open_store() -> (TempDir, SqliteStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path().join("signals.db")).unwrap();
        store.init_schema().await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn schema_seeds_one_red_signal() {
        let (_dir, store) = open_store().await;

        let snapshot = store.fetch_all().await.unwrap();
        assert_eq!(snapshot.len(), 1);

        let signal = &snapshot[&SignalId(1)];
        assert_eq!(signal.status, SignalStatus::Red);
        assert_eq!(signal.distance_cm, DISTANCE_UNKNOWN);
    }

    #[tokio::test]
    async fn init_schema_is_idempotent() {
        let (_dir, store) = open_store().await;
        store.init_schema().await.unwrap();
        assert_eq!(store.fetch_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_bumps_fields_and_timestamp() {
        let (_dir, store) = open_store().await;

        let updated = store
            .update(
                SignalId(1),
                SignalPatch {
                    status: Some(SignalStatus::Green),
                    distance_cm: Some(42.5),
                },
            )
            .await
            .unwrap()
            .expect("seed row exists");

        assert_eq!(updated.status, SignalStatus::Green);
        assert_eq!(updated.distance_cm, 42.5);

        let fetched = store.fetch_one(SignalId(1)).await.unwrap().unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn partial_update_leaves_other_fields() {
        let (_dir, store) = open_store().await;

        let updated = store
            .update(
                SignalId(1),
                SignalPatch {
                    status: Some(SignalStatus::Yellow),
                    distance_cm: None,
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.status, SignalStatus::Yellow);
        assert_eq!(updated.distance_cm, DISTANCE_UNKNOWN);
    }

    #[tokio::test]
    async fn unknown_id_reads_and_writes_as_none() {
        let (_dir, store) = open_store().await;

        assert!(store.fetch_one(SignalId(99)).await.unwrap().is_none());
        let result = store
            .update(
                SignalId(99),
                SignalPatch {
                    status: Some(SignalStatus::Green),
                    distance_cm: None,
                },
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn malformed_status_fails_the_whole_fetch() {
        let (_dir, store) = open_store().await;

        {
            let conn = store.pool.get().unwrap();
            conn.execute_batch(
                "PRAGMA ignore_check_constraints = ON;
                 INSERT INTO signals (id, distance_cm, status) VALUES (2, 10, 'blue');",
            )
            .unwrap();
        }

        let err = store.fetch_all().await.unwrap_err();
        assert!(matches!(err, StoreError::Database(_)), "got {err:?}");
    }
}
