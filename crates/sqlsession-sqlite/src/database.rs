// SPDX-FileCopyrightText: 2026 sqlsession Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::time::Duration;

use sqlsession_config::StorageConfig;
use sqlsession_core::StoreError;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use crate::schema;

/// Convert a tokio-rusqlite error into a [`StoreError`].
///
/// A closed connection means the store was closed underneath the caller.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> StoreError {
    match e {
        tokio_rusqlite::Error::ConnectionClosed => StoreError::NotInitialized,
        tokio_rusqlite::Error::Error(e) => StoreError::storage(e),
        other => StoreError::storage(other),
    }
}

/// Like [`map_tr_err`], but recovers blob codec failures for `session_id`.
pub(crate) fn map_session_err(
    session_id: &str,
) -> impl FnOnce(tokio_rusqlite::Error<rusqlite::Error>) -> StoreError + '_ {
    move |e| match e {
        tokio_rusqlite::Error::Error(rusqlite::Error::FromSqlConversionFailure(_, _, source)) => {
            match source.downcast::<serde_json::Error>() {
                Ok(json) => StoreError::Decode {
                    session_id: session_id.to_string(),
                    source: *json,
                },
                Err(other) => StoreError::Storage { source: other },
            }
        }
        tokio_rusqlite::Error::Error(rusqlite::Error::ToSqlConversionFailure(source)) => {
            match source.downcast::<serde_json::Error>() {
                Ok(json) => StoreError::Encode(*json),
                Err(other) => StoreError::Storage { source: other },
            }
        }
        other => map_tr_err(other),
    }
}

fn init_err<E>(path: &str, source: E) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    StoreError::Initialization {
        path: path.to_string(),
        source: Box::new(source),
    }
}

/// A single tokio-rusqlite connection to the session database.
pub struct Database {
    conn: Connection,
    path: String,
    wal_mode: bool,
}

impl Database {
    /// Open (or create) the database file, apply PRAGMAs, and make sure the
    /// session table exists.
    ///
    /// An empty path is a [`StoreError::Config`]; every other failure on this
    /// path is reported as [`StoreError::Initialization`].
    pub async fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        let path = config.database_path.clone();
        if path.trim().is_empty() {
            return Err(StoreError::Config(
                "storage.database_path must not be empty".to_string(),
            ));
        }

        if let Some(parent) = Path::new(&path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| init_err(&path, e))?;
        }

        let conn = Connection::open(&path)
            .await
            .map_err(|e| init_err(&path, e))?;

        let wal_mode = config.wal_mode;
        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
        let created = conn
            .call(move |conn| -> Result<bool, rusqlite::Error> {
                conn.busy_timeout(busy_timeout)?;
                conn.query_row("SELECT 1", [], |_| Ok(()))?;
                let journal = if wal_mode { "WAL" } else { "DELETE" };
                conn.query_row(&format!("PRAGMA journal_mode = {journal}"), [], |row| {
                    row.get::<_, String>(0)
                })?;
                schema::ensure_table(conn)
            })
            .await
            .map_err(|e| init_err(&path, e))?;

        if created {
            info!(path = %path, "created sessions table");
        }
        debug!(path = %path, wal_mode, "session database opened");

        Ok(Self {
            conn,
            path,
            wal_mode,
        })
    }

    /// Re-run the table existence check on an already open database.
    ///
    /// Returns true if the table had to be created.
    pub async fn ensure_schema(&self) -> Result<bool, StoreError> {
        let created = self
            .conn
            .call(|conn| -> Result<bool, rusqlite::Error> { schema::ensure_table(conn) })
            .await
            .map_err(|e| init_err(&self.path, e))?;
        if created {
            info!(path = %self.path, "created sessions table");
        }
        Ok(created)
    }

    /// Returns the underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Path this database was opened from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Checkpoint the WAL (when enabled) and close the connection.
    pub async fn close(&self) -> Result<(), StoreError> {
        if self.wal_mode {
            self.conn
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
                })
                .await
                .map_err(map_tr_err)?;
            debug!("WAL checkpoint complete");
        }
        self.conn.clone().close().await.map_err(StoreError::storage)?;
        debug!(path = %self.path, "session database closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_for(path: &Path) -> StorageConfig {
        StorageConfig::with_path(path.to_str().unwrap())
    }

    #[tokio::test]
    async fn open_creates_file_and_table() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("sessions.db");
        let db = Database::open(&config_for(&db_path)).await.unwrap();
        assert!(db_path.exists());

        let exists = db
            .connection()
            .call(|conn| -> Result<bool, rusqlite::Error> { schema::table_exists(conn) })
            .await
            .unwrap();
        assert!(exists);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("deeper").join("sessions.db");
        let db = Database::open(&config_for(&db_path)).await.unwrap();
        assert!(db_path.exists());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn wal_mode_is_applied() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("wal.db");
        let db = Database::open(&config_for(&db_path)).await.unwrap();
        let mode: String = db
            .connection()
            .call(|conn| -> Result<String, rusqlite::Error> {
                conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn rollback_journal_when_wal_disabled() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("delete.db");
        let mut config = config_for(&db_path);
        config.wal_mode = false;
        let db = Database::open(&config).await.unwrap();
        let mode: String = db
            .connection()
            .call(|conn| -> Result<String, rusqlite::Error> {
                conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "delete");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_path_is_an_initialization_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"plain file").unwrap();
        let db_path = blocker.join("sessions.db");

        let err = Database::open(&config_for(&db_path)).await.err().unwrap();
        assert!(matches!(err, StoreError::Initialization { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn empty_path_is_a_config_error() {
        let err = Database::open(&StorageConfig::with_path("  "))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StoreError::Config(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn non_database_file_is_an_initialization_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("garbage.db");
        std::fs::write(&db_path, vec![0x42u8; 4096]).unwrap();

        let err = Database::open(&config_for(&db_path)).await.err().unwrap();
        assert!(matches!(err, StoreError::Initialization { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn calls_after_close_report_not_initialized() {
        let dir = tempdir().unwrap();
        let db = Database::open(&config_for(&dir.path().join("closed.db")))
            .await
            .unwrap();
        db.close().await.unwrap();

        let err = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> { conn.query_row("SELECT 1", [], |_| Ok(())) })
            .await
            .map_err(map_tr_err)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotInitialized));
    }
}
