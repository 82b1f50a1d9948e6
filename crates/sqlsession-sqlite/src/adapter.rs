// SPDX-FileCopyrightText: 2026 sqlsession Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the SessionEngine trait.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use sqlsession_config::StorageConfig;
use sqlsession_core::{HealthStatus, PluginAdapter, SessionData, SessionEngine, StoreError};

use crate::database::{map_tr_err, Database};
use crate::queries;
use crate::schema;

/// SQLite-backed session store.
///
/// Starts uninitialized; [`SessionEngine::init`] opens the database and
/// [`SessionEngine::close`] releases it again. The open [`Database`] is held
/// in an `ArcSwapOption` so lifecycle changes never block in-flight calls.
/// `init` and `close` themselves are serialized by `lifecycle`.
pub struct SqliteSessionStore {
    config: StorageConfig,
    db: ArcSwapOption<Database>,
    lifecycle: Mutex<()>,
}

impl SqliteSessionStore {
    /// Create a store for the given configuration.
    ///
    /// The database is not opened until [`SessionEngine::init`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: ArcSwapOption::empty(),
            lifecycle: Mutex::new(()),
        }
    }

    /// Create and initialize a store for the database file at `path`.
    pub async fn open(path: impl Into<String>) -> Result<Self, StoreError> {
        let store = Self::new(StorageConfig::with_path(path));
        store.init().await?;
        Ok(store)
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.db.load().is_some()
    }

    /// Distinct ids of all stored sessions, sorted.
    pub async fn list_sessions(&self) -> Result<Vec<String>, StoreError> {
        queries::sessions::list_sessions(&*self.db()?).await
    }

    /// Set `key` to `value`, reporting whether the session existed.
    ///
    /// The existence check and the write happen in one transaction; a missing
    /// session is left untouched and yields `false`.
    pub async fn write_existing_key(
        &self,
        session_id: &str,
        key: &str,
        value: Value,
    ) -> Result<bool, StoreError> {
        queries::keys::write_key(&*self.db()?, session_id, key, value).await
    }

    /// Returns the open Database, or an error if not initialized.
    fn db(&self) -> Result<Arc<Database>, StoreError> {
        self.db.load_full().ok_or(StoreError::NotInitialized)
    }
}

#[async_trait]
impl PluginAdapter for SqliteSessionStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, StoreError> {
        let db = self.db()?;
        let probe = db
            .connection()
            .call(|conn| -> Result<bool, rusqlite::Error> {
                conn.query_row("SELECT 1", [], |_| Ok(()))?;
                schema::table_exists(conn)
            })
            .await
            .map_err(map_tr_err);
        match probe {
            Ok(true) => Ok(HealthStatus::Healthy),
            Ok(false) => {
                warn!(path = %db.path(), "sessions table missing");
                Ok(HealthStatus::Degraded("sessions table missing".to_string()))
            }
            Err(StoreError::NotInitialized) => Err(StoreError::NotInitialized),
            Err(e) => {
                warn!(path = %db.path(), error = %e, "health probe failed");
                Ok(HealthStatus::Unhealthy(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl SessionEngine for SqliteSessionStore {
    async fn init(&self) -> Result<(), StoreError> {
        let _guard = self.lifecycle.lock().await;
        if let Some(db) = self.db.load_full() {
            db.ensure_schema().await?;
            debug!(path = %db.path(), "session store already initialized");
            return Ok(());
        }
        let db = Database::open(&self.config).await?;
        self.db.store(Some(Arc::new(db)));
        info!(path = %self.config.database_path, "session store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        let _guard = self.lifecycle.lock().await;
        match self.db.swap(None) {
            Some(db) => {
                db.close().await?;
                info!(path = %db.path(), "session store closed");
            }
            None => debug!("close on uninitialized session store ignored"),
        }
        Ok(())
    }

    async fn session_exists(&self, session_id: &str) -> Result<bool, StoreError> {
        queries::sessions::session_exists(&*self.db()?, session_id).await
    }

    async fn create_session(&self, session_id: &str) -> Result<(), StoreError> {
        queries::sessions::create_session(&*self.db()?, session_id).await
    }

    async fn destroy_session(&self, session_id: &str) -> Result<u64, StoreError> {
        let removed = queries::sessions::destroy_session(&*self.db()?, session_id).await?;
        debug!(session_id, removed, "session destroyed");
        Ok(removed)
    }

    async fn destroy_all_sessions(&self) -> Result<(), StoreError> {
        queries::sessions::destroy_all_sessions(&*self.db()?).await?;
        info!("all sessions destroyed");
        Ok(())
    }

    async fn read_all(&self, session_id: &str) -> Result<Option<SessionData>, StoreError> {
        queries::keys::read_all(&*self.db()?, session_id).await
    }

    async fn read_key(&self, session_id: &str, key: &str) -> Result<Option<Value>, StoreError> {
        queries::keys::read_key(&*self.db()?, session_id, key).await
    }

    async fn write_key(
        &self,
        session_id: &str,
        key: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        if !self.write_existing_key(session_id, key, value).await? {
            debug!(session_id, key, "write to missing session ignored");
        }
        Ok(())
    }

    async fn delete_key(&self, session_id: &str, key: &str) -> Result<(), StoreError> {
        if !queries::keys::delete_key(&*self.db()?, session_id, key).await? {
            debug!(session_id, key, "delete on missing session ignored");
        }
        Ok(())
    }
}
