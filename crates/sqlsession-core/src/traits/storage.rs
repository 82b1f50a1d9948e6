// SPDX-FileCopyrightText: 2026 sqlsession Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session engine trait consumed by the host session framework.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::traits::adapter::PluginAdapter;
use crate::types::SessionData;

/// Persistence backend for per-session key/value state.
///
/// The host framework owns session ids, cookies and expiry; an engine only
/// stores what it is told to. Missing sessions and missing keys are not
/// errors: reads return `None` and mutations are no-ops.
#[async_trait]
pub trait SessionEngine: PluginAdapter {
    /// Opens the backing store and makes sure the session table exists.
    ///
    /// Safe to call repeatedly; later calls only re-check the table.
    async fn init(&self) -> Result<(), StoreError>;

    /// Releases the backing store. A closed engine can be re-initialized.
    async fn close(&self) -> Result<(), StoreError>;

    /// Returns true if a session with this id has been created and not destroyed.
    async fn session_exists(&self, session_id: &str) -> Result<bool, StoreError>;

    /// Creates an empty session.
    ///
    /// Fails with [`StoreError::SessionConflict`] if the id is already taken.
    async fn create_session(&self, session_id: &str) -> Result<(), StoreError>;

    /// Removes a session and all of its keys. Returns the number of rows removed.
    async fn destroy_session(&self, session_id: &str) -> Result<u64, StoreError>;

    /// Removes every session.
    async fn destroy_all_sessions(&self) -> Result<(), StoreError>;

    /// Returns the full key/value state of a session, or `None` if it does not exist.
    async fn read_all(&self, session_id: &str) -> Result<Option<SessionData>, StoreError>;

    /// Returns the value stored under `key`.
    async fn read_key(&self, session_id: &str, key: &str) -> Result<Option<Value>, StoreError>;

    /// Sets `key` to `value`. No-op if the session does not exist.
    async fn write_key(&self, session_id: &str, key: &str, value: Value)
        -> Result<(), StoreError>;

    /// Removes `key`. No-op if the session or the key does not exist.
    async fn delete_key(&self, session_id: &str, key: &str) -> Result<(), StoreError>;
}
