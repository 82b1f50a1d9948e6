// SPDX-FileCopyrightText: 2026 sqlsession Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key access inside a session's blob.
//!
//! There is no per-key addressing in the table: every mutation loads the whole
//! mapping, changes it, and writes it back. Load and write-back run in one
//! closure under an immediate transaction, so concurrent mutations of the same
//! session are serialized instead of overwriting each other.
//!
//! Legacy stores may hold several rows for one id. The row with the lowest
//! `rowid` is the one read and written; the others are left as they are.

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde_json::Value;
use sqlsession_core::{SessionData, StoreError};

use crate::blob::StoredBlob;
use crate::database::{map_session_err, Database};

/// The first row for `session_id`: its `rowid` and decoded mapping.
fn load(conn: &Connection, session_id: &str) -> rusqlite::Result<Option<(i64, SessionData)>> {
    conn.query_row(
        "SELECT rowid, dataSerialized FROM sessions WHERE sessionID = ?1 ORDER BY rowid LIMIT 1",
        params![session_id],
        |row| Ok((row.get(0)?, row.get::<_, StoredBlob>(1)?.into_inner())),
    )
    .optional()
}

/// Apply `mutate` to the session's mapping and store the result.
///
/// Returns false, without writing, if the session does not exist.
async fn update<F>(db: &Database, session_id: &str, mutate: F) -> Result<bool, StoreError>
where
    F: FnOnce(&mut SessionData) + Send + 'static,
{
    let id = session_id.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let Some((rowid, mut data)) = load(&tx, &id)? else {
                return Ok(false);
            };
            mutate(&mut data);
            tx.execute(
                "UPDATE sessions SET dataSerialized = ?1 WHERE rowid = ?2",
                params![StoredBlob(data), rowid],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_session_err(session_id))
}

/// The whole mapping of a session, or `None` if it does not exist.
pub async fn read_all(db: &Database, session_id: &str) -> Result<Option<SessionData>, StoreError> {
    let id = session_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<SessionData>, rusqlite::Error> {
            Ok(load(conn, &id)?.map(|(_, data)| data))
        })
        .await
        .map_err(map_session_err(session_id))
}

/// The value under `key`; `None` if the session or the key is missing.
pub async fn read_key(
    db: &Database,
    session_id: &str,
    key: &str,
) -> Result<Option<Value>, StoreError> {
    Ok(read_all(db, session_id)
        .await?
        .and_then(|mut data| data.remove(key)))
}

/// Set `key` to `value`. Returns false if the session does not exist.
pub async fn write_key(
    db: &Database,
    session_id: &str,
    key: &str,
    value: Value,
) -> Result<bool, StoreError> {
    let key = key.to_string();
    update(db, session_id, move |data| {
        data.insert(key, value);
    })
    .await
}

/// Remove `key`. Returns false if the session does not exist.
pub async fn delete_key(db: &Database, session_id: &str, key: &str) -> Result<bool, StoreError> {
    let key = key.to_string();
    update(db, session_id, move |data| {
        data.remove(&key);
    })
    .await
}
