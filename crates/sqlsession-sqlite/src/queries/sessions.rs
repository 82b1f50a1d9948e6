// SPDX-FileCopyrightText: 2026 sqlsession Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session row lifecycle: exists, create, destroy, wipe, list.

use rusqlite::{params, TransactionBehavior};
use sqlsession_core::StoreError;

use crate::database::{map_tr_err, Database};
use crate::schema;

/// Returns true if at least one row carries `session_id`.
pub async fn session_exists(db: &Database, session_id: &str) -> Result<bool, StoreError> {
    let id = session_id.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM sessions WHERE sessionID = ?1)",
                params![id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a session row with an empty blob.
///
/// The existence check and the insert share one immediate transaction, so two
/// racing creates cannot both succeed.
pub async fn create_session(db: &Database, session_id: &str) -> Result<(), StoreError> {
    let id = session_id.to_string();
    let inserted = db
        .connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let taken: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM sessions WHERE sessionID = ?1)",
                params![id],
                |row| row.get(0),
            )?;
            if taken {
                return Ok(false);
            }
            tx.execute("INSERT INTO sessions VALUES (?1, '')", params![id])?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)?;

    if inserted {
        Ok(())
    } else {
        Err(StoreError::SessionConflict {
            session_id: session_id.to_string(),
        })
    }
}

/// Delete every row carrying `session_id`. Returns the number of rows removed.
pub async fn destroy_session(db: &Database, session_id: &str) -> Result<u64, StoreError> {
    let id = session_id.to_string();
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute("DELETE FROM sessions WHERE sessionID = ?1", params![id])
        })
        .await
        .map(|n| n as u64)
        .map_err(map_tr_err)
}

/// Drop and recreate the session table, discarding every session.
pub async fn destroy_all_sessions(db: &Database) -> Result<(), StoreError> {
    db.connection()
        .call(|conn| -> Result<(), rusqlite::Error> { schema::recreate_table(conn) })
        .await
        .map_err(map_tr_err)
}

/// Distinct session ids, sorted.
pub async fn list_sessions(db: &Database) -> Result<Vec<String>, StoreError> {
    db.connection()
        .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
            let mut stmt =
                conn.prepare("SELECT DISTINCT sessionID FROM sessions ORDER BY sessionID")?;
            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(ids)
        })
        .await
        .map_err(map_tr_err)
}
