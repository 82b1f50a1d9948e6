// SPDX-FileCopyrightText: 2026 sqlsession Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The fixed `sessions` table: existence check, creation, and reset.
//!
//! There is exactly one schema and no migration history. Existence is checked
//! by table name against `sqlite_master`.

use rusqlite::{params, Connection, TransactionBehavior};

/// Name of the only table this crate owns.
pub const TABLE_NAME: &str = "sessions";

/// Statement creating the session table.
pub const CREATE_TABLE: &str = "CREATE TABLE sessions (sessionID TEXT, dataSerialized TEXT)";

/// Returns true if the session table is present.
pub fn table_exists(conn: &Connection) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        params![TABLE_NAME],
        |row| row.get(0),
    )
}

/// Creates the session table if it is missing. Returns true if it was created.
///
/// The check and the create share one immediate transaction, so concurrent
/// callers on the same file never both try to create the table.
pub fn ensure_table(conn: &mut Connection) -> rusqlite::Result<bool> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if table_exists(&tx)? {
        return Ok(false);
    }
    tx.execute(CREATE_TABLE, [])?;
    tx.commit()?;
    Ok(true)
}

/// Drops and recreates the session table in one transaction.
pub fn recreate_table(conn: &mut Connection) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DROP TABLE IF EXISTS sessions", [])?;
    tx.execute(CREATE_TABLE, [])?;
    tx.commit()
}
