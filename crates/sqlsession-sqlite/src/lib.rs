// SPDX-FileCopyrightText: 2026 sqlsession Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite session store for sqlsession.
//!
//! Persists each session's key/value state as one JSON blob in a single
//! `sessions(sessionID, dataSerialized)` table. All statements run through one
//! `tokio-rusqlite` connection, and key mutations are read-modify-write cycles
//! inside an immediate transaction.

pub mod adapter;
pub mod blob;
pub mod database;
pub mod queries;
pub mod schema;

pub use adapter::SqliteSessionStore;
pub use database::Database;
