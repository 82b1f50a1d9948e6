// SPDX-FileCopyrightText: 2026 sqlsession Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store commands run by the `sqlsession` binary.
//!
//! Each command opens the configured store, performs one operation through
//! [`SessionEngine`], prints its result to `out`, and closes the store.

use std::io::Write;
use std::process::ExitCode;

use serde_json::Value;
use sqlsession_config::StorageConfig;
use sqlsession_core::{SessionEngine, StoreError};
use sqlsession_sqlite::SqliteSessionStore;

/// A store operation requested on the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Init,
    Create { session_id: String },
    Exists { session_id: String },
    List,
    Show { session_id: String },
    Get { session_id: String, key: String },
    Set { session_id: String, key: String, value: Value },
    Del { session_id: String, key: String },
    Destroy { session_id: String },
    Wipe { confirmed: bool },
}

/// Parse a command-line value as JSON, or keep it as a plain string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// How a command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// The session or key looked up does not exist.
    Absent,
    /// A destructive command was not confirmed.
    Refused,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Done => ExitCode::SUCCESS,
            Outcome::Absent => ExitCode::from(1),
            Outcome::Refused => ExitCode::from(2),
        }
    }
}

/// Run `command` against the store at `config`.
///
/// Store errors are returned to the caller.
pub async fn run(
    command: Command,
    config: &StorageConfig,
    out: &mut dyn Write,
) -> Result<Outcome, StoreError> {
    if let Command::Wipe { confirmed: false } = command {
        eprintln!("sqlsession: refusing to wipe {} without --yes", config.database_path);
        return Ok(Outcome::Refused);
    }

    let store = SqliteSessionStore::new(config.clone());
    store.init().await?;
    let result = execute(&store, command, out).await;
    store.close().await?;
    result
}

async fn execute(
    store: &SqliteSessionStore,
    command: Command,
    out: &mut dyn Write,
) -> Result<Outcome, StoreError> {
    let found = match command {
        Command::Init => {
            emit(out, format_args!("initialized {}", store.config().database_path))?;
            true
        }
        Command::Create { session_id } => {
            store.create_session(&session_id).await?;
            emit(out, format_args!("created {session_id}"))?;
            true
        }
        Command::Exists { session_id } => {
            let exists = store.session_exists(&session_id).await?;
            emit(out, format_args!("{exists}"))?;
            exists
        }
        Command::List => {
            for id in store.list_sessions().await? {
                emit(out, format_args!("{id}"))?;
            }
            true
        }
        Command::Show { session_id } => match store.read_all(&session_id).await? {
            Some(data) => {
                let pretty = serde_json::to_string_pretty(&data)?;
                emit(out, format_args!("{pretty}"))?;
                true
            }
            None => false,
        },
        Command::Get { session_id, key } => match store.read_key(&session_id, &key).await? {
            Some(value) => {
                emit(out, format_args!("{value}"))?;
                true
            }
            None => false,
        },
        Command::Set {
            session_id,
            key,
            value,
        } => store.write_existing_key(&session_id, &key, value).await?,
        Command::Del { session_id, key } => {
            store.delete_key(&session_id, &key).await?;
            true
        }
        Command::Destroy { session_id } => {
            let removed = store.destroy_session(&session_id).await?;
            emit(out, format_args!("removed {removed}"))?;
            removed > 0
        }
        Command::Wipe { .. } => {
            store.destroy_all_sessions().await?;
            emit(out, format_args!("wiped {}", store.config().database_path))?;
            true
        }
    };

    Ok(if found { Outcome::Done } else { Outcome::Absent })
}

fn emit(out: &mut dyn Write, line: std::fmt::Arguments<'_>) -> Result<(), StoreError> {
    writeln!(out, "{line}").map_err(StoreError::storage)
}
