// SPDX-FileCopyrightText: 2026 sqlsession Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `sqlsession doctor` command implementation.
//!
//! Runs read-only diagnostic checks against the configured session database.
//! The database is opened with `SQLITE_OPEN_READ_ONLY`, so a missing file or
//! table is reported rather than created.

use std::collections::HashSet;
use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use rusqlite::OpenFlags;
use sqlsession_config::SqlSessionConfig;
use sqlsession_sqlite::blob::StoredBlob;
use sqlsession_sqlite::schema;
use tokio_rusqlite::Connection;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn finish(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `sqlsession doctor` command.
///
/// Exits with 1 if any check failed. With `plain`, disables colored output.
pub async fn run_doctor(config: &SqlSessionConfig, config_path: Option<&Path>, plain: bool) -> ExitCode {
    let use_color = !plain && std::io::stdout().is_terminal();
    let db_path = config.storage.database_path.as_str();

    let results = vec![
        check_config(config_path),
        check_database(db_path).await,
        check_table(db_path).await,
        check_integrity(db_path).await,
        check_session_data(db_path).await,
    ];

    println!();
    println!("  sqlsession doctor ({db_path})");
    println!("  {}", "-".repeat(50));

    for result in &results {
        println!("{}", format_line(result, use_color));
    }
    println!();

    let issues = results
        .iter()
        .filter(|r| r.status != CheckStatus::Pass)
        .count();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    }
    println!();

    if results.iter().any(|r| r.status == CheckStatus::Fail) {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red(), result.message.red()),
        };
        format!("    {symbol} {:<16} {message} ({duration_ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<16} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

/// Re-validate the configuration the command was started with.
fn check_config(config_path: Option<&Path>) -> CheckResult {
    let start = Instant::now();
    let loaded = match config_path {
        Some(path) => sqlsession_config::load_and_validate_path(path),
        None => sqlsession_config::load_and_validate(),
    };
    match loaded {
        Ok(_) => {
            let source = config_path
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "defaults + XDG files".to_string());
            CheckResult::finish("Configuration", CheckStatus::Pass, format!("valid ({source})"), start)
        }
        Err(errors) => CheckResult::finish(
            "Configuration",
            CheckStatus::Fail,
            format!("{} error(s)", errors.len()),
            start,
        ),
    }
}

async fn open_read_only(db_path: &str) -> Result<Connection, String> {
    Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .await
        .map_err(|e| format!("open failed: {e}"))
}

/// Check the database file exists and answers a query.
async fn check_database(db_path: &str) -> CheckResult {
    let start = Instant::now();

    if !Path::new(db_path).exists() {
        return CheckResult::finish(
            "Database",
            CheckStatus::Warn,
            format!("not found: {db_path} (run `sqlsession init`)"),
            start,
        );
    }

    let conn = match open_read_only(db_path).await {
        Ok(conn) => conn,
        Err(msg) => return CheckResult::finish("Database", CheckStatus::Fail, msg, start),
    };
    let result = conn
        .call(|conn| -> Result<(), rusqlite::Error> { conn.query_row("SELECT 1", [], |_| Ok(())) })
        .await;
    match result {
        Ok(()) => CheckResult::finish("Database", CheckStatus::Pass, "connected", start),
        Err(e) => CheckResult::finish("Database", CheckStatus::Fail, format!("query failed: {e}"), start),
    }
}

/// Check the `sessions` table is present.
async fn check_table(db_path: &str) -> CheckResult {
    let start = Instant::now();
    if !Path::new(db_path).exists() {
        return CheckResult::finish("Sessions table", CheckStatus::Warn, "skipped (no database)", start);
    }
    let conn = match open_read_only(db_path).await {
        Ok(conn) => conn,
        Err(msg) => return CheckResult::finish("Sessions table", CheckStatus::Fail, msg, start),
    };
    match conn
        .call(|conn| -> Result<bool, rusqlite::Error> { schema::table_exists(conn) })
        .await
    {
        Ok(true) => CheckResult::finish("Sessions table", CheckStatus::Pass, "present", start),
        Ok(false) => CheckResult::finish(
            "Sessions table",
            CheckStatus::Warn,
            "missing (created on next init)",
            start,
        ),
        Err(e) => CheckResult::finish("Sessions table", CheckStatus::Fail, format!("{e}"), start),
    }
}

/// Run `PRAGMA integrity_check`.
async fn check_integrity(db_path: &str) -> CheckResult {
    let start = Instant::now();
    if !Path::new(db_path).exists() {
        return CheckResult::finish("DB integrity", CheckStatus::Warn, "skipped (no database)", start);
    }
    let conn = match open_read_only(db_path).await {
        Ok(conn) => conn,
        Err(msg) => return CheckResult::finish("DB integrity", CheckStatus::Fail, msg, start),
    };
    let result = conn
        .call(|conn| -> Result<String, rusqlite::Error> {
            conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))
        })
        .await;
    match result {
        Ok(status) if status == "ok" => CheckResult::finish("DB integrity", CheckStatus::Pass, "ok", start),
        Ok(status) => CheckResult::finish("DB integrity", CheckStatus::Fail, status, start),
        Err(e) => CheckResult::finish("DB integrity", CheckStatus::Fail, format!("check failed: {e}"), start),
    }
}

/// Counts gathered by [`scan_sessions`].
#[derive(Debug, Default, PartialEq, Eq)]
struct SessionScan {
    rows: usize,
    duplicate_ids: usize,
    undecodable: usize,
}

/// Walk every row, decoding each blob the way the store does.
fn scan_sessions(conn: &rusqlite::Connection) -> rusqlite::Result<SessionScan> {
    let mut stmt = conn.prepare("SELECT sessionID, dataSerialized FROM sessions")?;
    let mut rows = stmt.query([])?;
    let mut seen = HashSet::new();
    let mut scan = SessionScan::default();
    while let Some(row) = rows.next()? {
        scan.rows += 1;
        let id: Option<String> = row.get(0)?;
        if !seen.insert(id) {
            scan.duplicate_ids += 1;
        }
        if row.get::<_, StoredBlob>(1).is_err() {
            scan.undecodable += 1;
        }
    }
    Ok(scan)
}

/// Check every stored blob decodes and no session id appears twice.
async fn check_session_data(db_path: &str) -> CheckResult {
    let start = Instant::now();
    if !Path::new(db_path).exists() {
        return CheckResult::finish("Session data", CheckStatus::Warn, "skipped (no database)", start);
    }
    let conn = match open_read_only(db_path).await {
        Ok(conn) => conn,
        Err(msg) => return CheckResult::finish("Session data", CheckStatus::Fail, msg, start),
    };
    let result = conn
        .call(|conn| -> Result<Option<SessionScan>, rusqlite::Error> {
            if !schema::table_exists(conn)? {
                return Ok(None);
            }
            scan_sessions(conn).map(Some)
        })
        .await;
    session_data_result(result.map_err(|e| e.to_string()), start)
}

fn session_data_result(result: Result<Option<SessionScan>, String>, start: Instant) -> CheckResult {
    match result {
        Ok(None) => CheckResult::finish("Session data", CheckStatus::Warn, "skipped (no table)", start),
        Ok(Some(scan)) if scan.undecodable > 0 => CheckResult::finish(
            "Session data",
            CheckStatus::Fail,
            format!("{} of {} blob(s) are not JSON objects", scan.undecodable, scan.rows),
            start,
        ),
        Ok(Some(scan)) if scan.duplicate_ids > 0 => CheckResult::finish(
            "Session data",
            CheckStatus::Warn,
            format!("{} duplicate session id row(s)", scan.duplicate_ids),
            start,
        ),
        Ok(Some(scan)) => CheckResult::finish(
            "Session data",
            CheckStatus::Pass,
            format!("{} session(s)", scan.rows),
            start,
        ),
        Err(e) => CheckResult::finish("Session data", CheckStatus::Fail, format!("scan failed: {e}"), start),
    }
}
