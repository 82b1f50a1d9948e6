// SPDX-FileCopyrightText: 2026 sqlsession Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! sqlsession - inspect and maintain a SQLite session store.
//!
//! This is the binary entry point. Host applications link
//! `sqlsession-sqlite` directly; the CLI exists for operators.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod doctor;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::commands::Command;

/// sqlsession - inspect and maintain a SQLite session store.
#[derive(Parser, Debug)]
#[command(name = "sqlsession", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override `storage.database_path`.
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the database file and session table if missing.
    Init,
    /// Create an empty session.
    Create { session_id: String },
    /// Exit 0 if the session exists, 1 otherwise.
    Exists { session_id: String },
    /// List session ids.
    List,
    /// Print a session's key/value state as JSON.
    Show { session_id: String },
    /// Print one value as JSON.
    Get { session_id: String, key: String },
    /// Set a key. The value is parsed as JSON, falling back to a plain string.
    Set {
        session_id: String,
        key: String,
        value: String,
    },
    /// Remove a key.
    Del { session_id: String, key: String },
    /// Remove a session and all its keys.
    Destroy { session_id: String },
    /// Remove every session.
    Wipe {
        /// Confirm the wipe.
        #[arg(long)]
        yes: bool,
    },
    /// Run diagnostic checks against the configured database.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

impl Commands {
    /// The store operation behind this subcommand; `None` for `doctor`.
    fn into_store_command(self) -> Option<Command> {
        Some(match self {
            Commands::Init => Command::Init,
            Commands::Create { session_id } => Command::Create { session_id },
            Commands::Exists { session_id } => Command::Exists { session_id },
            Commands::List => Command::List,
            Commands::Show { session_id } => Command::Show { session_id },
            Commands::Get { session_id, key } => Command::Get { session_id, key },
            Commands::Set {
                session_id,
                key,
                value,
            } => Command::Set {
                session_id,
                key,
                value: commands::parse_value(&value),
            },
            Commands::Del { session_id, key } => Command::Del { session_id, key },
            Commands::Destroy { session_id } => Command::Destroy { session_id },
            Commands::Wipe { yes } => Command::Wipe { confirmed: yes },
            Commands::Doctor { .. } => return None,
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => sqlsession_config::load_and_validate_path(path),
        None => sqlsession_config::load_and_validate(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            sqlsession_config::render_errors(&errors);
            return ExitCode::from(2);
        }
    };
    if let Some(database) = cli.database {
        config.storage.database_path = database;
    }

    init_tracing(&config.log.level);

    if let Commands::Doctor { plain } = cli.command {
        return doctor::run_doctor(&config, cli.config.as_deref(), plain).await;
    }

    let Some(command) = cli.command.into_store_command() else {
        return ExitCode::SUCCESS;
    };
    let mut stdout = std::io::stdout().lock();
    match commands::run(command, &config.storage, &mut stdout).await {
        Ok(outcome) => outcome.into(),
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("sqlsession: {e}");
            ExitCode::from(2)
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let level = log_level.to_ascii_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "sqlsession={level},sqlsession_sqlite={level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
