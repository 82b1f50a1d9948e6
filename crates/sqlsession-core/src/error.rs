// SPDX-FileCopyrightText: 2026 sqlsession Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for sqlsession.

use thiserror::Error;

/// The error type returned by every [`SessionEngine`](crate::SessionEngine) operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database could not be opened, pinged, configured, or given its table.
    #[error("failed to initialize session store at {path}: {source}")]
    Initialization {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A session operation was attempted before `init` or after `close`.
    #[error("session store not initialized -- call init() first")]
    NotInitialized,

    /// `create_session` was called for an id that already has a row.
    #[error("session `{session_id}` already exists")]
    SessionConflict { session_id: String },

    /// A stored blob is not a JSON object.
    #[error("session `{session_id}` holds malformed data: {source}")]
    Decode {
        session_id: String,
        source: serde_json::Error,
    },

    /// The key/value mapping could not be serialized.
    #[error("failed to encode session data: {0}")]
    Encode(#[from] serde_json::Error),

    /// Any other storage engine failure.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Invalid configuration handed to a backend.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Wraps an arbitrary engine error as [`StoreError::Storage`].
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(source),
        }
    }

    /// Returns true for outcomes a host may treat as "session lost" rather than fatal.
    pub fn is_data_error(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::Encode(_))
    }
}
