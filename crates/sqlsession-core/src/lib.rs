// SPDX-FileCopyrightText: 2026 sqlsession Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for sqlsession.
//!
//! This crate provides the trait a host session framework programs against,
//! the shared error type, and the in-memory form of a session's key/value
//! state. Storage backends implement the traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::StoreError;
pub use types::{HealthStatus, SessionData};

pub use traits::{PluginAdapter, SessionEngine};
