// SPDX-FileCopyrightText: 2026 sqlsession Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Backends extend the [`PluginAdapter`] base trait and use `#[async_trait]`
//! so hosts can hold them as `Arc<dyn SessionEngine>`.

pub mod adapter;
pub mod storage;

pub use adapter::PluginAdapter;
pub use storage::SessionEngine;
