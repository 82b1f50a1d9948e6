// SPDX-FileCopyrightText: 2026 sqlsession Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that all storage backends implement.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::HealthStatus;

/// The base trait for all sqlsession backends.
///
/// Provides identity and health check capabilities independent of the
/// session operations themselves.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, StoreError>;
}
