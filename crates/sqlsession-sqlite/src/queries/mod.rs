// SPDX-FileCopyrightText: 2026 sqlsession Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for session rows and the keys inside their blobs.

pub mod keys;
pub mod sessions;
