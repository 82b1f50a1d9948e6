// SPDX-FileCopyrightText: 2026 sqlsession Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQL conversion for the `dataSerialized` column.
//!
//! A decode failure surfaces from rusqlite as
//! `Error::FromSqlConversionFailure` carrying the `serde_json::Error`;
//! [`crate::database::map_session_err`] turns it back into
//! [`StoreError::Decode`](sqlsession_core::StoreError::Decode).

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use sqlsession_core::SessionData;

/// A session's key/value mapping as stored in one column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredBlob(pub SessionData);

impl StoredBlob {
    pub fn into_inner(self) -> SessionData {
        self.0
    }
}

impl FromSql for StoredBlob {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(Self::default()),
            ValueRef::Text(bytes) => {
                let text = std::str::from_utf8(bytes).map_err(|e| FromSqlError::Other(Box::new(e)))?;
                SessionData::decode(text)
                    .map(Self)
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

impl ToSql for StoredBlob {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let text = self
            .0
            .encode()
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        Ok(ToSqlOutput::from(text))
    }
}
