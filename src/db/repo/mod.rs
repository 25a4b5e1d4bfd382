//! Repository layer for database operations.
//!
//! Methods are organized across submodules by domain:
//! - `positions.rs` - Position and transaction-record operations
//! - `repositions.rs` - Reposition chain-entry operations
//! - `pending.rs` - Pending-transaction intent and rate-limit operations

mod pending;
mod positions;
mod repositions;

use crate::domain::Decimal;
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }
}

/// Decode a canonical decimal string column, surfacing a column-level error
/// instead of panicking on corrupt rows.
pub(crate) fn parse_decimal(value: &str, column: &str) -> Result<Decimal, sqlx::Error> {
    Decimal::from_str_canonical(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// Decode an optional decimal string column.
pub(crate) fn parse_decimal_opt(
    value: Option<&str>,
    column: &str,
) -> Result<Option<Decimal>, sqlx::Error> {
    value.map(|v| parse_decimal(v, column)).transpose()
}

/// Decode a uuid column.
pub(crate) fn parse_uuid(value: &str, column: &str) -> Result<Uuid, sqlx::Error> {
    Uuid::parse_str(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}
