//! Connection contract consumed by the create pipeline.
//!
//! Calls are synchronous and block until the statement completes. Timeouts
//! and retries belong to the driver behind these traits.

use crate::error::{DriverError, DriverErrorKind, Result};
use crate::row::Row;
use crate::value::Value;

/// Result of a plain (non row-returning) statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Rows the driver reports as affected.
    pub rows_affected: u64,
    last_insert_id: Option<i64>,
}

impl ExecResult {
    /// Result with an affected count and no last-insert-id.
    pub const fn new(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            last_insert_id: None,
        }
    }

    /// Attach the driver-native last inserted id.
    #[must_use]
    pub const fn with_last_insert_id(mut self, id: i64) -> Self {
        self.last_insert_id = Some(id);
        self
    }

    /// Driver-native last inserted id.
    ///
    /// Fails when the driver did not report one; callers surface the error
    /// rather than guessing a key.
    pub fn last_insert_id(&self) -> Result<i64> {
        self.last_insert_id.ok_or_else(|| {
            DriverError::new(
                DriverErrorKind::NoLastInsertId,
                "driver did not report a last insert id",
            )
            .into()
        })
    }
}

/// Something that can run SQL: a connection or an open transaction.
pub trait Executor {
    /// Execute a statement that returns no rows.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ExecResult>;

    /// Execute a statement that returns rows.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Execute a statement and return its first row, if any.
    fn query_one(&mut self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        Ok(self.query(sql, params)?.into_iter().next())
    }
}

/// A live database connection with transaction control.
pub trait Connection: Executor {
    /// Start a transaction.
    fn begin(&mut self) -> Result<()>;

    /// Commit the current transaction.
    fn commit(&mut self) -> Result<()>;

    /// Roll back the current transaction.
    fn rollback(&mut self) -> Result<()>;

    /// Whether a transaction is already open on this connection (e.g. one
    /// started by an outer unit of work).
    fn in_transaction(&self) -> bool;
}

impl<E: Executor + ?Sized> Executor for &mut E {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        (**self).execute(sql, params)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        (**self).query(sql, params)
    }

    fn query_one(&mut self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        (**self).query_one(sql, params)
    }
}
