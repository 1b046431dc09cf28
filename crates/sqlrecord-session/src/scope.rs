//! Operation context for one create call.
//!
//! A [`Scope`] owns everything one create shares between hook steps: the
//! first recorded error, the built plan, the affected-row count and the
//! transaction this chain opened (if any). It is created at the start of a
//! create and dropped at the end; it is never shared.

use sqlrecord_core::{Connection, Error, Result};
use sqlrecord_query::InsertPlan;

use crate::config::CreateOptions;

/// Terminal state of a create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateState {
    /// No error; the chain's transaction (or autocommit) made the write durable.
    Committed,
    /// An error was recorded; the chain's transaction, if any, was rolled back.
    RolledBack,
    /// The connection was already inside an outer transaction; its owner
    /// decides the outcome.
    Deferred,
}

impl CreateState {
    /// Lowercase name for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            CreateState::Committed => "committed",
            CreateState::RolledBack => "rolled_back",
            CreateState::Deferred => "deferred",
        }
    }
}

/// Shared mutable state of one create operation.
pub struct Scope<'c, C: Connection> {
    conn: &'c mut C,
    options: CreateOptions,
    batch: bool,
    error: Option<Error>,
    plan: Option<InsertPlan>,
    rows_affected: u64,
    owns_transaction: bool,
}

impl<'c, C: Connection> Scope<'c, C> {
    /// Fresh context over `conn`.
    pub fn new(conn: &'c mut C, options: CreateOptions, batch: bool) -> Self {
        Self {
            conn,
            options,
            batch,
            error: None,
            plan: None,
            rows_affected: 0,
            owns_transaction: false,
        }
    }

    /// The connection, for steps that run SQL.
    pub fn conn(&mut self) -> &mut C {
        self.conn
    }

    /// Per-call options.
    pub fn options(&self) -> &CreateOptions {
        &self.options
    }

    /// Whether this create came from a batch call.
    pub fn is_batch(&self) -> bool {
        self.batch
    }

    /// Whether a step already failed.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// The recorded error, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Record `error` unless one is already recorded. The first error wins.
    pub fn record_error(&mut self, error: Error) {
        if let Some(first) = &self.error {
            tracing::debug!(kept = %first, dropped = %error, "Error already recorded");
            return;
        }
        tracing::debug!(error = %error, "Recording create error");
        self.error = Some(error);
    }

    /// Record the error of `result`, if any.
    pub fn record<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.record_error(e);
                None
            }
        }
    }

    /// The built insert plan, once the insert step ran.
    pub fn plan(&self) -> Option<&InsertPlan> {
        self.plan.as_ref()
    }

    /// Store the built plan.
    pub fn set_plan(&mut self, plan: InsertPlan) {
        self.plan = Some(plan);
    }

    /// Affected-row count established so far.
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Set the affected-row count.
    pub fn set_rows_affected(&mut self, rows: u64) {
        self.rows_affected = rows;
    }

    /// Whether this chain opened the current transaction.
    pub fn owns_transaction(&self) -> bool {
        self.owns_transaction
    }

    /// Open a transaction unless one is already open on the connection.
    pub fn begin_transaction(&mut self) -> Result<()> {
        if self.conn.in_transaction() {
            tracing::debug!("Joining outer transaction");
            return Ok(());
        }
        self.conn.begin()?;
        self.owns_transaction = true;
        tracing::debug!("Began transaction");
        Ok(())
    }

    /// Commit when no error is recorded and the transaction is ours; roll
    /// back an owned transaction otherwise. A failed commit is recorded and
    /// followed by a rollback.
    pub fn commit_or_rollback(&mut self) -> CreateState {
        if !self.owns_transaction {
            return if self.conn.in_transaction() {
                CreateState::Deferred
            } else if self.has_error() {
                CreateState::RolledBack
            } else {
                CreateState::Committed
            };
        }
        self.owns_transaction = false;

        if !self.has_error() {
            match self.conn.commit() {
                Ok(()) => {
                    tracing::debug!("Committed transaction");
                    return CreateState::Committed;
                }
                Err(e) => self.record_error(e),
            }
        }
        if let Err(e) = self.conn.rollback() {
            tracing::warn!(error = %e, "Rollback failed");
        } else {
            tracing::debug!("Rolled back transaction");
        }
        CreateState::RolledBack
    }

    /// Split into the recorded error and affected-row count.
    pub fn into_outcome(mut self) -> (Option<Error>, u64) {
        (self.error.take(), self.rows_affected)
    }
}

impl<C: Connection> Drop for Scope<'_, C> {
    fn drop(&mut self) {
        // Reached only when the chain unwound before commit-or-rollback.
        if self.owns_transaction {
            tracing::warn!("Create aborted with an open transaction; rolling back");
            if let Err(e) = self.conn.rollback() {
                tracing::warn!(error = %e, "Rollback on drop failed");
            }
        }
    }
}

impl<C: Connection> std::fmt::Debug for Scope<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("batch", &self.batch)
            .field("error", &self.error)
            .field("rows_affected", &self.rows_affected)
            .field("owns_transaction", &self.owns_transaction)
            .finish_non_exhaustive()
    }
}
