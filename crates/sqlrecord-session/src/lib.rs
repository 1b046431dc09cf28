//! Session and record creation pipeline for SQLRecord Rust.
//!
//! The [`Session`] owns a connection and runs every create through the same
//! ordered hook chain:
//!
//! `begin_transaction → before_save → before_create → save_associations_before
//! → stamp_timestamps → insert → force_reload → save_associations_after
//! → after_create → after_save → commit_or_rollback`
//!
//! # Design Philosophy
//!
//! - **First error wins**: a failing step records its error and every later
//!   step is skipped, except commit-or-rollback.
//! - **Errors are values**: a create returns a [`CreateResult`] carrying the
//!   error, the affected-row count and the terminal state; it never panics.
//! - **Owned transactions only**: the chain commits or rolls back only a
//!   transaction it opened itself. A transaction opened by the caller is
//!   left for the caller to settle.
//!
//! # Example
//!
//! ```ignore
//! let mut session = Session::new(conn, Postgres);
//!
//! let mut email = Email::new(1, "jeff@qq.com");
//! session.create(&mut email).into_result()?;
//!
//! // Skip rows that collide with a unique key
//! session.create_on_conflict(&mut email, ConflictDirective::Ignore).into_result()?;
//!
//! // One statement for the whole batch
//! session.create_many(&mut emails, CreateOptions::new()).into_result()?;
//! ```

pub mod config;
pub mod execute;
pub mod pipeline;
pub mod scope;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use sqlrecord_core::{Clock, Connection, Error, Record, RecordEvents, Result, SystemClock};
use sqlrecord_query::{ConflictDirective, Dialect};

pub use config::{CreateOptions, SessionConfig};
pub use execute::{execute_insert, reload_defaults};
pub use pipeline::{ChainContext, CreateStep, run_chain};
pub use scope::{CreateState, Scope};

// ============================================================================
// Create Result
// ============================================================================

/// Outcome of one create call.
#[derive(Debug)]
pub struct CreateResult {
    /// Rows the insert affected (0 when it did not run).
    pub rows_affected: u64,
    /// The first error any step recorded.
    pub error: Option<Error>,
    /// How the transaction ended.
    pub state: CreateState,
}

impl CreateResult {
    /// Whether no step failed.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Convert into a `Result` of the affected-row count.
    pub fn into_result(self) -> Result<u64> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.rows_affected),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Entry point for creating records over one connection.
#[derive(Debug)]
pub struct Session<C: Connection> {
    /// The database connection.
    connection: C,
    /// Dialect used to render statements.
    dialect: Arc<dyn Dialect>,
    /// Time source for timestamps.
    clock: Arc<dyn Clock>,
    /// Configuration.
    config: SessionConfig,
}

impl<C: Connection> Session<C> {
    /// Create a new session with default configuration.
    pub fn new(connection: C, dialect: impl Dialect + 'static) -> Self {
        Self {
            connection,
            dialect: Arc::new(dialect),
            clock: Arc::new(SystemClock),
            config: SessionConfig::default(),
        }
    }

    /// Create a session whose dialect comes from `config`.
    pub fn from_config(connection: C, config: SessionConfig) -> Self {
        Self {
            connection,
            dialect: config.dialect.into_dialect(),
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the configuration, keeping the current dialect.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get a reference to the underlying connection.
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Get a mutable reference to the underlying connection.
    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    /// Take the connection back.
    pub fn into_connection(self) -> C {
        self.connection
    }

    /// Get the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The session's dialect.
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    // ========================================================================
    // Create
    // ========================================================================

    /// Insert one record with default options.
    pub fn create<R: Record + RecordEvents>(&mut self, record: &mut R) -> CreateResult {
        self.create_with(record, CreateOptions::default())
    }

    /// Insert one record, handling unique-key collisions with `directive`.
    pub fn create_on_conflict<R: Record + RecordEvents>(
        &mut self,
        record: &mut R,
        directive: ConflictDirective,
    ) -> CreateResult {
        self.create_with(record, CreateOptions::new().on_conflict(directive))
    }

    /// Insert one record with explicit options.
    #[tracing::instrument(level = "debug", skip(self, record, options), fields(table = R::TABLE_NAME))]
    pub fn create_with<R: Record + RecordEvents>(&mut self, record: &mut R, options: CreateOptions) -> CreateResult {
        self.run(std::slice::from_mut(record), options, false)
    }

    /// Insert a batch of records as one multi-row statement.
    ///
    /// Every record must have the same non-blank columns, or the call fails
    /// with [`Error::HeterogeneousBatch`] before any SQL is sent. Timestamps
    /// come from one clock reading. After-hooks, associations and the
    /// default reload do not run for batch members.
    #[tracing::instrument(level = "debug", skip(self, records, options), fields(table = R::TABLE_NAME, count = records.len()))]
    pub fn create_many<R: Record + RecordEvents>(&mut self, records: &mut [R], options: CreateOptions) -> CreateResult {
        if records.is_empty() {
            tracing::debug!("Empty batch; nothing to insert");
            return CreateResult {
                rows_affected: 0,
                error: None,
                state: CreateState::Committed,
            };
        }
        self.run(records, options, true)
    }

    fn run<R: Record + RecordEvents>(&mut self, records: &mut [R], options: CreateOptions, batch: bool) -> CreateResult {
        tracing::info!(
            table = R::TABLE_NAME,
            dialect = self.dialect.name(),
            batch,
            conflict = options.conflict.name(),
            "Creating records"
        );

        let ctx = ChainContext {
            dialect: self.dialect.as_ref(),
            clock: self.clock.as_ref(),
            config: &self.config,
        };
        let mut scope = Scope::new(&mut self.connection, options, batch);
        let state = run_chain(ctx, &mut scope, records);
        let (error, rows_affected) = scope.into_outcome();

        match &error {
            None => tracing::info!(
                table = R::TABLE_NAME,
                rows_affected,
                state = state.as_str(),
                "Create finished"
            ),
            Some(e) => tracing::info!(
                table = R::TABLE_NAME,
                rows_affected,
                state = state.as_str(),
                error = %e,
                "Create failed"
            ),
        }

        CreateResult {
            rows_affected,
            error,
            state,
        }
    }
}
