//! The ordered, short-circuiting create hook chain.
//!
//! Every step runs against the shared [`Scope`]. Once a step records an
//! error, every later step is skipped except commit-or-rollback, which
//! always runs so an owned transaction is settled on every exit path.

use sqlrecord_core::{AssociationPhase, Clock, Connection, Record, RecordEvents, Result};
use sqlrecord_query::{BatchPayload, Dialect, InsertBuilder, InsertManyBuilder};

use crate::config::SessionConfig;
use crate::execute::{execute_insert, reload_defaults};
use crate::scope::{CreateState, Scope};

/// One named step of the create chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStep {
    /// Open a transaction unless one is already open.
    BeginTransaction,
    /// `RecordEvents::before_save`.
    BeforeSave,
    /// `RecordEvents::before_create`.
    BeforeCreate,
    /// Belongs-to associations, before the row exists.
    SaveAssociationsBefore,
    /// Fill blank creation/update timestamps.
    StampTimestamps,
    /// Build the statement and run it.
    Insert,
    /// Read back columns left to their database default.
    ForceReload,
    /// Child associations, after the row exists.
    SaveAssociationsAfter,
    /// `RecordEvents::after_create`.
    AfterCreate,
    /// `RecordEvents::after_save`.
    AfterSave,
    /// Commit an owned transaction, or roll it back after an error.
    CommitOrRollback,
}

impl CreateStep {
    /// Steps in execution order.
    pub const ORDER: [CreateStep; 11] = [
        CreateStep::BeginTransaction,
        CreateStep::BeforeSave,
        CreateStep::BeforeCreate,
        CreateStep::SaveAssociationsBefore,
        CreateStep::StampTimestamps,
        CreateStep::Insert,
        CreateStep::ForceReload,
        CreateStep::SaveAssociationsAfter,
        CreateStep::AfterCreate,
        CreateStep::AfterSave,
        CreateStep::CommitOrRollback,
    ];

    /// Step name used in logs and hook errors.
    pub const fn name(self) -> &'static str {
        match self {
            CreateStep::BeginTransaction => "begin_transaction",
            CreateStep::BeforeSave => "before_save",
            CreateStep::BeforeCreate => "before_create",
            CreateStep::SaveAssociationsBefore => "save_associations_before",
            CreateStep::StampTimestamps => "stamp_timestamps",
            CreateStep::Insert => "insert",
            CreateStep::ForceReload => "force_reload",
            CreateStep::SaveAssociationsAfter => "save_associations_after",
            CreateStep::AfterCreate => "after_create",
            CreateStep::AfterSave => "after_save",
            CreateStep::CommitOrRollback => "commit_or_rollback",
        }
    }

    /// Steps a batch create does not run: batch members are not
    /// individually reloaded, associated, or notified after the write.
    pub const fn skipped_for_batch(self) -> bool {
        matches!(
            self,
            CreateStep::SaveAssociationsBefore
                | CreateStep::ForceReload
                | CreateStep::SaveAssociationsAfter
                | CreateStep::AfterCreate
                | CreateStep::AfterSave
        )
    }
}

/// Collaborators the chain reads but never mutates.
#[derive(Debug, Clone, Copy)]
pub struct ChainContext<'a> {
    /// SQL dialect.
    pub dialect: &'a dyn Dialect,
    /// Time source for timestamps.
    pub clock: &'a dyn Clock,
    /// Session configuration.
    pub config: &'a SessionConfig,
}

/// Drive `records` through every step. Returns the terminal state; the
/// error and affected-row count stay on `scope`.
pub fn run_chain<C, R>(ctx: ChainContext<'_>, scope: &mut Scope<'_, C>, records: &mut [R]) -> CreateState
where
    C: Connection,
    R: Record + RecordEvents,
{
    let mut state = CreateState::RolledBack;
    for step in CreateStep::ORDER {
        if step == CreateStep::CommitOrRollback {
            state = scope.commit_or_rollback();
            break;
        }
        if scope.has_error() {
            tracing::debug!(step = step.name(), "Skipping step after earlier error");
            continue;
        }
        if scope.is_batch() && step.skipped_for_batch() {
            tracing::trace!(step = step.name(), "Skipping step for batch");
            continue;
        }
        tracing::trace!(step = step.name(), "Running create step");
        let result = run_step(step, ctx, scope, records);
        scope.record(result);
    }
    state
}

fn run_step<C, R>(step: CreateStep, ctx: ChainContext<'_>, scope: &mut Scope<'_, C>, records: &mut [R]) -> Result<()>
where
    C: Connection,
    R: Record + RecordEvents,
{
    match step {
        CreateStep::BeginTransaction => {
            if ctx.config.transactional {
                scope.begin_transaction()?;
            }
            Ok(())
        }
        CreateStep::BeforeSave => records.iter_mut().try_for_each(RecordEvents::before_save),
        CreateStep::BeforeCreate => records.iter_mut().try_for_each(RecordEvents::before_create),
        CreateStep::SaveAssociationsBefore => save_associations(scope, records, AssociationPhase::Before),
        CreateStep::StampTimestamps => stamp_timestamps(ctx, records),
        CreateStep::Insert => insert(ctx, scope, records),
        CreateStep::ForceReload => force_reload(ctx, scope, records),
        CreateStep::SaveAssociationsAfter => save_associations(scope, records, AssociationPhase::After),
        CreateStep::AfterCreate => records.iter_mut().try_for_each(RecordEvents::after_create),
        CreateStep::AfterSave => records.iter_mut().try_for_each(RecordEvents::after_save),
        // Settled by the runner itself.
        CreateStep::CommitOrRollback => Ok(()),
    }
}

fn save_associations<C, R>(scope: &mut Scope<'_, C>, records: &mut [R], phase: AssociationPhase) -> Result<()>
where
    C: Connection,
    R: RecordEvents,
{
    for record in records.iter_mut() {
        record.save_associations(phase, scope.conn())?;
    }
    Ok(())
}

/// Fill blank timestamp fields from a single clock reading, so every field
/// of every record gets the same instant.
fn stamp_timestamps<R: Record>(ctx: ChainContext<'_>, records: &mut [R]) -> Result<()> {
    let names: Vec<&'static str> = ctx
        .config
        .timestamp_fields()
        .filter_map(|name| R::fields().iter().find(|f| f.is_normal() && f.matches(name)))
        .map(|f| f.name)
        .collect();
    if names.is_empty() {
        return Ok(());
    }
    let now = ctx.clock.now();
    for record in records.iter_mut() {
        for name in &names {
            if record.field_value(name).is_none_or(|v| v.is_blank()) {
                record.set_field_value(name, now.into())?;
            }
        }
    }
    tracing::trace!(at = %now, fields = ?names, "Stamped timestamps");
    Ok(())
}

fn insert<C, R>(ctx: ChainContext<'_>, scope: &mut Scope<'_, C>, records: &mut [R]) -> Result<()>
where
    C: Connection,
    R: Record,
{
    let Some(template) = records.first() else {
        return Ok(());
    };
    let options = scope.options().clone();
    let plan = if scope.is_batch() {
        let payload = BatchPayload::from_records(records)?;
        InsertManyBuilder::new(template, &payload, ctx.dialect)
            .options(options.insert_options())
            .build()?
    } else {
        InsertBuilder::new(template, ctx.dialect)
            .options(options.insert_options())
            .build()?
    };

    let rows = execute_insert(scope.conn(), ctx.dialect, &plan, records)?;
    scope.set_rows_affected(rows);
    scope.set_plan(plan);
    Ok(())
}

fn force_reload<C, R>(ctx: ChainContext<'_>, scope: &mut Scope<'_, C>, records: &mut [R]) -> Result<()>
where
    C: Connection,
    R: Record,
{
    if !ctx.config.reload_defaults {
        return Ok(());
    }
    let Some(columns) = scope.plan().map(|plan| plan.reload.clone()) else {
        return Ok(());
    };
    if columns.is_empty() {
        return Ok(());
    }
    if let Some(record) = records.first_mut() {
        reload_defaults(scope.conn(), ctx.dialect, record, &columns)?;
    }
    Ok(())
}
