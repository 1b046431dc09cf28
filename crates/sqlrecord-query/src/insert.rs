//! INSERT statement building for one record or a batch.
//!
//! The builder decides which fields become columns, binds their values in
//! column order, asks the conflict resolver for the trailing clause, and
//! resolves the dialect's key-retrieval plan. Nothing here talks to a
//! connection: the output is an [`InsertPlan`] the execution engine runs.

use std::collections::{BTreeMap, BTreeSet};

use sqlrecord_core::{
    Error, FieldDescriptor, FieldInfo, Record, RelationshipKind, Result, Value, field_by_name,
    primary_field,
};

use crate::conflict::{ConflictDirective, resolve_conflict};
use crate::dialect::Dialect;
use crate::key::KeyPlan;
use crate::statement::{Bindings, Statement};

// ============================================================================
// Field filtering
// ============================================================================

/// Select / omit lists deciding which fields a create may write.
///
/// A non-empty select list wins: only fields named in it (by field or column
/// name) are changeable. Otherwise every field not in the omit list is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldFilter {
    select: Vec<String>,
    omit: Vec<String>,
}

impl FieldFilter {
    /// Filter from explicit lists.
    pub fn new(select: Vec<String>, omit: Vec<String>) -> Self {
        Self { select, omit }
    }

    /// Whether `info` may be written by this create.
    pub fn is_changeable(&self, info: &FieldInfo) -> bool {
        if self.select.is_empty() {
            !self.omit.iter().any(|name| info.matches(name))
        } else {
            self.select.iter().any(|name| info.matches(name))
        }
    }
}

/// Uppercase a caller-supplied insert modifier. Blank and `INTO` mean none.
pub fn normalize_modifier(modifier: Option<&str>) -> Option<String> {
    let modifier = modifier?.trim().to_uppercase();
    if modifier.is_empty() || modifier == "INTO" {
        None
    } else {
        Some(modifier)
    }
}

// ============================================================================
// Batch payload
// ============================================================================

/// Column-to-value rows for a multi-row insert.
///
/// Every row must carry the same column set; [`BatchPayload::from_rows`]
/// rejects a mismatch before any SQL is rendered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchPayload {
    rows: Vec<BTreeMap<String, Value>>,
}

impl BatchPayload {
    /// Validate and wrap explicit rows.
    pub fn from_rows(rows: Vec<BTreeMap<String, Value>>) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(Error::Custom("batch insert requires at least one row".to_string()));
        };
        let expected: Vec<&String> = first.keys().collect();
        for (index, row) in rows.iter().enumerate().skip(1) {
            if !row.keys().eq(expected.iter().copied()) {
                return Err(Error::HeterogeneousBatch {
                    row: index,
                    expected: expected.iter().map(|c| (*c).clone()).collect(),
                    found: row.keys().cloned().collect(),
                });
            }
        }
        Ok(Self { rows })
    }

    /// One row per record, made of its non-blank persisted columns.
    pub fn from_records<R: Record>(records: &[R]) -> Result<Self> {
        let rows = records
            .iter()
            .map(|record| {
                record
                    .descriptors()
                    .into_iter()
                    .filter(|f| f.is_normal() && !f.is_blank())
                    .map(|f| (f.column_name().to_string(), f.into_value()))
                    .collect()
            })
            .collect();
        Self::from_rows(rows)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if there are no rows (never, once validated).
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> &[BTreeMap<String, Value>] {
        &self.rows
    }
}

// ============================================================================
// Plan
// ============================================================================

/// Everything the execution engine needs to run one insert.
#[derive(Debug, Clone)]
pub struct InsertPlan {
    /// Rendered statement.
    pub statement: Statement,
    /// How the generated key comes back.
    pub key: KeyPlan,
    /// Primary field of the record type, if any.
    pub primary: Option<&'static FieldInfo>,
    /// Blank fields left to their database default, to reload afterwards.
    pub reload: Vec<&'static FieldInfo>,
    /// Number of value groups in the statement.
    pub rows: usize,
}

impl InsertPlan {
    /// Whether the statement inserts more than one value group.
    pub fn is_batch(&self) -> bool {
        self.rows > 1
    }
}

/// Per-call knobs shared by the single-row and batch builders.
#[derive(Debug, Clone, Default)]
pub struct InsertOptions<'o> {
    /// Select / omit filter.
    pub filter: FieldFilter,
    /// Conflict handling.
    pub conflict: ConflictDirective,
    /// Free-form trailing option, or the conflict-update template override.
    pub insert_option: Option<&'o str>,
    /// Keyword between `INSERT` and `INTO`.
    pub insert_modifier: Option<&'o str>,
}

// ============================================================================
// Builders
// ============================================================================

/// INSERT builder for a single record.
#[derive(Debug)]
pub struct InsertBuilder<'a, R: Record> {
    record: &'a R,
    dialect: &'a dyn Dialect,
    options: InsertOptions<'a>,
}

impl<'a, R: Record> InsertBuilder<'a, R> {
    /// Create a new INSERT builder for the given record.
    pub fn new(record: &'a R, dialect: &'a dyn Dialect) -> Self {
        Self {
            record,
            dialect,
            options: InsertOptions::default(),
        }
    }

    /// Replace the per-call options.
    pub fn options(mut self, options: InsertOptions<'a>) -> Self {
        self.options = options;
        self
    }

    /// Handle conflicts with `directive`.
    pub fn on_conflict(mut self, directive: ConflictDirective) -> Self {
        self.options.conflict = directive;
        self
    }

    /// Build the statement and execution plan.
    pub fn build(&self) -> Result<InsertPlan> {
        let fields = self.record.descriptors();
        let filter = &self.options.filter;
        let mut columns = ColumnSet::default();
        let mut reload = Vec::new();

        for field in fields.iter().filter(|f| filter.is_changeable(f.info())) {
            if field.is_normal() {
                if field.is_blank() && field.has_default_value() {
                    if !field.info().read_only {
                        reload.push(field.info());
                    }
                } else if !field.is_primary_key() || !field.is_blank() {
                    columns.push(field.column_name(), field.value().clone());
                }
            } else if field.relationship_kind() == Some(RelationshipKind::BelongsTo) {
                for fk in belongs_to_keys(field) {
                    // Foreign keys the caller may set directly are written as
                    // ordinary fields; only the rest come from the association.
                    if let Some(fk) = field_by_name(&fields, fk) {
                        if !filter.is_changeable(fk.info()) {
                            columns.push(fk.column_name(), fk.value().clone());
                        }
                    }
                }
            }
        }

        let primary = primary_field(&fields).map(FieldDescriptor::info);
        let mut bindings = Bindings::new(self.dialect);
        let group = columns.bind_group(&mut bindings);
        let groups = if columns.is_empty() { Vec::new() } else { vec![group] };

        let plan = render::<R>(
            self.dialect,
            &self.options,
            &columns.quoted(self.dialect),
            &groups,
            primary,
            &key_columns(&fields, self.dialect),
            bindings,
        )?;
        tracing::debug!(
            table = R::TABLE_NAME,
            columns = columns.len(),
            reload = reload.len(),
            sql = %plan.statement.sql(),
            "Built insert"
        );
        Ok(InsertPlan { reload, ..plan })
    }
}

/// INSERT builder for a batch of rows sharing one record type.
///
/// Columns come from `template` (the first record of the batch) filtered the
/// way a single-row insert filters them; each row supplies the value for a
/// column, falling back to the template's current value.
#[derive(Debug)]
pub struct InsertManyBuilder<'a, R: Record> {
    template: &'a R,
    payload: &'a BatchPayload,
    dialect: &'a dyn Dialect,
    options: InsertOptions<'a>,
}

impl<'a, R: Record> InsertManyBuilder<'a, R> {
    /// Create a new bulk INSERT builder.
    pub fn new(template: &'a R, payload: &'a BatchPayload, dialect: &'a dyn Dialect) -> Self {
        Self {
            template,
            payload,
            dialect,
            options: InsertOptions::default(),
        }
    }

    /// Replace the per-call options.
    pub fn options(mut self, options: InsertOptions<'a>) -> Self {
        self.options = options;
        self
    }

    /// Build the statement and execution plan.
    pub fn build(&self) -> Result<InsertPlan> {
        if self.payload.is_empty() {
            return Err(Error::Custom("batch insert requires at least one row".to_string()));
        }
        let fields = self.template.descriptors();
        let filter = &self.options.filter;

        let writable: Vec<&FieldDescriptor> = fields
            .iter()
            .filter(|f| filter.is_changeable(f.info()) && f.is_normal())
            .filter(|f| !(f.is_primary_key() && f.is_blank()))
            .collect();

        let mut names = ColumnSet::default();
        for field in writable.iter().filter(|f| !(f.is_blank() && f.has_default_value())) {
            names.push(field.column_name(), field.value().clone());
        }
        // `DEFAULT VALUES` inserts exactly one row, so a multi-row batch
        // keeps its defaulted columns and writes their current values.
        if names.is_empty() && self.payload.len() > 1 {
            for field in &writable {
                names.push(field.column_name(), field.value().clone());
            }
            if names.is_empty() {
                return Err(Error::Custom(format!(
                    "batch insert of {} rows into {} has no writable columns",
                    self.payload.len(),
                    R::TABLE_NAME
                )));
            }
        }

        let mut bindings = Bindings::new(self.dialect);
        let mut groups = Vec::with_capacity(self.payload.len());
        if !names.is_empty() {
            for row in self.payload.rows() {
                let placeholders: Vec<String> = names
                    .iter()
                    .map(|(column, fallback)| bindings.bind(row.get(column).unwrap_or(fallback).clone()))
                    .collect();
                groups.push(format!("({})", placeholders.join(", ")));
            }
        }

        let primary = primary_field(&fields).map(FieldDescriptor::info);
        let plan = render::<R>(
            self.dialect,
            &self.options,
            &names.quoted(self.dialect),
            &groups,
            primary,
            &key_columns(&fields, self.dialect),
            bindings,
        )?;
        tracing::debug!(
            table = R::TABLE_NAME,
            rows = self.payload.len(),
            columns = names.len(),
            sql = %plan.statement.sql(),
            "Built batch insert"
        );
        Ok(InsertPlan {
            rows: self.payload.len(),
            ..plan
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Ordered, de-duplicated columns with the value each one binds.
#[derive(Debug, Default)]
struct ColumnSet {
    names: Vec<&'static str>,
    values: Vec<Value>,
    seen: BTreeSet<&'static str>,
}

impl ColumnSet {
    /// First writer of a column wins.
    fn push(&mut self, column: &'static str, value: Value) {
        if self.seen.insert(column) {
            self.names.push(column);
            self.values.push(value);
        }
    }

    fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.names.iter().copied().zip(self.values.iter())
    }

    fn len(&self) -> usize {
        self.names.len()
    }

    fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn quoted(&self, dialect: &dyn Dialect) -> Vec<String> {
        self.names.iter().map(|c| dialect.quote(c)).collect()
    }

    fn bind_group(&self, bindings: &mut Bindings<'_>) -> String {
        let placeholders: Vec<String> = self.values.iter().map(|v| bindings.bind(v.clone())).collect();
        format!("({})", placeholders.join(", "))
    }
}

fn belongs_to_keys(field: &FieldDescriptor) -> &'static [&'static str] {
    match field.info().relationship {
        Some(rel) => rel.foreign_keys,
        None => &[],
    }
}

fn key_columns(fields: &[FieldDescriptor], dialect: &dyn Dialect) -> Vec<String> {
    fields
        .iter()
        .filter(|f| f.is_primary_key())
        .map(|f| dialect.quote(f.column_name()))
        .collect()
}

/// Assemble the final SQL text around already-bound value groups.
fn render<R: Record>(
    dialect: &dyn Dialect,
    options: &InsertOptions<'_>,
    columns: &[String],
    groups: &[String],
    primary: Option<&'static FieldInfo>,
    key_columns: &[String],
    mut bindings: Bindings<'_>,
) -> Result<InsertPlan> {
    let clause = resolve_conflict(
        &options.conflict,
        dialect,
        options.insert_option,
        key_columns,
        &mut bindings,
    )?;

    let modifier = match (normalize_modifier(options.insert_modifier), clause.modifier) {
        (Some(user), Some(ignore)) => Some(format!("{} {}", user, ignore)),
        (user, ignore) => user.or(ignore),
    };

    let table = dialect.quote(R::TABLE_NAME);
    let key = primary.map_or(KeyPlan::LastInsertId, |pk| {
        KeyPlan::resolve(dialect, &table, &dialect.quote(pk.column_name), !columns.is_empty())
    });

    let mut sql = String::from("INSERT");
    if let Some(modifier) = &modifier {
        sql.push(' ');
        sql.push_str(modifier);
    }
    sql.push_str(" INTO ");
    sql.push_str(&table);

    if columns.is_empty() {
        sql.push(' ');
        sql.push_str(dialect.default_values());
    } else {
        sql.push_str(&format!(" ({})", columns.join(", ")));
        if let Some(fragment) = key.interstitial() {
            sql.push(' ');
            sql.push_str(fragment);
        }
        sql.push_str(" VALUES ");
        sql.push_str(&groups.join(", "));
    }

    if let Some(option) = &clause.option {
        sql.push(' ');
        sql.push_str(option);
    }
    if let Some(suffix) = key.suffix() {
        // The SCOPE_IDENTITY fallback starts with its own separator.
        if !suffix.starts_with(';') {
            sql.push(' ');
        }
        sql.push_str(suffix);
    }

    Ok(InsertPlan {
        statement: bindings.finish(sql),
        key,
        primary,
        reload: Vec::new(),
        rows: 1,
    })
}
