//! In-memory connection and test records shared by the integration tests.
//!
//! `MemoryConnection` understands exactly the statements the pipeline
//! generates: multi-row `INSERT` (with `IGNORE` modifiers, `ON CONFLICT` /
//! `ON DUPLICATE KEY` clauses, `RETURNING` and `OUTPUT`) and the keyed
//! `SELECT` used to reload defaults. Tables enforce unique columns, assign
//! auto-increment keys and fill column defaults.

#![allow(dead_code)]

use std::collections::BTreeMap;

use sqlrecord::prelude::*;
use sqlrecord::{DriverError, DriverErrorKind};

// ============================================================================
// Tables
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Table {
    auto_increment: Option<String>,
    unique: Vec<String>,
    defaults: BTreeMap<String, Value>,
    rows: Vec<BTreeMap<String, Value>>,
    next_id: i64,
}

impl Table {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Auto-increment primary key column (also unique).
    pub fn auto_increment(mut self, column: &str) -> Self {
        self.auto_increment = Some(column.to_string());
        self.unique.push(column.to_string());
        self
    }

    /// Unique column.
    pub fn unique(mut self, column: &str) -> Self {
        self.unique.push(column.to_string());
        self
    }

    /// Column default applied when the insert does not name the column.
    pub fn default_value(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.defaults.insert(column.to_string(), value.into());
        self
    }

    pub fn rows(&self) -> &[BTreeMap<String, Value>] {
        &self.rows
    }

    fn conflict(&self, row: &BTreeMap<String, Value>) -> Option<(usize, String)> {
        self.unique.iter().find_map(|column| {
            let value = row.get(column).filter(|v| !v.is_null())?;
            self.rows
                .iter()
                .position(|existing| existing.get(column) == Some(value))
                .map(|pos| (pos, column.clone()))
        })
    }
}

// ============================================================================
// Connection
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryConnection {
    tables: BTreeMap<String, Table>,
    snapshot: Option<BTreeMap<String, Table>>,
    log: Vec<String>,
    params: Vec<Vec<Value>>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, table: Table) -> Self {
        self.tables.insert(name.to_string(), table);
        self
    }

    pub fn table(&self, name: &str) -> &Table {
        &self.tables[name]
    }

    /// Every statement sent, in order.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Parameters of every statement sent, in order.
    pub fn params(&self) -> &[Vec<Value>] {
        &self.params
    }

    fn record(&mut self, sql: &str, params: &[Value]) {
        self.log.push(sql.to_string());
        self.params.push(params.to_vec());
    }

    fn run_insert(&mut self, sql: &str, params: &[Value]) -> Result<Outcome> {
        let parsed = ParsedInsert::parse(sql)?;
        let table = self
            .tables
            .get_mut(&parsed.table)
            .ok_or_else(|| driver(DriverErrorKind::Other, format!("no such table: {}", parsed.table)))?;

        let width = parsed.columns.len();
        let bound = width * parsed.groups;
        if params.len() < bound {
            return Err(driver(DriverErrorKind::Other, "not enough parameters"));
        }
        let (row_params, update_params) = params.split_at(bound);
        let backup = table.clone();
        let mut outcome = Outcome::default();

        for group in 0..parsed.groups {
            let mut row = table.defaults.clone();
            for (column, value) in parsed
                .columns
                .iter()
                .zip(&row_params[group * width..(group + 1) * width])
            {
                row.insert(column.clone(), value.clone());
            }
            if let Some(pk) = table.auto_increment.clone() {
                match row.get(&pk).and_then(Value::as_i64) {
                    Some(id) if id != 0 => table.next_id = table.next_id.max(id + 1),
                    _ => {
                        row.insert(pk, Value::BigInt(table.next_id));
                        table.next_id += 1;
                    }
                }
            }

            if let Some((pos, column)) = table.conflict(&row) {
                if !parsed.updates.is_empty() {
                    for (column, value) in parsed.updates.iter().zip(update_params) {
                        table.rows[pos].insert(column.clone(), value.clone());
                    }
                    outcome.push(&table.rows[pos], table.auto_increment.as_deref(), parsed.returning.as_deref());
                } else if parsed.ignore {
                    continue;
                } else {
                    *table = backup;
                    return Err(driver(
                        DriverErrorKind::UniqueViolation,
                        format!("duplicate value for unique column {column}"),
                    ));
                }
            } else {
                outcome.push(&row, table.auto_increment.as_deref(), parsed.returning.as_deref());
                table.rows.push(row);
            }
        }
        Ok(outcome)
    }

    fn run_select(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let body = sql
            .strip_prefix("SELECT ")
            .ok_or_else(|| driver(DriverErrorKind::Other, "unsupported statement"))?;
        let (columns, rest) = body
            .split_once(" FROM ")
            .ok_or_else(|| driver(DriverErrorKind::Other, "missing FROM"))?;
        let (table, conditions) = rest.split_once(" WHERE ").unwrap_or((rest, ""));
        let columns: Vec<String> = columns.split(", ").map(unquote).collect();
        let filters: Vec<(String, &Value)> = conditions
            .split(" AND ")
            .filter(|c| !c.is_empty())
            .filter_map(|c| c.split_once(" = ").map(|(col, _)| unquote(col)))
            .zip(params)
            .collect();

        let table = self
            .tables
            .get(&unquote(table))
            .ok_or_else(|| driver(DriverErrorKind::Other, "no such table"))?;
        Ok(table
            .rows
            .iter()
            .filter(|row| filters.iter().all(|(col, v)| row.get(col) == Some(*v)))
            .map(|row| {
                Row::new(
                    columns.clone(),
                    columns.iter().map(|c| row.get(c).cloned().unwrap_or_default()).collect(),
                )
            })
            .collect())
    }
}

impl Executor for MemoryConnection {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        self.record(sql, params);
        let outcome = self.run_insert(sql, params)?;
        let result = ExecResult::new(outcome.affected);
        Ok(match outcome.last_id {
            Some(id) => result.with_last_insert_id(id),
            None => result,
        })
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.record(sql, params);
        if sql.starts_with("INSERT") {
            Ok(self.run_insert(sql, params)?.returned)
        } else {
            self.run_select(sql, params)
        }
    }
}

impl Connection for MemoryConnection {
    fn begin(&mut self) -> Result<()> {
        if self.snapshot.is_some() {
            return Err(driver(DriverErrorKind::Other, "transaction already open"));
        }
        self.snapshot = Some(self.tables.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.snapshot
            .take()
            .map(|_| ())
            .ok_or_else(|| driver(DriverErrorKind::Other, "no transaction"))
    }

    fn rollback(&mut self) -> Result<()> {
        let snapshot = self
            .snapshot
            .take()
            .ok_or_else(|| driver(DriverErrorKind::Other, "no transaction"))?;
        self.tables = snapshot;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }
}

#[derive(Debug, Default)]
struct Outcome {
    affected: u64,
    last_id: Option<i64>,
    returned: Vec<Row>,
}

impl Outcome {
    fn push(&mut self, row: &BTreeMap<String, Value>, pk: Option<&str>, returning: Option<&str>) {
        self.affected += 1;
        if let Some(id) = pk.and_then(|pk| row.get(pk)).and_then(Value::as_i64) {
            self.last_id = Some(id);
        }
        if let Some(column) = returning {
            let value = row.get(column).cloned().unwrap_or_default();
            self.returned.push(Row::new(vec![column.to_string()], vec![value]));
        }
    }
}

fn driver(kind: DriverErrorKind, message: impl Into<String>) -> Error {
    DriverError::new(kind, message).into()
}

fn unquote(ident: &str) -> String {
    ident.trim().trim_matches(|c| c == '"' || c == '`').to_string()
}

// ============================================================================
// INSERT parsing
// ============================================================================

#[derive(Debug)]
struct ParsedInsert {
    table: String,
    ignore: bool,
    columns: Vec<String>,
    groups: usize,
    updates: Vec<String>,
    returning: Option<String>,
}

impl ParsedInsert {
    fn parse(sql: &str) -> Result<Self> {
        let bad = || driver(DriverErrorKind::Other, format!("unsupported insert: {sql}"));
        let rest = sql.strip_prefix("INSERT").ok_or_else(bad)?;
        let into = rest.find(" INTO ").ok_or_else(bad)?;
        let ignore = rest[..into].contains("IGNORE");
        let rest = &rest[into + " INTO ".len()..];
        let (table, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
        let table = unquote(table);

        let mut columns = Vec::new();
        if rest.starts_with('(') {
            let close = rest.find(')').ok_or_else(bad)?;
            columns = rest[1..close].split(", ").map(unquote).collect();
            rest = rest[close + 1..].trim_start();
        }

        let mut returning = None;
        if let Some(output) = rest.strip_prefix("OUTPUT Inserted.") {
            let (column, tail) = output.split_once(' ').ok_or_else(bad)?;
            returning = Some(unquote(column));
            rest = tail;
        }

        let mut groups = 0;
        if let Some(tail) = rest.strip_prefix("DEFAULT VALUES").or_else(|| rest.strip_prefix("VALUES()")) {
            groups = 1;
            rest = tail;
        } else if let Some(mut tail) = rest.strip_prefix("VALUES ") {
            while tail.starts_with('(') {
                let close = tail.find(')').ok_or_else(bad)?;
                groups += 1;
                tail = &tail[close + 1..];
                if let Some(next) = tail.strip_prefix(", ") {
                    tail = next;
                }
            }
            rest = tail;
        }
        let rest = rest.trim();

        let ignore = ignore || rest.contains("ON CONFLICT DO NOTHING");
        let updates = ["DO UPDATE SET ", "ON DUPLICATE KEY UPDATE "]
            .iter()
            .find_map(|marker| rest.find(marker).map(|at| &rest[at + marker.len()..]))
            .map(|assignments| {
                let assignments = assignments.split(" RETURNING ").next().unwrap_or_default();
                assignments
                    .split(", ")
                    .filter_map(|pair| pair.split_once(" = ").map(|(col, _)| unquote(col)))
                    .collect()
            })
            .unwrap_or_default();

        if let Some(at) = rest.find("RETURNING ") {
            let target = &rest[at + "RETURNING ".len()..];
            let column = target.rsplit('.').next().unwrap_or(target);
            returning = Some(unquote(column));
        } else if rest.contains("SCOPE_IDENTITY()") {
            returning = Some("id".to_string());
        }

        Ok(Self {
            table,
            ignore,
            columns,
            groups,
            updates,
            returning,
        })
    }
}

// ============================================================================
// Records
// ============================================================================

/// An email address row with a unique address and creation timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Email {
    pub id: i64,
    pub user_id: i64,
    pub email: String,
    pub user_agent: String,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

impl Email {
    pub fn new(user_id: i64, email: &str) -> Self {
        Self {
            user_id,
            email: email.to_string(),
            ..Self::default()
        }
    }
}

impl Record for Email {
    const TABLE_NAME: &'static str = "emails";

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[
            FieldInfo::new("id", "id").primary_key(true),
            FieldInfo::new("user_id", "user_id"),
            FieldInfo::new("email", "email"),
            FieldInfo::new("user_agent", "user_agent"),
            FieldInfo::new("created_at", "created_at"),
            FieldInfo::new("updated_at", "updated_at"),
        ];
        FIELDS
    }

    fn field_value(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::BigInt(self.id)),
            "user_id" => Some(Value::BigInt(self.user_id)),
            "email" => Some(Value::Text(self.email.clone())),
            "user_agent" => Some(Value::Text(self.user_agent.clone())),
            "created_at" => Some(self.created_at.into()),
            "updated_at" => Some(self.updated_at.into()),
            _ => None,
        }
    }

    fn set_field_value(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "id" => self.id = i64::from_value(value)?,
            "user_id" => self.user_id = i64::from_value(value)?,
            "email" => self.email = String::from_value(value)?,
            "user_agent" => self.user_agent = String::from_value(value)?,
            "created_at" => self.created_at = Option::<Timestamp>::from_value(value)?,
            "updated_at" => self.updated_at = Option::<Timestamp>::from_value(value)?,
            _ => return Err(Error::field(name, "unknown field")),
        }
        Ok(())
    }
}

impl RecordEvents for Email {}

pub fn email_table() -> Table {
    Table::new().auto_increment("id").unique("email")
}

/// An account whose `status` and `visits` columns have database defaults,
/// with hooks that can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub visits: i32,
    pub events: Vec<&'static str>,
    pub fail_in: Option<&'static str>,
}

impl Account {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn event(&mut self, name: &'static str) -> Result<()> {
        self.events.push(name);
        match self.fail_in {
            Some(event) if event == name => Err(Error::hook(event, "rejected by test")),
            _ => Ok(()),
        }
    }
}

impl Record for Account {
    const TABLE_NAME: &'static str = "accounts";

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[
            FieldInfo::new("id", "id").primary_key(true),
            FieldInfo::new("name", "name"),
            FieldInfo::new("status", "status").default("'active'"),
            FieldInfo::new("visits", "visits").default("7"),
        ];
        FIELDS
    }

    fn field_value(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::BigInt(self.id)),
            "name" => Some(Value::Text(self.name.clone())),
            "status" => Some(Value::Text(self.status.clone())),
            "visits" => Some(Value::Int(self.visits)),
            _ => None,
        }
    }

    fn set_field_value(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "id" => self.id = i64::from_value(value)?,
            "name" => self.name = String::from_value(value)?,
            "status" => self.status = String::from_value(value)?,
            "visits" => self.visits = i32::from_value(value)?,
            _ => return Err(Error::field(name, "unknown field")),
        }
        Ok(())
    }
}

impl RecordEvents for Account {
    fn before_save(&mut self) -> Result<()> {
        self.event("before_save")
    }

    fn before_create(&mut self) -> Result<()> {
        self.event("before_create")
    }

    fn after_create(&mut self) -> Result<()> {
        self.event("after_create")
    }

    fn after_save(&mut self) -> Result<()> {
        self.event("after_save")
    }
}

pub fn account_table() -> Table {
    Table::new()
        .auto_increment("id")
        .default_value("status", "active")
        .default_value("visits", 7_i32)
}

/// A fresh connection with the `emails` and `accounts` tables.
pub fn memory() -> MemoryConnection {
    MemoryConnection::new()
        .with_table("emails", email_table())
        .with_table("accounts", account_table())
}

pub const NOW: Timestamp = Timestamp(1_700_000_000_000_000);
