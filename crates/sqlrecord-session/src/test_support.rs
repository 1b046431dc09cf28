//! Scripted connection and hand-written records for unit tests.

use std::collections::VecDeque;

use sqlrecord_core::{
    AssociationPhase, Connection, DriverError, DriverErrorKind, Error, ExecResult, Executor,
    FieldInfo, FromValue, Record, RecordEvents, Result, Row, Timestamp, Value,
};

#[derive(Debug)]
pub(crate) enum Scripted {
    Exec(ExecResult),
    Rows(Vec<Row>),
    Fail(DriverErrorKind),
}

/// Replays scripted responses in order; once the script runs dry, `execute`
/// succeeds with one row and id 1 and `query` returns nothing.
#[derive(Debug, Default)]
pub(crate) struct StubConnection {
    pub script: VecDeque<Scripted>,
    pub log: Vec<String>,
    pub in_tx: bool,
    pub begins: usize,
    pub commits: usize,
    pub rollbacks: usize,
    pub fail_commit: bool,
}

impl StubConnection {
    pub fn push(&mut self, response: Scripted) {
        self.script.push_back(response);
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    fn fail(kind: DriverErrorKind) -> Error {
        DriverError::new(kind, "scripted failure").into()
    }
}

impl Executor for StubConnection {
    fn execute(&mut self, sql: &str, _params: &[Value]) -> Result<ExecResult> {
        self.log.push(sql.to_string());
        match self.script.pop_front() {
            Some(Scripted::Exec(result)) => Ok(result),
            Some(Scripted::Rows(rows)) => Ok(ExecResult::new(rows.len() as u64)),
            Some(Scripted::Fail(kind)) => Err(Self::fail(kind)),
            None => Ok(ExecResult::new(1).with_last_insert_id(1)),
        }
    }

    fn query(&mut self, sql: &str, _params: &[Value]) -> Result<Vec<Row>> {
        self.log.push(sql.to_string());
        match self.script.pop_front() {
            Some(Scripted::Rows(rows)) => Ok(rows),
            Some(Scripted::Exec(_)) | None => Ok(Vec::new()),
            Some(Scripted::Fail(kind)) => Err(Self::fail(kind)),
        }
    }
}

impl Connection for StubConnection {
    fn begin(&mut self) -> Result<()> {
        self.begins += 1;
        self.in_tx = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.fail_commit {
            return Err(Self::fail(DriverErrorKind::Other));
        }
        self.commits += 1;
        self.in_tx = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.rollbacks += 1;
        self.in_tx = false;
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.in_tx
    }
}

/// A user row whose hooks record the order they ran in.
#[derive(Debug, Clone, Default)]
pub(crate) struct TestUser {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    pub events: Vec<&'static str>,
    pub fail_in: Option<&'static str>,
}

impl TestUser {
    fn event(&mut self, name: &'static str) -> Result<()> {
        self.events.push(name);
        if self.fail_in == Some(name) {
            return Err(Error::hook(name, "refused"));
        }
        Ok(())
    }
}

impl Record for TestUser {
    const TABLE_NAME: &'static str = "users";

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[
            FieldInfo::new("id", "id").primary_key(true),
            FieldInfo::new("name", "name"),
            FieldInfo::new("role", "role").default("'member'"),
            FieldInfo::new("created_at", "created_at"),
            FieldInfo::new("updated_at", "updated_at"),
        ];
        FIELDS
    }

    fn field_value(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::BigInt(self.id)),
            "name" => Some(Value::Text(self.name.clone())),
            "role" => Some(Value::Text(self.role.clone())),
            "created_at" => Some(self.created_at.into()),
            "updated_at" => Some(self.updated_at.into()),
            _ => None,
        }
    }

    fn set_field_value(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "id" => self.id = i64::from_value(value)?,
            "name" => self.name = String::from_value(value)?,
            "role" => self.role = String::from_value(value)?,
            "created_at" => self.created_at = Option::<Timestamp>::from_value(value)?,
            "updated_at" => self.updated_at = Option::<Timestamp>::from_value(value)?,
            _ => return Err(Error::field(name, "unknown field")),
        }
        Ok(())
    }
}

impl RecordEvents for TestUser {
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

    fn save_associations(&mut self, phase: AssociationPhase, _executor: &mut dyn Executor) -> Result<()> {
        match phase {
            AssociationPhase::Before => self.event("save_associations_before"),
            AssociationPhase::After => self.event("save_associations_after"),
        }
    }
}

/// A record whose generated key may not be written by the pipeline.
#[derive(Debug, Clone, Default)]
pub(crate) struct Locked {
    pub id: i64,
    pub label: String,
}

impl Record for Locked {
    const TABLE_NAME: &'static str = "locked";

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: &[FieldInfo] = &[
            FieldInfo::new("id", "id").primary_key(true).read_only(true),
            FieldInfo::new("label", "label"),
        ];
        FIELDS
    }

    fn field_value(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::BigInt(self.id)),
            "label" => Some(Value::Text(self.label.clone())),
            _ => None,
        }
    }

    fn set_field_value(&mut self, name: &str, value: Value) -> Result<()> {
        match name {
            "id" => self.id = i64::from_value(value)?,
            "label" => self.label = String::from_value(value)?,
            _ => return Err(Error::field(name, "unknown field")),
        }
        Ok(())
    }
}

impl RecordEvents for Locked {}
