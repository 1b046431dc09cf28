//! Rendered SQL plus ordered parameters.

use sqlrecord_core::Value;

use crate::dialect::Dialect;

/// A finished statement. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<Value>,
}

impl Statement {
    /// Wrap SQL text and its parameters.
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound parameters, in placeholder order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Split into parts.
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }
}

/// Parameter accumulator handing out dialect placeholders in bind order.
#[derive(Debug)]
pub struct Bindings<'d> {
    dialect: &'d dyn Dialect,
    params: Vec<Value>,
}

impl<'d> Bindings<'d> {
    /// Empty accumulator.
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            params: Vec::new(),
        }
    }

    /// Bind `value` and return the placeholder that refers to it.
    pub fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        self.dialect.placeholder(self.params.len())
    }

    /// Number of bound parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// True if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Finish with the given SQL text.
    pub fn finish(self, sql: String) -> Statement {
        Statement::new(sql, self.params)
    }
}
