//! Field metadata and the per-instance field view.
//!
//! [`FieldInfo`] is static, per-type metadata produced by the reflection
//! layer. [`FieldDescriptor`] pairs it with a record's current value and is
//! rebuilt fresh for every create operation.

use crate::relationship::{RelationshipInfo, RelationshipKind};
use crate::value::Value;

/// Metadata about a record field/column.
#[derive(Debug, Clone, Copy)]
pub struct FieldInfo {
    /// Rust field name
    pub name: &'static str,
    /// Database column name (may differ from field name)
    pub column_name: &'static str,
    /// Whether this is part of the primary key
    pub primary_key: bool,
    /// Database-side default expression (SQL), if the column has one
    pub default: Option<&'static str>,
    /// Whether the column has a database default even though the
    /// expression is unknown to the application
    pub has_default: bool,
    /// Whether this field is not persisted at all
    pub ignored: bool,
    /// Whether the pipeline may not write this field back
    /// (generated keys, reloaded defaults)
    pub read_only: bool,
    /// Relationship metadata; relationship fields are not normal columns
    pub relationship: Option<RelationshipInfo>,
}

impl FieldInfo {
    /// Create a new field info with minimal required data.
    pub const fn new(name: &'static str, column_name: &'static str) -> Self {
        Self {
            name,
            column_name,
            primary_key: false,
            default: None,
            has_default: false,
            ignored: false,
            read_only: false,
            relationship: None,
        }
    }

    /// Set the database column name.
    pub const fn column(mut self, name: &'static str) -> Self {
        self.column_name = name;
        self
    }

    /// Set primary key flag.
    pub const fn primary_key(mut self, value: bool) -> Self {
        self.primary_key = value;
        self
    }

    /// Set the database default expression.
    pub const fn default(mut self, expr: &'static str) -> Self {
        self.default = Some(expr);
        self.has_default = true;
        self
    }

    /// Mark the column as having a database default (e.g. a serial or a
    /// trigger-populated column) without naming the expression.
    pub const fn has_default(mut self, value: bool) -> Self {
        self.has_default = value;
        self
    }

    /// Exclude the field from persistence.
    pub const fn ignored(mut self, value: bool) -> Self {
        self.ignored = value;
        self
    }

    /// Forbid the pipeline from writing this field.
    pub const fn read_only(mut self, value: bool) -> Self {
        self.read_only = value;
        self
    }

    /// Attach relationship metadata.
    pub const fn relationship(mut self, info: RelationshipInfo) -> Self {
        self.relationship = Some(info);
        self
    }

    /// Whether the column has a database-side default.
    pub const fn has_default_value(&self) -> bool {
        self.has_default || self.default.is_some()
    }

    /// A plain scalar column: persisted and not a relationship.
    pub const fn is_normal(&self) -> bool {
        !self.ignored && self.relationship.is_none()
    }

    /// Match by field name or column name.
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.column_name == name
    }
}

/// A read-only view of one field of one record instance.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    info: &'static FieldInfo,
    value: Value,
    blank: bool,
}

impl FieldDescriptor {
    /// Pair static metadata with the record's current value.
    pub fn new(info: &'static FieldInfo, value: Value) -> Self {
        let blank = value.is_blank();
        Self { info, value, blank }
    }

    /// Static metadata.
    pub fn info(&self) -> &'static FieldInfo {
        self.info
    }

    /// Rust field name.
    pub fn name(&self) -> &'static str {
        self.info.name
    }

    /// Storage column.
    pub fn column_name(&self) -> &'static str {
        self.info.column_name
    }

    /// Primary-key flag.
    pub fn is_primary_key(&self) -> bool {
        self.info.primary_key
    }

    /// Whether the current value is its type's zero value.
    pub fn is_blank(&self) -> bool {
        self.blank
    }

    /// Whether the column has a database default.
    pub fn has_default_value(&self) -> bool {
        self.info.has_default_value()
    }

    /// Whether the field is excluded from persistence.
    pub fn is_ignored(&self) -> bool {
        self.info.ignored
    }

    /// Whether the field is a plain scalar column.
    pub fn is_normal(&self) -> bool {
        self.info.is_normal()
    }

    /// Relationship kind, for relationship fields.
    pub fn relationship_kind(&self) -> Option<RelationshipKind> {
        self.info.relationship.map(|r| r.kind)
    }

    /// Current value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Take the current value.
    pub fn into_value(self) -> Value {
        self.value
    }
}

/// Pick the primary field among descriptors: a primary-key field named `id`
/// wins, otherwise the first primary-key field.
pub fn primary_field(fields: &[FieldDescriptor]) -> Option<&FieldDescriptor> {
    let mut keys = fields.iter().filter(|f| f.is_primary_key()).peekable();
    let first = keys.peek().copied();
    keys.find(|f| f.info.matches("id")).or(first)
}

/// Find a descriptor by field name or column name.
pub fn field_by_name<'a>(fields: &'a [FieldDescriptor], name: &str) -> Option<&'a FieldDescriptor> {
    fields.iter().find(|f| f.info.matches(name))
}
