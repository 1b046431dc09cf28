//! The `Record` contract implemented by persisted types.
//!
//! `Record` is the reflection boundary: it exposes static field metadata
//! plus read and write access to current values by field name. Lifecycle
//! hooks live on [`RecordEvents`], whose methods all default to no-ops so a
//! type opts into only the events it cares about.

use crate::connection::Executor;
use crate::error::{Error, Result};
use crate::field::{FieldDescriptor, FieldInfo};
use crate::value::Value;

/// A type that maps to one table row.
///
/// # Example
///
/// ```
/// use sqlrecord_core::{FieldInfo, FromValue, Record, Result, Value};
///
/// struct Email {
///     id: i64,
///     address: String,
/// }
///
/// impl Record for Email {
///     const TABLE_NAME: &'static str = "emails";
///
///     fn fields() -> &'static [FieldInfo] {
///         static FIELDS: &[FieldInfo] = &[
///             FieldInfo::new("id", "id").primary_key(true),
///             FieldInfo::new("address", "address"),
///         ];
///         FIELDS
///     }
///
///     fn field_value(&self, name: &str) -> Option<Value> {
///         match name {
///             "id" => Some(Value::BigInt(self.id)),
///             "address" => Some(Value::Text(self.address.clone())),
///             _ => None,
///         }
///     }
///
///     fn set_field_value(&mut self, name: &str, value: Value) -> Result<()> {
///         match name {
///             "id" => self.id = i64::from_value(value)?,
///             "address" => self.address = String::from_value(value)?,
///             _ => return Err(sqlrecord_core::Error::field(name, "unknown field")),
///         }
///         Ok(())
///     }
/// }
///
/// let email = Email { id: 0, address: "jeff@qq.com".into() };
/// let fields = email.descriptors();
/// assert!(fields[0].is_blank());
/// assert!(!fields[1].is_blank());
/// ```
pub trait Record {
    /// Table the record is stored in.
    const TABLE_NAME: &'static str;

    /// Field metadata in declaration order.
    fn fields() -> &'static [FieldInfo];

    /// Current value of a field, by field name. Relationship fields may
    /// return `Value::Null`.
    fn field_value(&self, name: &str) -> Option<Value>;

    /// Overwrite a field, by field name.
    fn set_field_value(&mut self, name: &str, value: Value) -> Result<()>;

    /// Fresh per-instance field view.
    fn descriptors(&self) -> Vec<FieldDescriptor> {
        Self::fields()
            .iter()
            .map(|info| FieldDescriptor::new(info, self.field_value(info.name).unwrap_or_default()))
            .collect()
    }

    /// Overwrite the field stored in `column`.
    fn set_column_value(&mut self, column: &str, value: Value) -> Result<()> {
        let info = Self::fields()
            .iter()
            .find(|f| f.column_name == column)
            .ok_or_else(|| Error::field(column, format!("no field maps to column of {}", Self::TABLE_NAME)))?;
        if info.read_only {
            return Err(Error::field(info.name, "field is read-only"));
        }
        self.set_field_value(info.name, value)
    }
}

/// Which side of the insert an association save runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationPhase {
    /// Before the row exists (belongs-to parents).
    Before,
    /// After the row exists (has-one / has-many / many-to-many children).
    After,
}

/// Lifecycle hooks around a create.
///
/// Returning an error aborts the chain; the error is reported to the caller
/// and the transaction rolls back. Use [`Error::hook`] for hook-specific
/// failures.
#[allow(unused_variables)]
pub trait RecordEvents {
    /// Runs first, for creates and (by convention) updates.
    fn before_save(&mut self) -> Result<()> {
        Ok(())
    }

    /// Runs after `before_save`.
    fn before_create(&mut self) -> Result<()> {
        Ok(())
    }

    /// Runs once the row is written and defaults are reloaded.
    fn after_create(&mut self) -> Result<()> {
        Ok(())
    }

    /// Runs last, after `after_create`.
    fn after_save(&mut self) -> Result<()> {
        Ok(())
    }

    /// Persist associated records through the same executor. Association
    /// handling is owned by the caller; the default does nothing.
    fn save_associations(&mut self, phase: AssociationPhase, executor: &mut dyn Executor) -> Result<()> {
        Ok(())
    }
}
