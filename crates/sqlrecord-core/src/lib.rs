//! Core types and traits for SQLRecord Rust.
//!
//! `sqlrecord-core` is the **contract layer** of the record creation pipeline.
//! It defines what the pipeline consumes from its collaborators and the data
//! types shared by every other crate.
//!
//! # Role In The Architecture
//!
//! - **Field metadata view**: `FieldInfo` (static, per type) and
//!   `FieldDescriptor` (per instance, rebuilt for every create).
//! - **Contract traits**: `Record` / `RecordEvents` are implemented by
//!   persisted types; `Executor` / `Connection` by drivers; `Clock` by time
//!   sources.
//! - **Data model**: `Value` and `Row` carry parameters and results.
//!
//! # Who Uses This Crate
//!
//! - `sqlrecord-query` reads field views and renders INSERT statements.
//! - `sqlrecord-session` runs the hook chain and the execution engine.
//! - Drivers implement `Connection` against a real database.

pub mod clock;
pub mod connection;
pub mod error;
pub mod field;
pub mod identifiers;
pub mod record;
pub mod relationship;
pub mod row;
pub mod value;

pub use clock::{Clock, FixedClock, SystemClock, Timestamp};
pub use connection::{Connection, ExecResult, Executor};
pub use error::{DriverError, DriverErrorKind, Error, Result};
pub use field::{FieldDescriptor, FieldInfo, field_by_name, primary_field};
pub use identifiers::{quote_ident, quote_ident_mysql, validate_identifier};
pub use record::{AssociationPhase, Record, RecordEvents};
pub use relationship::{RelationshipInfo, RelationshipKind};
pub use row::Row;
pub use value::{FromValue, Value};
