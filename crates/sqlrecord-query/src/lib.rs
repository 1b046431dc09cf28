//! INSERT statement building for SQLRecord Rust.
//!
//! `sqlrecord-query` is the **SQL text layer** of the record creation
//! pipeline. It turns a record's field view into a [`Statement`] and decides
//! how the generated key will be read back, without touching a connection.
//!
//! # Role In The Architecture
//!
//! - **Statement Builder**: [`InsertBuilder`] (one record) and
//!   [`InsertManyBuilder`] (a validated [`BatchPayload`]).
//! - **Conflict Clause Resolver**: [`ConflictDirective`] rendered through
//!   [`resolve_conflict`] into a modifier and/or trailing clause.
//! - **Dialect policy**: the [`Dialect`] trait plus the built-in
//!   [`Postgres`], [`MySql`], [`Sqlite`] and [`MsSql`] dialects.
//! - **Key retrieval**: each dialect registers one [`KeyRetrieval`] mode,
//!   resolved per statement into a [`KeyPlan`].
//!
//! `sqlrecord-session` consumes the resulting [`InsertPlan`].

pub mod conflict;
pub mod dialect;
pub mod insert;
pub mod key;
pub mod statement;

pub use conflict::{ConflictClause, ConflictDirective, resolve_conflict};
pub use dialect::{
    ConflictTarget, Dialect, DialectKind, IgnoreClause, MsSql, MySql, Postgres, Sqlite, TEMPLATE_SLOT,
};
pub use insert::{
    BatchPayload, FieldFilter, InsertBuilder, InsertManyBuilder, InsertOptions, InsertPlan,
    normalize_modifier,
};
pub use key::{KeyPlan, KeyRetrieval};
pub use statement::{Bindings, Statement};
