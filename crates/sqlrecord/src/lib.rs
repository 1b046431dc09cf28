//! SQLRecord: a record creation pipeline for relational mapping in Rust.
//!
//! Given an in-memory record (or a batch of records), SQLRecord builds the
//! right `INSERT` for the configured dialect, retrieves generated keys the
//! way that dialect supports, resolves insert-time conflicts, reloads
//! database defaults and runs lifecycle hooks around the write.
//!
//! # Crates
//!
//! - `sqlrecord-core`: values, rows, errors, field metadata and the
//!   `Record` / `Connection` / `Clock` contracts.
//! - `sqlrecord-query`: dialects, the statement builder and the conflict
//!   clause resolver.
//! - `sqlrecord-session`: the hook chain and the [`Session`] entry point.
//!
//! # Quick Start
//!
//! ```ignore
//! use sqlrecord::prelude::*;
//!
//! let mut session = Session::new(conn, Postgres);
//! let mut email = Email { user_id: 1, email: "jeff@qq.com".into(), ..Default::default() };
//! let rows = session.create(&mut email).into_result()?;
//! assert_eq!(rows, 1);
//! assert_ne!(email.id, 0);
//! ```

pub mod session;

pub use sqlrecord_core::{
    AssociationPhase, Clock, Connection, DriverError, DriverErrorKind, Error, ExecResult, Executor,
    FieldDescriptor, FieldInfo, FixedClock, FromValue, Record, RecordEvents, RelationshipInfo,
    RelationshipKind, Result, Row, SystemClock, Timestamp, Value,
};
pub use sqlrecord_query::{
    BatchPayload, ConflictDirective, Dialect, DialectKind, FieldFilter, InsertBuilder,
    InsertManyBuilder, InsertOptions, InsertPlan, KeyPlan, KeyRetrieval, MsSql, MySql, Postgres,
    Sqlite, Statement,
};
pub use session::{CreateOptions, CreateResult, CreateState, CreateStep, Session, SessionConfig};

/// Everything needed to define records and create them.
pub mod prelude {
    pub use crate::{
        AssociationPhase, Clock, ConflictDirective, Connection, CreateOptions, CreateResult,
        CreateState, Dialect, Error, ExecResult, Executor, FieldInfo, FixedClock, FromValue, MsSql,
        MySql, Postgres, Record, RecordEvents, RelationshipInfo, Result, Row, Session,
        SessionConfig, Sqlite, SystemClock, Timestamp, Value,
    };
}
