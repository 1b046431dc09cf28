//! SQL dialect policies for INSERT.
//!
//! A dialect answers everything the statement builder cannot decide on its
//! own: identifier quoting, placeholder syntax, the default-values literal,
//! conflict-handling templates, and how a generated key comes back.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlrecord_core::{quote_ident, quote_ident_mysql};

use crate::key::KeyRetrieval;

/// Token in an insert-option template that receives the rendered
/// `column = value` list.
pub const TEMPLATE_SLOT: &str = "{}";

/// How a dialect expresses "skip rows that conflict".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreClause {
    /// A keyword between `INSERT` and `INTO` (`IGNORE`, `OR IGNORE`).
    Modifier(&'static str),
    /// A trailing clause (`ON CONFLICT DO NOTHING`).
    Suffix(&'static str),
}

/// What a conflict-update must key on.
#[derive(Debug, Clone, Copy)]
pub struct ConflictTarget<'a> {
    /// Named constraint or index, already validated as an identifier.
    pub constraint: Option<&'a str>,
    /// Quoted primary-key columns of the record.
    pub key_columns: &'a [String],
}

/// Dialect policy consulted by the statement builder.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Short name for logs and errors.
    fn name(&self) -> &'static str;

    /// Quote a table or column identifier.
    fn quote(&self, ident: &str) -> String {
        quote_ident(ident)
    }

    /// Placeholder for the 1-based parameter `index`.
    fn placeholder(&self, index: usize) -> String;

    /// Literal used when no column is inserted.
    fn default_values(&self) -> &'static str {
        "DEFAULT VALUES"
    }

    /// Key-retrieval mode, fixed per dialect.
    fn key_retrieval(&self) -> KeyRetrieval;

    /// Fragment spliced between the column list and `VALUES`.
    #[allow(unused_variables)]
    fn output_interstitial(&self, table: &str, key_column: &str, has_columns: bool) -> Option<String> {
        None
    }

    /// Clause appended after everything else.
    #[allow(unused_variables)]
    fn returning_suffix(&self, table: &str, key_column: &str) -> Option<String> {
        None
    }

    /// Ignore-on-conflict keyword, if supported.
    fn ignore_clause(&self) -> Option<IgnoreClause> {
        None
    }

    /// Update-on-conflict template with one [`TEMPLATE_SLOT`], if supported.
    #[allow(unused_variables)]
    fn conflict_update_template(&self, target: &ConflictTarget<'_>) -> Option<String> {
        None
    }

    /// Whether multi-row statements report a trustworthy affected count.
    fn reports_batch_row_counts(&self) -> bool {
        true
    }
}

/// PostgreSQL: `$n` placeholders, `RETURNING`, `ON CONFLICT`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn key_retrieval(&self) -> KeyRetrieval {
        KeyRetrieval::ReturningSuffix
    }

    fn returning_suffix(&self, table: &str, key_column: &str) -> Option<String> {
        Some(format!("RETURNING {}.{}", table, key_column))
    }

    fn ignore_clause(&self) -> Option<IgnoreClause> {
        Some(IgnoreClause::Suffix("ON CONFLICT DO NOTHING"))
    }

    fn conflict_update_template(&self, target: &ConflictTarget<'_>) -> Option<String> {
        match target.constraint {
            Some(constraint) => Some(format!(
                "ON CONFLICT ON CONSTRAINT {} DO UPDATE SET {}",
                constraint, TEMPLATE_SLOT
            )),
            None if !target.key_columns.is_empty() => Some(format!(
                "ON CONFLICT ({}) DO UPDATE SET {}",
                target.key_columns.join(", "),
                TEMPLATE_SLOT
            )),
            None => None,
        }
    }
}

/// MySQL: `?` placeholders, backticks, driver last-insert-id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote(&self, ident: &str) -> String {
        quote_ident_mysql(ident)
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn default_values(&self) -> &'static str {
        "VALUES()"
    }

    fn key_retrieval(&self) -> KeyRetrieval {
        KeyRetrieval::LastInsertId
    }

    fn ignore_clause(&self) -> Option<IgnoreClause> {
        Some(IgnoreClause::Modifier("IGNORE"))
    }

    fn conflict_update_template(&self, _target: &ConflictTarget<'_>) -> Option<String> {
        Some(format!("ON DUPLICATE KEY UPDATE {}", TEMPLATE_SLOT))
    }
}

/// SQLite: `?n` placeholders, driver last-insert-id, `ON CONFLICT (cols)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("?{}", index)
    }

    fn key_retrieval(&self) -> KeyRetrieval {
        KeyRetrieval::LastInsertId
    }

    fn ignore_clause(&self) -> Option<IgnoreClause> {
        Some(IgnoreClause::Modifier("OR IGNORE"))
    }

    fn conflict_update_template(&self, target: &ConflictTarget<'_>) -> Option<String> {
        // SQLite upserts name columns, never constraints.
        if target.constraint.is_some() || target.key_columns.is_empty() {
            return None;
        }
        Some(format!(
            "ON CONFLICT ({}) DO UPDATE SET {}",
            target.key_columns.join(", "),
            TEMPLATE_SLOT
        ))
    }
}

/// SQL Server: `@pn` placeholders, `OUTPUT Inserted.<key>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MsSql;

impl Dialect for MsSql {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("@p{}", index)
    }

    fn key_retrieval(&self) -> KeyRetrieval {
        KeyRetrieval::OutputInterstitial { scan: true }
    }

    fn output_interstitial(&self, _table: &str, key_column: &str, has_columns: bool) -> Option<String> {
        // No OUTPUT clause fits `DEFAULT VALUES`; fall back to the suffix.
        has_columns.then(|| format!("OUTPUT Inserted.{}", key_column))
    }

    fn returning_suffix(&self, _table: &str, _key_column: &str) -> Option<String> {
        Some("; SELECT SCOPE_IDENTITY()".to_string())
    }

    fn reports_batch_row_counts(&self) -> bool {
        false
    }
}

/// Built-in dialect selector, for configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// [`Postgres`]
    #[default]
    Postgres,
    /// [`MySql`]
    Mysql,
    /// [`Sqlite`]
    Sqlite,
    /// [`MsSql`]
    Mssql,
}

impl DialectKind {
    /// Instantiate the selected dialect.
    pub fn into_dialect(self) -> Arc<dyn Dialect> {
        match self {
            DialectKind::Postgres => Arc::new(Postgres),
            DialectKind::Mysql => Arc::new(MySql),
            DialectKind::Sqlite => Arc::new(Sqlite),
            DialectKind::Mssql => Arc::new(MsSql),
        }
    }
}
