//! Error types for the record creation pipeline.

use std::fmt;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of a failure reported by the connection collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// A unique or primary-key constraint rejected the row.
    UniqueViolation,
    /// The driver could not report a last inserted id.
    NoLastInsertId,
    /// Anything else the driver reports.
    Other,
}

/// A failure raised while executing or scanning a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    /// What kind of failure this is.
    pub kind: DriverErrorKind,
    /// Driver-provided message.
    pub message: String,
    /// The SQL that failed, when known.
    pub sql: Option<String>,
}

impl DriverError {
    /// Create a driver error of the given kind.
    pub fn new(kind: DriverErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            sql: None,
        }
    }

    /// Attach the failing SQL text.
    #[must_use]
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(sql) = &self.sql {
            write!(f, " (sql: {sql})")?;
        }
        Ok(())
    }
}

/// The error type for create operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Batch rows declare different column sets. Raised before any SQL is sent.
    HeterogeneousBatch {
        /// Index of the first offending row.
        row: usize,
        /// Columns declared by the first row.
        expected: Vec<String>,
        /// Columns declared by the offending row.
        found: Vec<String>,
    },
    /// A conflict directive was given but no insert-option template exists.
    MissingConflictTemplate {
        /// Dialect name.
        dialect: &'static str,
        /// The directive that needed a template.
        directive: &'static str,
    },
    /// The key must be scanned into a field that cannot be written.
    UnaddressableKeyField {
        /// Field name.
        field: &'static str,
    },
    /// Exec or scan failure from the connection.
    Driver(DriverError),
    /// A lifecycle hook reported failure.
    Hook {
        /// Hook event name (e.g. `before_create`).
        event: &'static str,
        /// Message supplied by the hook.
        message: String,
    },
    /// A field could not be read or written by the record.
    Field {
        /// Field name.
        field: String,
        /// What went wrong.
        message: String,
    },
    /// A caller-supplied conflict-update template has no slot for the
    /// assignments. Raised before any value is bound.
    InvalidConflictTemplate(String),
    /// An identifier that would be inlined into SQL is not a plain identifier.
    InvalidIdentifier(String),
    /// Catch-all.
    Custom(String),
}

impl Error {
    /// Build a hook failure.
    pub fn hook(event: &'static str, message: impl Into<String>) -> Self {
        Error::Hook {
            event,
            message: message.into(),
        }
    }

    /// Build a field access failure.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Field {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether this wraps a unique-constraint violation from the driver.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Error::Driver(DriverError {
                kind: DriverErrorKind::UniqueViolation,
                ..
            })
        )
    }

    /// Whether a lifecycle hook raised this error.
    pub fn is_hook(&self) -> bool {
        matches!(self, Error::Hook { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::HeterogeneousBatch {
                row,
                expected,
                found,
            } => write!(
                f,
                "batch rows must declare the same columns: row {} has [{}], expected [{}]",
                row,
                found.join(", "),
                expected.join(", ")
            ),
            Error::MissingConflictTemplate { dialect, directive } => write!(
                f,
                "no insert option template for {} on dialect {}",
                directive, dialect
            ),
            Error::UnaddressableKeyField { field } => {
                write!(f, "primary key field `{}` cannot be written", field)
            }
            Error::Driver(e) => write!(f, "driver error: {}", e),
            Error::Hook { event, message } => write!(f, "{} hook failed: {}", event, message),
            Error::Field { field, message } => write!(f, "field `{}`: {}", field, message),
            Error::InvalidConflictTemplate(template) => {
                write!(f, "conflict update template has no `{{}}` slot: {:?}", template)
            }
            Error::InvalidIdentifier(ident) => write!(f, "invalid SQL identifier: {:?}", ident),
            Error::Custom(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<DriverError> for Error {
    fn from(e: DriverError) -> Self {
        Error::Driver(e)
    }
}
