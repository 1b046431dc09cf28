//! Generated-key retrieval.
//!
//! Each dialect registers exactly one [`KeyRetrieval`] mode. Per statement,
//! the mode is resolved into a [`KeyPlan`] that says which SQL fragment (if
//! any) to render and whether the statement must run as a row-returning
//! query. An output interstitial always suppresses the returning suffix:
//! a statement carries one mechanism at most.

use crate::dialect::Dialect;

/// Per-dialect key-retrieval mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRetrieval {
    /// Plain exec, then the driver's last-insert-id accessor.
    LastInsertId,
    /// Fragment spliced before `VALUES`. With `scan`, the statement runs as
    /// a query and the key is scanned from its output.
    OutputInterstitial {
        /// Whether the output must be scanned as rows.
        scan: bool,
    },
    /// Trailing clause; the statement runs as a query.
    ReturningSuffix,
}

/// Resolved retrieval plan for one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPlan {
    /// No fragment; plain exec and last-insert-id.
    LastInsertId,
    /// Spliced fragment.
    Interstitial {
        /// SQL fragment rendered between columns and `VALUES`.
        fragment: String,
        /// Whether to query-and-scan instead of exec.
        scan: bool,
    },
    /// Trailing fragment; always query-and-scan.
    Returning {
        /// SQL fragment appended at the end.
        suffix: String,
    },
}

impl KeyPlan {
    /// Resolve the dialect's mode for a table and quoted key column.
    pub fn resolve(dialect: &dyn Dialect, table: &str, key_column: &str, has_columns: bool) -> Self {
        let returning = || {
            dialect
                .returning_suffix(table, key_column)
                .map_or(KeyPlan::LastInsertId, |suffix| KeyPlan::Returning { suffix })
        };
        match dialect.key_retrieval() {
            KeyRetrieval::LastInsertId => KeyPlan::LastInsertId,
            KeyRetrieval::OutputInterstitial { scan } => {
                match dialect.output_interstitial(table, key_column, has_columns) {
                    Some(fragment) => KeyPlan::Interstitial { fragment, scan },
                    None => returning(),
                }
            }
            KeyRetrieval::ReturningSuffix => returning(),
        }
    }

    /// Fragment to splice before `VALUES`.
    pub fn interstitial(&self) -> Option<&str> {
        match self {
            KeyPlan::Interstitial { fragment, .. } => Some(fragment),
            _ => None,
        }
    }

    /// Fragment to append at the end.
    pub fn suffix(&self) -> Option<&str> {
        match self {
            KeyPlan::Returning { suffix } => Some(suffix),
            _ => None,
        }
    }

    /// Whether the statement must run as a query and scan the key.
    pub fn needs_scan(&self) -> bool {
        match self {
            KeyPlan::LastInsertId => false,
            KeyPlan::Interstitial { scan, .. } => *scan,
            KeyPlan::Returning { .. } => true,
        }
    }
}
