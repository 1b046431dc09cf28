//! Session configuration and per-call create options.

use serde::{Deserialize, Serialize};
use sqlrecord_core::{Error, Result};
use sqlrecord_query::{ConflictDirective, DialectKind, FieldFilter, InsertOptions};

// ============================================================================
// Session Configuration
// ============================================================================

/// Configuration for Session behavior.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use sqlrecord_session::SessionConfig;
///
/// let config = SessionConfig::from_json(r#"{"dialect": "mysql", "reload_defaults": false}"#).unwrap();
/// assert!(config.transactional);
/// assert!(!config.reload_defaults);
/// assert_eq!(config.created_at_field, "created_at");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Built-in dialect used by [`Session::from_config`](crate::Session::from_config).
    pub dialect: DialectKind,
    /// Wrap each create in its own transaction when none is open.
    pub transactional: bool,
    /// Read back columns left to their database default.
    pub reload_defaults: bool,
    /// Field stamped with the creation time when blank. Empty disables.
    pub created_at_field: String,
    /// Field stamped with the update time when blank. Empty disables.
    pub updated_at_field: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dialect: DialectKind::default(),
            transactional: true,
            reload_defaults: true,
            created_at_field: "created_at".to_string(),
            updated_at_field: "updated_at".to_string(),
        }
    }
}

impl SessionConfig {
    /// Parse a JSON document; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Custom(format!("invalid session config: {e}")))
    }

    /// Configured timestamp field names, skipping disabled ones.
    pub(crate) fn timestamp_fields(&self) -> impl Iterator<Item = &str> {
        [self.created_at_field.as_str(), self.updated_at_field.as_str()]
            .into_iter()
            .filter(|name| !name.is_empty())
    }
}

// ============================================================================
// Create Options
// ============================================================================

/// Per-call options travelling with one create through every hook step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateOptions {
    /// Conflict handling.
    pub conflict: ConflictDirective,
    /// Free-form clause appended after `VALUES`; with an update directive,
    /// the template (one `{}` slot) replacing the dialect's.
    pub insert_option: Option<String>,
    /// Keyword between `INSERT` and `INTO` (`IGNORE`, `LOW_PRIORITY`, ...).
    pub insert_modifier: Option<String>,
    /// Only these fields are written, when non-empty.
    pub select: Vec<String>,
    /// These fields are never written (ignored when `select` is set).
    pub omit: Vec<String>,
}

impl CreateOptions {
    /// Options with nothing set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle conflicts with `directive`.
    pub fn on_conflict(mut self, directive: ConflictDirective) -> Self {
        self.conflict = directive;
        self
    }

    /// Set the free-form insert option.
    pub fn insert_option(mut self, option: impl Into<String>) -> Self {
        self.insert_option = Some(option.into());
        self
    }

    /// Set the insert modifier.
    pub fn insert_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.insert_modifier = Some(modifier.into());
        self
    }

    /// Restrict the create to the named fields.
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Exclude the named fields from the create.
    pub fn omit<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.omit = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Borrowed view handed to the statement builders.
    pub(crate) fn insert_options(&self) -> InsertOptions<'_> {
        InsertOptions {
            filter: FieldFilter::new(self.select.clone(), self.omit.clone()),
            conflict: self.conflict.clone(),
            insert_option: self.insert_option.as_deref(),
            insert_modifier: self.insert_modifier.as_deref(),
        }
    }
}
