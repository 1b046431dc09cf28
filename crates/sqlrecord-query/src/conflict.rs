//! Insert-time conflict resolution (ignore / update).

use std::collections::BTreeMap;

use sqlrecord_core::{Error, Record, Result, Value, validate_identifier};

use crate::dialect::{ConflictTarget, Dialect, IgnoreClause, TEMPLATE_SLOT};
use crate::statement::Bindings;

/// What to do when the inserted row collides with a unique constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ConflictDirective {
    /// Let the database raise the violation.
    #[default]
    None,
    /// Skip conflicting rows.
    Ignore,
    /// Update the listed columns to the given values.
    UpdateColumns(BTreeMap<String, Value>),
    /// Update to the non-blank column values of an object, optionally
    /// keyed on a named constraint.
    UpdateFromObject {
        /// Constraint or index name, inlined into the template.
        constraint: Option<String>,
        /// Column values taken from the object.
        values: BTreeMap<String, Value>,
    },
}

impl ConflictDirective {
    /// Update specific columns on conflict.
    pub fn update_columns<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        ConflictDirective::UpdateColumns(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Update to `object`'s non-blank persisted columns on conflict.
    pub fn update_from<R: Record>(constraint: Option<&str>, object: &R) -> Self {
        let values = object
            .descriptors()
            .into_iter()
            .filter(|f| f.is_normal() && !f.is_blank())
            .map(|f| (f.column_name().to_string(), f.into_value()))
            .collect();
        ConflictDirective::UpdateFromObject {
            constraint: constraint.map(str::to_string),
            values,
        }
    }

    /// Whether any conflict handling was requested.
    pub fn is_none(&self) -> bool {
        matches!(self, ConflictDirective::None)
    }

    /// Name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            ConflictDirective::None => "none",
            ConflictDirective::Ignore => "ignore",
            ConflictDirective::UpdateColumns(_) => "update_columns",
            ConflictDirective::UpdateFromObject { .. } => "update_from_object",
        }
    }
}

/// Rendered conflict handling for one statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictClause {
    /// Keyword placed between `INSERT` and `INTO`.
    pub modifier: Option<String>,
    /// Clause appended after `VALUES (...)`.
    pub option: Option<String>,
}

/// Render `directive` for `dialect`.
///
/// `insert_option` is the caller's free-form option: appended verbatim when
/// no update is requested, and used as the template (instead of the
/// dialect's) when one is. Update values are bound through `bindings`, so
/// this must run after the column values are bound.
pub fn resolve_conflict(
    directive: &ConflictDirective,
    dialect: &dyn Dialect,
    insert_option: Option<&str>,
    key_columns: &[String],
    bindings: &mut Bindings<'_>,
) -> Result<ConflictClause> {
    let missing = || Error::MissingConflictTemplate {
        dialect: dialect.name(),
        directive: directive.name(),
    };

    match directive {
        ConflictDirective::None => Ok(ConflictClause {
            modifier: None,
            option: insert_option.map(str::to_string),
        }),
        ConflictDirective::Ignore => match dialect.ignore_clause().ok_or_else(missing)? {
            IgnoreClause::Modifier(keyword) => Ok(ConflictClause {
                modifier: Some(keyword.to_string()),
                option: insert_option.map(str::to_string),
            }),
            IgnoreClause::Suffix(clause) => Ok(ConflictClause {
                modifier: None,
                option: Some(match insert_option {
                    Some(extra) => format!("{} {}", clause, extra),
                    None => clause.to_string(),
                }),
            }),
        },
        ConflictDirective::UpdateColumns(values) => {
            let target = ConflictTarget {
                constraint: None,
                key_columns,
            };
            let template = insert_option
                .map(str::to_string)
                .or_else(|| dialect.conflict_update_template(&target))
                .ok_or_else(missing)?;
            render_update(&template, values, dialect, bindings)
        }
        ConflictDirective::UpdateFromObject { constraint, values } => {
            let constraint = constraint.as_deref().map(validate_identifier).transpose()?;
            let target = ConflictTarget {
                constraint,
                key_columns,
            };
            let template = insert_option
                .map(str::to_string)
                .or_else(|| dialect.conflict_update_template(&target))
                .ok_or_else(missing)?;
            render_update(&template, values, dialect, bindings)
        }
    }
}

fn render_update(
    template: &str,
    values: &BTreeMap<String, Value>,
    dialect: &dyn Dialect,
    bindings: &mut Bindings<'_>,
) -> Result<ConflictClause> {
    if values.is_empty() {
        return Err(Error::Custom(
            "conflict update requires at least one column".to_string(),
        ));
    }
    if !template.contains(TEMPLATE_SLOT) {
        return Err(Error::InvalidConflictTemplate(template.to_string()));
    }
    // BTreeMap iteration is sorted by column name, which keeps the SQL text
    // stable across runs.
    let assignments: Vec<String> = values
        .iter()
        .map(|(column, value)| format!("{} = {}", dialect.quote(column), bindings.bind(value.clone())))
        .collect();
    Ok(ConflictClause {
        modifier: None,
        option: Some(template.replacen(TEMPLATE_SLOT, &assignments.join(", "), 1)),
    })
}
