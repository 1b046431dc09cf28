//! Execution engine: run an [`InsertPlan`], write keys back, reload defaults.

use sqlrecord_core::{Error, Executor, FieldInfo, Record, Result, Value};
use sqlrecord_query::{Bindings, Dialect, InsertPlan};

/// Attach the statement text to a driver error that lacks it.
fn with_sql(error: Error, sql: &str) -> Error {
    match error {
        Error::Driver(driver) if driver.sql.is_none() => Error::Driver(driver.with_sql(sql)),
        other => other,
    }
}

fn key_is_blank<R: Record>(record: &R, key: &FieldInfo) -> bool {
    record.field_value(key.name).is_none_or(|v| v.is_blank())
}

/// Run `plan` and return the affected-row count.
///
/// `records` are the instances the plan was built from: one for a
/// single-row insert, the whole batch otherwise. Generated keys are written
/// into them in place.
#[tracing::instrument(level = "debug", skip_all, fields(table = R::TABLE_NAME, rows = plan.rows))]
pub fn execute_insert<R: Record, E: Executor + ?Sized>(
    exec: &mut E,
    dialect: &dyn Dialect,
    plan: &InsertPlan,
    records: &mut [R],
) -> Result<u64> {
    let sql = plan.statement.sql();
    let params = plan.statement.params();

    let Some(key) = plan.primary else {
        let result = exec.execute(sql, params).map_err(|e| with_sql(e, sql))?;
        return Ok(result.rows_affected);
    };

    if plan.key.needs_scan() {
        if key.read_only {
            return Err(Error::UnaddressableKeyField { field: key.name });
        }
        let rows = exec.query(sql, params).map_err(|e| with_sql(e, sql))?;
        tracing::trace!(returned = rows.len(), "Scanned generated keys");

        if !plan.is_batch() {
            let Some(value) = rows.first().and_then(|row| row.get(0)) else {
                // Nothing came back: the row was skipped by a conflict clause.
                return Ok(0);
            };
            if let Some(record) = records.first_mut() {
                record.set_field_value(key.name, value.clone())?;
            }
            return Ok(1);
        }

        // Keys map to records only when every row came back, in order.
        if rows.len() == records.len() {
            for (record, row) in records.iter_mut().zip(&rows) {
                if let Some(value) = row.get(0) {
                    if key_is_blank(record, key) {
                        record.set_field_value(key.name, value.clone())?;
                    }
                }
            }
        }
        return Ok(if dialect.reports_batch_row_counts() {
            rows.len() as u64
        } else {
            plan.rows as u64
        });
    }

    let result = exec.execute(sql, params).map_err(|e| with_sql(e, sql))?;
    if plan.is_batch() {
        return Ok(if dialect.reports_batch_row_counts() {
            result.rows_affected
        } else {
            plan.rows as u64
        });
    }

    if result.rows_affected > 0 {
        if let Some(record) = records.first_mut() {
            if key_is_blank(record, key) {
                if key.read_only {
                    return Err(Error::UnaddressableKeyField { field: key.name });
                }
                let id = result.last_insert_id()?;
                record.set_field_value(key.name, Value::BigInt(id))?;
                tracing::trace!(id, "Wrote last insert id");
            }
        }
    }
    Ok(result.rows_affected)
}

/// Copy database-computed defaults for `columns` back into `record`.
///
/// Keyed by the record's primary-key values; skipped when none of them is
/// set, since the row cannot be addressed.
#[tracing::instrument(level = "debug", skip_all, fields(table = R::TABLE_NAME, columns = columns.len()))]
pub fn reload_defaults<R: Record, E: Executor + ?Sized>(
    exec: &mut E,
    dialect: &dyn Dialect,
    record: &mut R,
    columns: &[&'static FieldInfo],
) -> Result<()> {
    if columns.is_empty() {
        return Ok(());
    }
    let keys: Vec<(&FieldInfo, Value)> = R::fields()
        .iter()
        .filter(|f| f.primary_key)
        .filter_map(|f| record.field_value(f.name).map(|v| (f, v)))
        .filter(|(_, v)| !v.is_blank())
        .collect();
    if keys.is_empty() {
        tracing::debug!("No primary key value; skipping reload");
        return Ok(());
    }

    let mut bindings = Bindings::new(dialect);
    let selected: Vec<String> = columns.iter().map(|f| dialect.quote(f.column_name)).collect();
    let conditions: Vec<String> = keys
        .into_iter()
        .map(|(f, v)| format!("{} = {}", dialect.quote(f.column_name), bindings.bind(v)))
        .collect();
    let sql = format!(
        "SELECT {} FROM {} WHERE {}",
        selected.join(", "),
        dialect.quote(R::TABLE_NAME),
        conditions.join(" AND ")
    );
    let statement = bindings.finish(sql);

    let Some(row) = exec
        .query_one(statement.sql(), statement.params())
        .map_err(|e| with_sql(e, statement.sql()))?
    else {
        tracing::debug!("Row not found; nothing reloaded");
        return Ok(());
    };
    for field in columns {
        if let Some(value) = row.get_by_name(field.column_name) {
            record.set_column_value(field.column_name, value.clone())?;
        }
    }
    Ok(())
}
