use rusqlite::{Statement, params_from_iter};

use crate::connection::BackendOutput;
use crate::error::SqlParamsError;
use crate::types::WireValue;

use super::params::extract_wire_value;

#[must_use]
pub(crate) fn column_names(stmt: &Statement<'_>) -> Vec<String> {
    stmt.column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect()
}

/// Bind `params` and step `stmt` to completion.
///
/// Statements with result columns are read into rows; everything else
/// reports the number of rows changed. The statement is reset afterwards
/// either way, so prepared statements stay reusable after a failure.
///
/// # Errors
/// Returns `SqlParamsError::SqliteError` for bind or step failures.
pub(crate) fn run_statement(
    stmt: &mut Statement<'_>,
    params: &[WireValue],
) -> Result<BackendOutput, SqlParamsError> {
    let columns = column_names(stmt);
    if columns.is_empty() {
        let rows_affected = stmt.execute(params_from_iter(params.iter()))?;
        return Ok(BackendOutput {
            columns,
            rows: Vec::new(),
            rows_affected,
        });
    }

    let col_count = columns.len();
    let mut rows = Vec::new();
    let mut rows_iter = stmt.query(params_from_iter(params.iter()))?;
    while let Some(row) = rows_iter.next()? {
        let mut cells = Vec::with_capacity(col_count);
        for i in 0..col_count {
            cells.push(extract_wire_value(row.get_ref(i)?));
        }
        rows.push(cells);
    }

    Ok(BackendOutput {
        columns,
        rows,
        rows_affected: 0,
    })
}

/// Classify a failure while running a statement.
pub(crate) fn execution_error(err: impl Into<SqlParamsError>) -> SqlParamsError {
    classify(err.into(), SqlParamsError::ExecutionError)
}

/// Classify a failure while compiling a statement for reuse.
pub(crate) fn prepare_error(err: impl Into<SqlParamsError>) -> SqlParamsError {
    classify(err.into(), SqlParamsError::PrepareError)
}

fn classify(err: SqlParamsError, wrap: fn(String) -> SqlParamsError) -> SqlParamsError {
    match err {
        SqlParamsError::SqliteError(rusqlite::Error::SqliteFailure(code, msg))
            if is_connection_fault(code.code) =>
        {
            SqlParamsError::TransportError(msg.unwrap_or_else(|| code.to_string()))
        }
        SqlParamsError::SqliteError(inner) => wrap(inner.to_string()),
        other => other,
    }
}

fn is_connection_fault(code: rusqlite::ErrorCode) -> bool {
    matches!(
        code,
        rusqlite::ErrorCode::CannotOpen
            | rusqlite::ErrorCode::NotADatabase
            | rusqlite::ErrorCode::SystemIoFailure
            | rusqlite::ErrorCode::DatabaseCorrupt
    )
}
