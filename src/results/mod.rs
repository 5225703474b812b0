mod result_set;
mod row;

use std::sync::Arc;

pub use result_set::RowSet;
pub use row::Row;

use crate::codec;
use crate::error::SqlParamsError;
use crate::types::WireValue;

/// Build a [`RowSet`] from raw backend rows.
///
/// Without a `schema`, columns keep backend order. With one, every row is
/// rearranged into schema order by column name. Any undecodable cell, a
/// schema column the backend did not return, or a row whose width differs
/// from `backend_columns` fails the whole call.
///
/// # Errors
///
/// Returns `SqlParamsError::DecodeError`.
pub fn materialize(
    backend_columns: &[String],
    raw_rows: Vec<Vec<WireValue>>,
    schema: Option<&[String]>,
) -> Result<RowSet, SqlParamsError> {
    let positions: Vec<usize> = match schema {
        Some(schema) => {
            let mut used = vec![false; backend_columns.len()];
            schema
                .iter()
                .map(|wanted| {
                    let unused = backend_columns
                        .iter()
                        .enumerate()
                        .position(|(i, col)| col == wanted && !used[i]);
                    let found = unused
                        .or_else(|| backend_columns.iter().position(|col| col == wanted))
                        .ok_or_else(|| {
                            SqlParamsError::DecodeError(format!(
                                "column {wanted} missing from backend result"
                            ))
                        })?;
                    used[found] = true;
                    Ok(found)
                })
                .collect::<Result<_, SqlParamsError>>()?
        }
        None => (0..backend_columns.len()).collect(),
    };
    let column_names: Vec<String> = positions
        .iter()
        .map(|&p| backend_columns[p].clone())
        .collect();

    let mut row_set = RowSet::with_capacity(Arc::new(column_names), raw_rows.len());
    for (r, raw) in raw_rows.into_iter().enumerate() {
        if raw.len() != backend_columns.len() {
            return Err(SqlParamsError::DecodeError(format!(
                "row {r} has {} cells, expected {}",
                raw.len(),
                backend_columns.len()
            )));
        }
        let mut values = Vec::with_capacity(positions.len());
        for &p in &positions {
            let value = codec::decode(raw[p].clone()).map_err(|err| match err {
                SqlParamsError::DecodeError(msg) => SqlParamsError::DecodeError(format!(
                    "row {r}, column {}: {msg}",
                    backend_columns[p]
                )),
                other => other,
            })?;
            values.push(value);
        }
        row_set.add_row_values(values);
    }
    Ok(row_set)
}
