use std::collections::HashMap;
use std::sync::Arc;

use crate::types::Value;

use super::row::{Row, build_column_index};

/// The rows returned by a read, in backend order.
#[derive(Debug, Clone, Default)]
pub struct RowSet {
    /// The rows returned by the query
    pub results: Vec<Row>,
    column_names: Arc<Vec<String>>,
    column_index: Arc<HashMap<String, usize>>,
}

impl RowSet {
    /// Create an empty row set for the given columns with room for `capacity` rows.
    #[must_use]
    pub fn with_capacity(column_names: Arc<Vec<String>>, capacity: usize) -> RowSet {
        let column_index = Arc::new(build_column_index(&column_names));
        RowSet {
            results: Vec::with_capacity(capacity),
            column_names,
            column_index,
        }
    }

    #[must_use]
    pub fn column_names(&self) -> &Arc<Vec<String>> {
        &self.column_names
    }

    /// Append a row; `values` must follow [`column_names`](Self::column_names).
    pub fn add_row_values(&mut self, values: Vec<Value>) {
        self.results.push(Row::with_index(
            Arc::clone(&self.column_names),
            Arc::clone(&self.column_index),
            values,
        ));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.results.iter()
    }

    /// One column's values, top to bottom.
    #[must_use]
    pub fn column(&self, column_name: &str) -> Option<Vec<&Value>> {
        let idx = *self.column_index.get(column_name)?;
        Some(
            self.results
                .iter()
                .filter_map(|row| row.get_by_index(idx))
                .collect(),
        )
    }
}

impl std::ops::Index<usize> for RowSet {
    type Output = Row;

    fn index(&self, index: usize) -> &Self::Output {
        &self.results[index]
    }
}

impl<'a> IntoIterator for &'a RowSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

impl IntoIterator for RowSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}
