use std::sync::Arc;

/// Table name and column order, supplied by whoever owns the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    columns: Arc<Vec<String>>,
}

impl Table {
    #[must_use]
    pub fn new<N, I, C>(name: N, columns: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self {
            name: name.into(),
            columns: Arc::new(columns.into_iter().map(Into::into).collect()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn columns(&self) -> &Arc<Vec<String>> {
        &self.columns
    }
}
