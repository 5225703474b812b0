use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// SQL dialect used when rendering templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `SQLite`: `?` placeholders, `"` identifiers.
    #[default]
    Sqlite,
    /// MySQL / MariaDB: `?` placeholders, backtick identifiers.
    Mysql,
    /// `PostgreSQL`: `$N` placeholders, `"` identifiers.
    Postgres,
}

impl Dialect {
    /// Render the placeholder for the slot at `position` (1-based).
    pub(crate) fn push_placeholder(self, buf: &mut String, position: usize) {
        match self {
            Dialect::Sqlite | Dialect::Mysql => buf.push('?'),
            Dialect::Postgres => {
                buf.push('$');
                buf.push_str(&position.to_string());
            }
        }
    }

    /// Quote an identifier, doubling any embedded quote character.
    #[must_use]
    pub fn quote_identifier(self, ident: &str) -> String {
        let quote = match self {
            Dialect::Sqlite | Dialect::Postgres => '"',
            Dialect::Mysql => '`',
        };
        let mut out = String::with_capacity(ident.len() + 2);
        out.push(quote);
        for ch in ident.chars() {
            if ch == quote {
                out.push(quote);
            }
            out.push(ch);
        }
        out.push(quote);
        out
    }
}

/// Options for an [`Executor`](crate::executor::Executor).
///
/// ```rust
/// use sql_params::prelude::*;
///
/// let options = ExecutorOptions::default()
///     .with_dialect(Dialect::Sqlite)
///     .with_log_statements(true);
/// # let _ = options;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorOptions {
    pub dialect: Dialect,
    /// Emit the statement text with each `debug!` event.
    pub log_statements: bool,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            log_statements: true,
        }
    }
}

impl ExecutorOptions {
    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    #[must_use]
    pub fn with_log_statements(mut self, log_statements: bool) -> Self {
        self.log_statements = log_statements;
        self
    }
}
