use std::collections::BTreeSet;

mod scanner;

use scanner::{State, is_cast, scan_label};

use crate::config::Dialect;
use crate::error::SqlParamsError;
use crate::types::Value;

/// Which kind of placeholders a template (or a binding) uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderMode {
    /// No caller-supplied placeholders at all.
    None,
    /// `?` placeholders, resolved by order.
    Positional,
    /// `:label` placeholders, resolved by name.
    Named,
}

/// One bound position in the rendered SQL, in left-to-right order.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// The n-th (0-based) positional placeholder.
    Positional(usize),
    /// A named placeholder; labels may repeat.
    Named(String),
    /// A literal from a structured query, bound rather than spliced into the text.
    Literal(Value),
}

/// An immutable query with its placeholders extracted.
///
/// `sql` is ready for the backend: every slot is rendered in the dialect's
/// positional form, in the same order as `slots`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTemplate {
    sql: String,
    slots: Vec<Slot>,
    mode: PlaceholderMode,
    positional_count: usize,
}

impl QueryTemplate {
    /// Parse raw SQL containing `?` or `:label` placeholders.
    ///
    /// Placeholder characters inside quoted strings, quoted identifiers and
    /// comments are left alone, as is the `::` cast operator. With
    /// [`Dialect::Postgres`], dollar-quoted bodies are skipped too. With
    /// [`Dialect::Mysql`], `#` starts a line comment and strings honor
    /// backslash escapes.
    ///
    /// # Errors
    ///
    /// Returns `SqlParamsError::MixedPlaceholders` if both kinds appear.
    ///
    /// ```rust
    /// use sql_params::prelude::*;
    ///
    /// let t = QueryTemplate::parse("UPDATE t SET b = :b WHERE a = ':x' AND a = :a", Dialect::Sqlite)?;
    /// assert_eq!(t.sql(), "UPDATE t SET b = ? WHERE a = ':x' AND a = ?");
    /// assert_eq!(t.mode(), PlaceholderMode::Named);
    /// # Ok::<(), SqlParamsError>(())
    /// ```
    pub fn parse(sql: &str, dialect: Dialect) -> Result<Self, SqlParamsError> {
        let mut builder = TemplateBuilder::new(dialect);
        let mut state = State::Normal;
        let mut copied = 0;
        let mut idx = 0;
        let bytes = sql.as_bytes();

        while idx < bytes.len() {
            if state != State::Normal {
                idx += state.skip(bytes, idx, dialect);
                continue;
            }
            if let Some((next, width)) = State::opening(bytes, idx, dialect) {
                state = next;
                idx += width;
                continue;
            }
            match bytes[idx] {
                b'?' => {
                    builder.push_sql(&sql[copied..idx]);
                    builder.positional();
                    idx += 1;
                    copied = idx;
                }
                b':' if is_cast(bytes, idx) => idx += 2,
                b':' => match scan_label(bytes, idx + 1) {
                    Some((end, label)) => {
                        builder.push_sql(&sql[copied..idx]);
                        builder.named(label);
                        idx = end;
                        copied = end;
                    }
                    None => idx += 1,
                },
                _ => idx += 1,
            }
        }
        builder.push_sql(&sql[copied..]);
        builder.finish()
    }

    /// Backend-ready SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    #[must_use]
    pub fn mode(&self) -> PlaceholderMode {
        self.mode
    }

    /// Number of `?` placeholders the caller must bind.
    #[must_use]
    pub fn positional_count(&self) -> usize {
        self.positional_count
    }

    /// Distinct labels referenced by the template.
    #[must_use]
    pub fn named_labels(&self) -> BTreeSet<&str> {
        self.slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Named(label) => Some(label.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Total number of values the backend will receive.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

/// Incrementally assembles a [`QueryTemplate`] while rendering SQL.
#[derive(Debug)]
pub struct TemplateBuilder {
    dialect: Dialect,
    sql: String,
    slots: Vec<Slot>,
    positional_count: usize,
    saw_named: bool,
}

impl TemplateBuilder {
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            slots: Vec::new(),
            positional_count: 0,
            saw_named: false,
        }
    }

    pub fn push_sql(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    pub fn push_identifier(&mut self, ident: &str) {
        let quoted = self.dialect.quote_identifier(ident);
        self.sql.push_str(&quoted);
    }

    pub fn positional(&mut self) {
        self.slots.push(Slot::Positional(self.positional_count));
        self.positional_count += 1;
        self.render_slot();
    }

    pub fn named(&mut self, label: &str) {
        self.slots.push(Slot::Named(label.to_owned()));
        self.saw_named = true;
        self.render_slot();
    }

    pub fn literal(&mut self, value: Value) {
        self.slots.push(Slot::Literal(value));
        self.render_slot();
    }

    fn render_slot(&mut self) {
        let position = self.slots.len();
        self.dialect.push_placeholder(&mut self.sql, position);
    }

    /// # Errors
    ///
    /// Returns `SqlParamsError::MixedPlaceholders` if both `?` and named
    /// placeholders were pushed.
    pub fn finish(self) -> Result<QueryTemplate, SqlParamsError> {
        let mode = match (self.positional_count > 0, self.saw_named) {
            (true, true) => return Err(SqlParamsError::MixedPlaceholders),
            (true, false) => PlaceholderMode::Positional,
            (false, true) => PlaceholderMode::Named,
            (false, false) => PlaceholderMode::None,
        };
        Ok(QueryTemplate {
            sql: self.sql,
            slots: self.slots,
            mode,
            positional_count: self.positional_count,
        })
    }
}
