//! Structured queries rendered to [`QueryTemplate`]s.
//!
//! ```rust
//! use sql_params::prelude::*;
//!
//! let t = Table::new("fruit", ["a", "b"]);
//! let insert = Insert::into_table(&t)
//!     .row([Cell::param(), Cell::from(10)])
//!     .row([Cell::from("apricot"), Cell::param()]);
//! let template = Query::from(insert).render(Dialect::Sqlite)?;
//! assert_eq!(template.sql(), r#"INSERT INTO "fruit" ("a", "b") VALUES (?, ?), (?, ?)"#);
//! assert_eq!(template.positional_count(), 2);
//! # Ok::<(), SqlParamsError>(())
//! ```

use crate::config::Dialect;
use crate::error::SqlParamsError;
use crate::schema::Table;
use crate::template::{QueryTemplate, TemplateBuilder};
use crate::types::Value;

/// A value position in a structured query.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// A literal, bound as a parameter when rendered.
    Value(Value),
    /// A positional placeholder.
    Param,
    /// A named placeholder.
    Named(String),
}

impl Cell {
    #[must_use]
    pub fn param() -> Self {
        Cell::Param
    }

    #[must_use]
    pub fn named(label: impl Into<String>) -> Self {
        Cell::Named(label.into())
    }

    fn render(&self, builder: &mut TemplateBuilder) {
        match self {
            Cell::Value(value) => builder.literal(value.clone()),
            Cell::Param => builder.positional(),
            Cell::Named(label) => builder.named(label),
        }
    }
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        Cell::Value(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Value(Value::from(value))
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Value(Value::Int(value))
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::Value(Value::from(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => " = ",
            CompareOp::NotEq => " != ",
            CompareOp::Lt => " < ",
            CompareOp::LtEq => " <= ",
            CompareOp::Gt => " > ",
            CompareOp::GtEq => " >= ",
        }
    }
}

/// One term of a `WHERE` conjunction.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        column: String,
        op: CompareOp,
        rhs: Cell,
    },
    IsNull(String),
    IsNotNull(String),
}

impl Condition {
    pub fn compare(column: impl Into<String>, op: CompareOp, rhs: impl Into<Cell>) -> Self {
        Condition::Compare {
            column: column.into(),
            op,
            rhs: rhs.into(),
        }
    }

    pub fn eq(column: impl Into<String>, rhs: impl Into<Cell>) -> Self {
        Self::compare(column, CompareOp::Eq, rhs)
    }

    /// `column != rhs`. A `NULL` right-hand side matches nothing, per SQL three-valued logic.
    pub fn ne(column: impl Into<String>, rhs: impl Into<Cell>) -> Self {
        Self::compare(column, CompareOp::NotEq, rhs)
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Condition::IsNull(column.into())
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        Condition::IsNotNull(column.into())
    }

    fn render(&self, builder: &mut TemplateBuilder) {
        match self {
            Condition::Compare { column, op, rhs } => {
                builder.push_identifier(column);
                builder.push_sql(op.as_sql());
                rhs.render(builder);
            }
            Condition::IsNull(column) => {
                builder.push_identifier(column);
                builder.push_sql(" IS NULL");
            }
            Condition::IsNotNull(column) => {
                builder.push_identifier(column);
                builder.push_sql(" IS NOT NULL");
            }
        }
    }
}

fn render_filter(builder: &mut TemplateBuilder, filter: &[Condition]) {
    for (i, condition) in filter.iter().enumerate() {
        builder.push_sql(if i == 0 { " WHERE " } else { " AND " });
        condition.render(builder);
    }
}

fn push_identifier_list(builder: &mut TemplateBuilder, idents: &[String]) {
    for (i, ident) in idents.iter().enumerate() {
        if i > 0 {
            builder.push_sql(", ");
        }
        builder.push_identifier(ident);
    }
}

/// Multi-row `INSERT`.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    table: Table,
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Insert {
    /// Insert into every column of `table`, in table order.
    #[must_use]
    pub fn into_table(table: &Table) -> Self {
        Self {
            table: table.clone(),
            columns: table.columns().as_ref().clone(),
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn columns<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn row<I>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = Cell>,
    {
        self.rows.push(cells.into_iter().collect());
        self
    }

    fn render(&self, builder: &mut TemplateBuilder) -> Result<(), SqlParamsError> {
        if self.rows.is_empty() {
            return Err(SqlParamsError::InvalidQuery(format!(
                "insert into {} has no rows",
                self.table.name()
            )));
        }
        builder.push_sql("INSERT INTO ");
        builder.push_identifier(self.table.name());
        if !self.columns.is_empty() {
            builder.push_sql(" (");
            push_identifier_list(builder, &self.columns);
            builder.push_sql(")");
        }
        builder.push_sql(" VALUES ");
        for (r, row) in self.rows.iter().enumerate() {
            if !self.columns.is_empty() && row.len() != self.columns.len() {
                return Err(SqlParamsError::InvalidQuery(format!(
                    "insert row {r} has {} cells, expected {}",
                    row.len(),
                    self.columns.len()
                )));
            }
            if r > 0 {
                builder.push_sql(", ");
            }
            builder.push_sql("(");
            for (c, cell) in row.iter().enumerate() {
                if c > 0 {
                    builder.push_sql(", ");
                }
                cell.render(builder);
            }
            builder.push_sql(")");
        }
        Ok(())
    }
}

/// `UPDATE ... SET ... [WHERE ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    table: Table,
    set: Vec<(String, Cell)>,
    filter: Vec<Condition>,
}

impl Update {
    #[must_use]
    pub fn table(table: &Table) -> Self {
        Self {
            table: table.clone(),
            set: Vec::new(),
            filter: Vec::new(),
        }
    }

    #[must_use]
    pub fn set(mut self, column: impl Into<String>, cell: impl Into<Cell>) -> Self {
        self.set.push((column.into(), cell.into()));
        self
    }

    #[must_use]
    pub fn and_where(mut self, condition: Condition) -> Self {
        self.filter.push(condition);
        self
    }

    fn render(&self, builder: &mut TemplateBuilder) -> Result<(), SqlParamsError> {
        if self.set.is_empty() {
            return Err(SqlParamsError::InvalidQuery(format!(
                "update of {} sets no columns",
                self.table.name()
            )));
        }
        builder.push_sql("UPDATE ");
        builder.push_identifier(self.table.name());
        builder.push_sql(" SET ");
        for (i, (column, cell)) in self.set.iter().enumerate() {
            if i > 0 {
                builder.push_sql(", ");
            }
            builder.push_identifier(column);
            builder.push_sql(" = ");
            cell.render(builder);
        }
        render_filter(builder, &self.filter);
        Ok(())
    }
}

/// `SELECT ... FROM ... [WHERE ...] [ORDER BY ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    table: Table,
    columns: Vec<String>,
    filter: Vec<Condition>,
    order_by: Vec<String>,
}

impl Select {
    /// Select every column of `table`, in table order.
    #[must_use]
    pub fn from_table(table: &Table) -> Self {
        Self {
            table: table.clone(),
            columns: table.columns().as_ref().clone(),
            filter: Vec::new(),
            order_by: Vec::new(),
        }
    }

    #[must_use]
    pub fn columns<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn and_where(mut self, condition: Condition) -> Self {
        self.filter.push(condition);
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by.push(column.into());
        self
    }

    fn render(&self, builder: &mut TemplateBuilder) {
        builder.push_sql("SELECT ");
        if self.columns.is_empty() {
            builder.push_sql("*");
        } else {
            push_identifier_list(builder, &self.columns);
        }
        builder.push_sql(" FROM ");
        builder.push_identifier(self.table.name());
        render_filter(builder, &self.filter);
        if !self.order_by.is_empty() {
            builder.push_sql(" ORDER BY ");
            push_identifier_list(builder, &self.order_by);
        }
    }
}

/// `DELETE FROM ... [WHERE ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    table: Table,
    filter: Vec<Condition>,
}

impl Delete {
    #[must_use]
    pub fn from_table(table: &Table) -> Self {
        Self {
            table: table.clone(),
            filter: Vec::new(),
        }
    }

    #[must_use]
    pub fn and_where(mut self, condition: Condition) -> Self {
        self.filter.push(condition);
        self
    }

    fn render(&self, builder: &mut TemplateBuilder) {
        builder.push_sql("DELETE FROM ");
        builder.push_identifier(self.table.name());
        render_filter(builder, &self.filter);
    }
}

/// Every kind of statement the executor can run.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Insert(Insert),
    Update(Update),
    Select(Select),
    Delete(Delete),
    /// Hand-written SQL with `?` or `:label` placeholders.
    Raw(String),
}

impl Query {
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Query::Raw(sql.into())
    }

    /// Render to a template for `dialect`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` for structurally empty statements and
    /// `MixedPlaceholders` if positional and named cells are combined.
    pub fn render(&self, dialect: Dialect) -> Result<QueryTemplate, SqlParamsError> {
        let mut builder = TemplateBuilder::new(dialect);
        match self {
            Query::Insert(insert) => insert.render(&mut builder)?,
            Query::Update(update) => update.render(&mut builder)?,
            Query::Select(select) => select.render(&mut builder),
            Query::Delete(delete) => delete.render(&mut builder),
            Query::Raw(sql) => return QueryTemplate::parse(sql, dialect),
        }
        builder.finish()
    }

    /// Column order rows should be materialized in, when the query declares one.
    #[must_use]
    pub fn projection(&self) -> Option<&[String]> {
        match self {
            Query::Select(select) if !select.columns.is_empty() => Some(&select.columns),
            _ => None,
        }
    }
}

impl From<Insert> for Query {
    fn from(value: Insert) -> Self {
        Query::Insert(value)
    }
}

impl From<Update> for Query {
    fn from(value: Update) -> Self {
        Query::Update(value)
    }
}

impl From<Select> for Query {
    fn from(value: Select) -> Self {
        Query::Select(value)
    }
}

impl From<Delete> for Query {
    fn from(value: Delete) -> Self {
        Query::Delete(value)
    }
}
