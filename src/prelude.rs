//! Convenient imports for common functionality.
//!
//! ```rust
//! use sql_params::prelude::*;
//! ```

pub use crate::config::{Dialect, ExecutorOptions};
pub use crate::connection::{BackendOutput, Connection, StatementId, StatementInfo};
pub use crate::error::SqlParamsError;
pub use crate::executor::{ExecutionResult, Executor, QueryOutput};
pub use crate::prepared::{PreparedHandle, PreparedStatement};
pub use crate::query::{Cell, CompareOp, Condition, Delete, Insert, Query, Select, Update};
pub use crate::resolver::{Binding, resolve};
pub use crate::results::{Row, RowSet};
pub use crate::schema::Table;
pub use crate::template::{PlaceholderMode, QueryTemplate, TemplateBuilder};
pub use crate::types::{Value, WireValue};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteConnection, SqliteOptions, SqliteOptionsBuilder, TextEncoding};
