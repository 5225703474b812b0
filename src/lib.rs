//! Parameterized query binding and execution.
//!
//! Templates carry positional (`?`) or named (`:label`) placeholders, never
//! both. A [`Binding`](resolver::Binding) supplies the values, the resolver
//! orders them, and an [`Executor`](executor::Executor) runs the statement on
//! a [`Connection`](connection::Connection), either directly or through a
//! prepared statement that is released exactly once.
//!
//! ```rust
//! use sql_params::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), SqlParamsError> {
//! let exec = SqliteOptions::new(":memory:")
//!     .connect(ExecutorOptions::default())
//!     .await?;
//! exec.execute_batch("CREATE TABLE t (a TEXT, b INTEGER);").await?;
//!
//! let binding = Binding::named([("a", Value::from("apple")), ("b", Value::Int(10))]);
//! let res = exec
//!     .execute(&Query::raw("INSERT INTO t (a, b) VALUES (:a, :b)"), &binding)
//!     .await;
//! assert_eq!(res.rows_affected(), Some(1));
//!
//! let rows = exec
//!     .execute_raw("SELECT a, b FROM t WHERE b > ?", &[Value::Int(5)])
//!     .await
//!     .into_row_set()?;
//! assert_eq!(rows[0].get("a"), Some(&Value::from("apple")));
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod prepared;
pub mod query;
pub mod resolver;
pub mod results;
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod template;
pub mod types;

pub use config::{Dialect, ExecutorOptions};
pub use error::SqlParamsError;
pub use executor::{ExecutionResult, Executor, QueryOutput};
pub use resolver::Binding;
pub use types::Value;
