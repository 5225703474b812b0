use async_trait::async_trait;

use crate::error::SqlParamsError;
use crate::types::WireValue;

/// Identifier of a backend-side prepared statement, unique per connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatementId(pub u64);

impl std::fmt::Display for StatementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the backend reported after compiling a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementInfo {
    pub id: StatementId,
    /// Number of placeholders the backend expects.
    pub parameter_count: usize,
    /// Result columns, empty for statements that return no rows.
    pub columns: Vec<String>,
}

/// Raw result of one backend round trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<WireValue>>,
    /// Rows changed by a write; zero for reads.
    pub rows_affected: usize,
}

impl BackendOutput {
    /// True when the statement produced a row set (possibly empty).
    #[must_use]
    pub fn is_read(&self) -> bool {
        !self.columns.is_empty()
    }
}

/// A single logical connection to a backend.
///
/// Implementations must not interleave commands: each call completes before
/// the next one starts, in issue order. Backend rejections come back as
/// `PrepareError` / `ExecutionError`; a lost connection as `TransportError`.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Run a parameterless batch (DDL, setup scripts).
    async fn execute_batch(&self, sql: &str) -> Result<(), SqlParamsError>;

    /// Run one statement with already-ordered values.
    async fn execute(&self, sql: &str, values: &[WireValue])
    -> Result<BackendOutput, SqlParamsError>;

    /// Compile a statement for repeated execution.
    async fn prepare(&self, sql: &str) -> Result<StatementInfo, SqlParamsError>;

    /// Run a statement compiled by [`prepare`](Self::prepare).
    async fn execute_prepared(
        &self,
        id: StatementId,
        values: &[WireValue],
    ) -> Result<BackendOutput, SqlParamsError>;

    /// Free a prepared statement.
    async fn release(&self, id: StatementId) -> Result<(), SqlParamsError>;

    /// Free a prepared statement without waiting for the backend.
    ///
    /// Called from `Drop`, so it must not block on I/O. It can follow a
    /// cancelled [`release`](Self::release) of the same id, so ids the
    /// backend no longer knows must be ignored.
    fn release_detached(&self, id: StatementId);
}
