use std::sync::Arc;

use crate::connection::StatementId;
use crate::error::SqlParamsError;
use crate::executor::{ExecutionResult, Executor};
use crate::types::Value;

/// A cloneable reference to a prepared statement that cannot release it.
///
/// Executing through a handle whose statement has been released yields
/// `StatementReleased`.
#[derive(Clone, Debug)]
pub struct PreparedHandle {
    executor: Executor,
    id: StatementId,
    sql: Arc<str>,
}

impl PreparedHandle {
    pub(crate) fn new(executor: Executor, id: StatementId, sql: Arc<str>) -> Self {
        Self { executor, id, sql }
    }

    /// Execute with already-ordered positional values.
    pub async fn execute(&self, values: &[Value]) -> ExecutionResult {
        self.executor.execute_prepared(self.id, values).await
    }

    #[must_use]
    pub fn id(&self) -> StatementId {
        self.id
    }

    /// The SQL text sent to the backend.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.executor.is_active(self.id)
    }
}

/// Owning guard for a prepared statement.
///
/// Lifecycle: created by [`Executor::prepare`], executed any number of
/// times, released exactly once. [`release`](Self::release) consumes the
/// guard; if it is dropped instead (early return, `?`, panic), the release
/// is queued on the connection without waiting.
#[derive(Debug)]
pub struct PreparedStatement {
    handle: PreparedHandle,
    released: bool,
}

impl PreparedStatement {
    pub(crate) fn new(handle: PreparedHandle) -> Self {
        Self {
            handle,
            released: false,
        }
    }

    /// Execute with already-ordered positional values.
    ///
    /// A failed execution leaves the statement prepared and reusable.
    pub async fn execute(&self, values: &[Value]) -> ExecutionResult {
        self.handle.execute(values).await
    }

    #[must_use]
    pub fn id(&self) -> StatementId {
        self.handle.id
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        self.handle.sql()
    }

    /// A non-owning handle, e.g. for use inside [`Executor::with_prepared`].
    #[must_use]
    pub fn handle(&self) -> PreparedHandle {
        self.handle.clone()
    }

    /// Release the statement on the backend and wait for it.
    ///
    /// If this future is dropped before it completes, the release still
    /// happens once, detached.
    ///
    /// # Errors
    /// Returns the backend's release error. The statement counts as released
    /// either way.
    pub async fn release(mut self) -> Result<(), SqlParamsError> {
        let res = self.handle.executor.release(self.handle.id).await;
        self.released = true;
        res
    }
}

impl Drop for PreparedStatement {
    fn drop(&mut self) {
        if !self.released {
            self.handle.executor.release_detached(self.handle.id);
        }
    }
}
