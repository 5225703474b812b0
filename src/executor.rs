use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, trace, warn};

use crate::codec::encode_all;
use crate::config::ExecutorOptions;
use crate::connection::{BackendOutput, Connection, StatementId, StatementInfo};
use crate::error::SqlParamsError;
use crate::prepared::{PreparedHandle, PreparedStatement};
use crate::query::Query;
use crate::resolver::{Binding, resolve};
use crate::results::{RowSet, materialize};
use crate::template::{PlaceholderMode, QueryTemplate};
use crate::types::Value;

/// What a successful statement produced.
#[derive(Debug, Clone)]
pub enum QueryOutput {
    /// A read: the materialized rows.
    Rows(RowSet),
    /// A write: the number of rows changed.
    Affected(usize),
}

/// Outcome of one execution.
///
/// Backend rejections and local validation failures are carried here
/// instead of being returned as `Err`, so callers can inspect
/// [`success`](Self::success) and [`error`](Self::error) directly, or use
/// [`into_result`](Self::into_result) to get back to `?`.
#[derive(Debug)]
#[must_use]
pub struct ExecutionResult {
    outcome: Result<QueryOutput, SqlParamsError>,
}

impl ExecutionResult {
    pub(crate) fn new(outcome: Result<QueryOutput, SqlParamsError>) -> Self {
        Self { outcome }
    }

    pub fn success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn error(&self) -> Option<&SqlParamsError> {
        self.outcome.as_ref().err()
    }

    pub fn row_set(&self) -> Option<&RowSet> {
        match &self.outcome {
            Ok(QueryOutput::Rows(rows)) => Some(rows),
            _ => None,
        }
    }

    pub fn rows_affected(&self) -> Option<usize> {
        match &self.outcome {
            Ok(QueryOutput::Affected(n)) => Some(*n),
            _ => None,
        }
    }

    /// # Errors
    /// Returns the carried error, if any.
    pub fn into_result(self) -> Result<QueryOutput, SqlParamsError> {
        self.outcome
    }

    /// # Errors
    /// Returns the carried error, or `ExecutionError` if the statement was a write.
    pub fn into_row_set(self) -> Result<RowSet, SqlParamsError> {
        match self.outcome? {
            QueryOutput::Rows(rows) => Ok(rows),
            QueryOutput::Affected(_) => Err(SqlParamsError::ExecutionError(
                "statement did not produce a row set".into(),
            )),
        }
    }
}

struct ActiveStatement {
    parameter_count: usize,
}

struct Inner {
    conn: Box<dyn Connection>,
    options: ExecutorOptions,
    // Held across each round trip so one connection never has two in flight.
    lane: tokio::sync::Mutex<()>,
    active: Mutex<HashMap<StatementId, ActiveStatement>>,
    broken: AtomicBool,
}

/// Binds, executes and materializes statements on one connection.
///
/// Cloning is cheap; clones share the connection and its statement registry.
#[derive(Clone)]
pub struct Executor {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("options", &self.inner.options)
            .field("active_statements", &self.active_statements())
            .field("broken", &self.is_broken())
            .finish()
    }
}

impl Executor {
    pub fn new(conn: impl Connection + 'static, options: ExecutorOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                conn: Box::new(conn),
                options,
                lane: tokio::sync::Mutex::new(()),
                active: Mutex::new(HashMap::new()),
                broken: AtomicBool::new(false),
            }),
        }
    }

    #[must_use]
    pub fn options(&self) -> &ExecutorOptions {
        &self.inner.options
    }

    /// True once a transport failure has been seen; every later call fails fast.
    #[must_use]
    pub fn is_broken(&self) -> bool {
        self.inner.broken.load(Ordering::Acquire)
    }

    /// Number of prepared statements not yet released.
    #[must_use]
    pub fn active_statements(&self) -> usize {
        self.active().len()
    }

    /// Run a parameterless batch such as DDL.
    ///
    /// # Errors
    /// Returns the backend's error, or `TransportError` if the connection is broken.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), SqlParamsError> {
        self.check_usable()?;
        let _lane = self.inner.lane.lock().await;
        debug!(sql, "executing batch");
        let res = self.inner.conn.execute_batch(sql).await;
        self.observe(res)
    }

    /// Render, bind and execute a structured or raw query.
    ///
    /// Rows of a `Select` come back in its projection order.
    pub async fn execute(&self, query: &Query, binding: &Binding) -> ExecutionResult {
        let template = match query.render(self.inner.options.dialect) {
            Ok(template) => template,
            Err(err) => return ExecutionResult::new(Err(err)),
        };
        self.execute_template(&template, binding, query.projection())
            .await
    }

    /// Bind and execute an already-built template.
    pub async fn execute_template(
        &self,
        template: &QueryTemplate,
        binding: &Binding,
        schema: Option<&[String]>,
    ) -> ExecutionResult {
        let values = match resolve(template, binding) {
            Ok(values) => values,
            Err(err) => return ExecutionResult::new(Err(err)),
        };
        ExecutionResult::new(self.run_direct(template.sql(), &values, schema).await)
    }

    /// Execute hand-written SQL with `?` placeholders and a flat value list.
    pub async fn execute_raw(&self, sql: &str, values: &[Value]) -> ExecutionResult {
        let template = match QueryTemplate::parse(sql, self.inner.options.dialect) {
            Ok(template) => template,
            Err(err) => return ExecutionResult::new(Err(err)),
        };
        self.execute_template(&template, &Binding::Positional(values.to_vec()), None)
            .await
    }

    /// Compile `sql` (positional placeholders only) for repeated execution.
    ///
    /// The returned statement releases itself exactly once: explicitly via
    /// [`PreparedStatement::release`], or on drop.
    ///
    /// # Errors
    /// Returns `PrepareError` if the SQL uses named placeholders or the backend
    /// rejects it; no statement is created in that case.
    pub async fn prepare(&self, sql: &str) -> Result<PreparedStatement, SqlParamsError> {
        let template = QueryTemplate::parse(sql, self.inner.options.dialect)
            .map_err(|err| SqlParamsError::PrepareError(err.to_string()))?;
        if template.mode() == PlaceholderMode::Named {
            return Err(SqlParamsError::PrepareError(
                "named placeholders are only supported on direct execution".into(),
            ));
        }
        self.check_usable()?;
        let info = {
            let _lane = self.inner.lane.lock().await;
            trace!(sql = template.sql(), "preparing statement");
            let res = self.inner.conn.prepare(template.sql()).await;
            self.observe(res)?
        };
        let StatementInfo {
            id,
            parameter_count,
            ..
        } = info;
        self.active().insert(id, ActiveStatement { parameter_count });
        let handle = PreparedHandle::new(self.clone(), id, Arc::from(template.sql()));
        Ok(PreparedStatement::new(handle))
    }

    /// Prepare `sql`, run `body` with a handle to it, then release it.
    ///
    /// Release happens whether `body` succeeds, fails or panics; handles
    /// that escape the closure report `StatementReleased` afterwards.
    ///
    /// # Errors
    /// Returns the prepare error, the error produced by `body`, or the release error.
    pub async fn with_prepared<F, Fut, T>(&self, sql: &str, body: F) -> Result<T, SqlParamsError>
    where
        F: FnOnce(PreparedHandle) -> Fut,
        Fut: Future<Output = Result<T, SqlParamsError>>,
    {
        let statement = self.prepare(sql).await?;
        let outcome = body(statement.handle()).await;
        let released = statement.release().await;
        let value = outcome?;
        released?;
        Ok(value)
    }

    /// Execute a prepared statement by id with already-ordered values.
    pub async fn execute_prepared(&self, id: StatementId, values: &[Value]) -> ExecutionResult {
        ExecutionResult::new(self.run_prepared(id, values).await)
    }

    async fn run_direct(
        &self,
        sql: &str,
        values: &[Value],
        schema: Option<&[String]>,
    ) -> Result<QueryOutput, SqlParamsError> {
        self.check_usable()?;
        let wire = encode_all(values);
        let output = {
            let _lane = self.inner.lane.lock().await;
            self.log_round_trip(sql, values.len());
            let res = self.inner.conn.execute(sql, &wire).await;
            self.observe(res)?
        };
        into_output(output, schema)
    }

    async fn run_prepared(
        &self,
        id: StatementId,
        values: &[Value],
    ) -> Result<QueryOutput, SqlParamsError> {
        let expected = self
            .active()
            .get(&id)
            .map(|stmt| stmt.parameter_count)
            .ok_or(SqlParamsError::StatementReleased(id.0))?;
        if expected != values.len() {
            return Err(SqlParamsError::ArityMismatch {
                expected,
                actual: values.len(),
            });
        }
        self.check_usable()?;
        let wire = encode_all(values);
        let output = {
            let _lane = self.inner.lane.lock().await;
            debug!(statement = id.0, params = values.len(), "executing prepared statement");
            let res = self.inner.conn.execute_prepared(id, &wire).await;
            self.observe(res)?
        };
        into_output(output, None)
    }

    /// Release `id` on the backend and wait for it.
    ///
    /// Cancel-safe: until the lane is held the statement stays registered, so
    /// the owning guard's `Drop` still releases it; after that an in-flight
    /// release that is dropped falls back to `release_detached`.
    pub(crate) async fn release(&self, id: StatementId) -> Result<(), SqlParamsError> {
        let _lane = self.inner.lane.lock().await;
        if self.active().remove(&id).is_none() {
            return Err(SqlParamsError::StatementReleased(id.0));
        }
        self.check_usable()?;
        trace!(statement = id.0, "releasing statement");
        let pending = PendingRelease {
            conn: &*self.inner.conn,
            id,
            settled: false,
        };
        let res = self.inner.conn.release(id).await;
        pending.settle();
        self.observe(res)
    }

    pub(crate) fn release_detached(&self, id: StatementId) {
        if self.active().remove(&id).is_none() {
            return;
        }
        if self.is_broken() {
            warn!(statement = id.0, "dropping statement on a broken connection");
            return;
        }
        trace!(statement = id.0, "releasing dropped statement");
        self.inner.conn.release_detached(id);
    }

    pub(crate) fn is_active(&self, id: StatementId) -> bool {
        self.active().contains_key(&id)
    }

    fn active(&self) -> MutexGuard<'_, HashMap<StatementId, ActiveStatement>> {
        match self.inner.active.lock() {
            Ok(guard) => guard,
            // The map is only touched by insert/remove; a poisoned guard is still consistent.
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check_usable(&self) -> Result<(), SqlParamsError> {
        if self.is_broken() {
            return Err(SqlParamsError::TransportError(
                "connection is unusable after an earlier transport failure".into(),
            ));
        }
        Ok(())
    }

    fn observe<T>(&self, res: Result<T, SqlParamsError>) -> Result<T, SqlParamsError> {
        if let Err(err) = &res
            && err.is_transport()
            && !self.inner.broken.swap(true, Ordering::AcqRel)
        {
            warn!(error = %err, "transport failure; marking connection broken");
        }
        res
    }

    fn log_round_trip(&self, sql: &str, params: usize) {
        if self.inner.options.log_statements {
            debug!(sql, params, "executing statement");
        } else {
            debug!(params, "executing statement");
        }
    }
}

/// Backend release that has been issued but not yet answered.
struct PendingRelease<'a> {
    conn: &'a dyn Connection,
    id: StatementId,
    settled: bool,
}

impl PendingRelease<'_> {
    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for PendingRelease<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!(statement = self.id.0, "release cancelled; queueing detached release");
            self.conn.release_detached(self.id);
        }
    }
}

fn into_output(
    output: BackendOutput,
    schema: Option<&[String]>,
) -> Result<QueryOutput, SqlParamsError> {
    if output.is_read() {
        materialize(&output.columns, output.rows, schema).map(QueryOutput::Rows)
    } else {
        Ok(QueryOutput::Affected(output.rows_affected))
    }
}
