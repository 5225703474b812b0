use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::connection::{BackendOutput, Connection, StatementId, StatementInfo};
use crate::error::SqlParamsError;
use crate::types::WireValue;

use super::manager::SqliteWorker;

/// Owned `SQLite` connection backed by a dedicated worker thread.
///
/// Commands are queued to the worker and run one at a time in arrival
/// order. Clones share the same worker.
#[derive(Clone)]
pub struct SqliteConnection {
    worker: Arc<SqliteWorker>,
}

impl SqliteConnection {
    /// Hand an open `rusqlite` connection to a new worker thread.
    ///
    /// # Errors
    /// Returns `SqlParamsError::TransportError` if the worker thread cannot be spawned.
    pub fn new(conn: rusqlite::Connection) -> Result<Self, SqlParamsError> {
        let worker = SqliteWorker::spawn(conn)?;
        Ok(Self {
            worker: Arc::new(worker),
        })
    }

    /// Stop the worker. Every later command fails with `TransportError`.
    pub fn close(&self) {
        self.worker.shutdown();
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("worker_id", &self.worker.worker_id())
            .finish()
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    async fn execute_batch(&self, sql: &str) -> Result<(), SqlParamsError> {
        self.worker.execute_batch(sql.to_owned()).await
    }

    async fn execute(
        &self,
        sql: &str,
        values: &[WireValue],
    ) -> Result<BackendOutput, SqlParamsError> {
        self.worker.execute(sql.to_owned(), values.to_vec()).await
    }

    async fn prepare(&self, sql: &str) -> Result<StatementInfo, SqlParamsError> {
        self.worker.prepare(sql.to_owned()).await
    }

    async fn execute_prepared(
        &self,
        id: StatementId,
        values: &[WireValue],
    ) -> Result<BackendOutput, SqlParamsError> {
        self.worker.execute_prepared(id, values.to_vec()).await
    }

    async fn release(&self, id: StatementId) -> Result<(), SqlParamsError> {
        self.worker.release(id).await
    }

    fn release_detached(&self, id: StatementId) {
        self.worker.release_detached(id);
    }
}
