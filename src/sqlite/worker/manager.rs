use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::thread;

use tokio::sync::oneshot;
use tracing::warn;

use crate::connection::{BackendOutput, StatementId, StatementInfo};
use crate::error::SqlParamsError;
use crate::types::WireValue;

use super::channel::Command;
use super::dispatcher::run_sqlite_worker;

static NEXT_WORKER_ID: AtomicU64 = AtomicU64::new(1);

pub(super) struct SqliteWorker {
    sender: Sender<Command>,
    worker_id: u64,
}

impl SqliteWorker {
    pub(super) fn spawn(conn: rusqlite::Connection) -> Result<Self, SqlParamsError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let worker_id = NEXT_WORKER_ID.fetch_add(1, Ordering::Relaxed);
        thread::Builder::new()
            .name(format!("sqlite-worker-{worker_id}"))
            .spawn(move || run_sqlite_worker(conn, &receiver))
            .map_err(|err| {
                SqlParamsError::TransportError(format!(
                    "failed to spawn SQLite worker thread: {err}"
                ))
            })?;

        Ok(Self { sender, worker_id })
    }

    pub(super) fn worker_id(&self) -> u64 {
        self.worker_id
    }

    pub(super) fn send_command(&self, command: Command) -> Result<(), SqlParamsError> {
        self.sender
            .send(command)
            .map_err(|_| transport_error("SQLite worker closed"))
    }

    pub(super) async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, SqlParamsError>>) -> Command,
        drop_message: &'static str,
    ) -> Result<T, SqlParamsError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(build(tx))?;
        rx.await.map_err(|_| transport_error(drop_message))?
    }

    pub(super) async fn execute_batch(&self, query: String) -> Result<(), SqlParamsError> {
        self.request(
            |respond_to| Command::ExecuteBatch { query, respond_to },
            "SQLite worker dropped while executing batch",
        )
        .await
    }

    pub(super) async fn execute(
        &self,
        query: String,
        params: Vec<WireValue>,
    ) -> Result<BackendOutput, SqlParamsError> {
        self.request(
            |respond_to| Command::Execute {
                query,
                params,
                respond_to,
            },
            "SQLite worker dropped while executing statement",
        )
        .await
    }

    pub(super) async fn prepare(&self, query: String) -> Result<StatementInfo, SqlParamsError> {
        self.request(
            |respond_to| Command::Prepare { query, respond_to },
            "SQLite worker dropped while preparing statement",
        )
        .await
    }

    pub(super) async fn execute_prepared(
        &self,
        id: StatementId,
        params: Vec<WireValue>,
    ) -> Result<BackendOutput, SqlParamsError> {
        self.request(
            |respond_to| Command::ExecutePrepared {
                id,
                params,
                respond_to,
            },
            "SQLite worker dropped while executing prepared statement",
        )
        .await
    }

    pub(super) async fn release(&self, id: StatementId) -> Result<(), SqlParamsError> {
        self.request(
            |respond_to| Command::Release {
                id,
                respond_to: Some(respond_to),
            },
            "SQLite worker dropped while releasing statement",
        )
        .await
    }

    pub(super) fn release_detached(&self, id: StatementId) {
        if self
            .send_command(Command::Release {
                id,
                respond_to: None,
            })
            .is_err()
        {
            warn!(
                worker = self.worker_id,
                statement = id.0,
                "SQLite worker closed before statement release"
            );
        }
    }

    pub(super) fn shutdown(&self) {
        let _ = self.sender.send(Command::Shutdown);
    }
}

impl Drop for SqliteWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn transport_error(message: &str) -> SqlParamsError {
    SqlParamsError::TransportError(message.to_string())
}
