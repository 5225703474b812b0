use std::collections::HashMap;
use std::sync::mpsc::Receiver;

use rusqlite::{self, Statement};
use tracing::{debug, trace};

use crate::connection::{BackendOutput, StatementId, StatementInfo};
use crate::error::SqlParamsError;
use crate::sqlite::query::{column_names, execution_error, prepare_error, run_statement};
use crate::types::WireValue;

use super::channel::Command;

pub(super) fn run_sqlite_worker(conn: rusqlite::Connection, receiver: &Receiver<Command>) {
    // Statements borrow `conn`, so they live in this frame and are finalized before it closes.
    let mut statements: HashMap<StatementId, Statement<'_>> = HashMap::new();
    // Statement IDs never leave this connection; u64 won't exhaust in practice.
    let mut next_statement_id: u64 = 1;

    while let Ok(command) = receiver.recv() {
        match command {
            Command::Shutdown => break,
            Command::ExecuteBatch { query, respond_to } => {
                let res = conn.execute_batch(&query).map_err(execution_error);
                let _ = respond_to.send(res);
            }
            Command::Execute {
                query,
                params,
                respond_to,
            } => {
                let _ = respond_to.send(execute(&conn, &query, &params));
            }
            Command::Prepare { query, respond_to } => {
                let res = conn.prepare(&query).map_err(prepare_error).map(|stmt| {
                    let id = StatementId(next_statement_id);
                    next_statement_id = next_statement_id.saturating_add(1);
                    let info = StatementInfo {
                        id,
                        parameter_count: stmt.parameter_count(),
                        columns: column_names(&stmt),
                    };
                    statements.insert(id, stmt);
                    trace!(statement = id.0, "statement compiled");
                    info
                });
                let _ = respond_to.send(res);
            }
            Command::ExecutePrepared {
                id,
                params,
                respond_to,
            } => {
                let res = match statements.get_mut(&id) {
                    Some(stmt) => run_statement(stmt, &params).map_err(execution_error),
                    None => Err(SqlParamsError::StatementReleased(id.0)),
                };
                let _ = respond_to.send(res);
            }
            Command::Release { id, respond_to } => {
                let res = statements
                    .remove(&id)
                    .map(drop)
                    .ok_or(SqlParamsError::StatementReleased(id.0));
                if let Some(respond_to) = respond_to {
                    let _ = respond_to.send(res);
                }
            }
        }
    }

    debug!(open_statements = statements.len(), "SQLite worker shutting down");
}

fn execute(
    conn: &rusqlite::Connection,
    query: &str,
    params: &[WireValue],
) -> Result<BackendOutput, SqlParamsError> {
    let mut stmt = conn.prepare(query).map_err(execution_error)?;
    run_statement(&mut stmt, params).map_err(execution_error)
}
