use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sql_params::prelude::*;

/// Records every call that reaches the backend.
#[derive(Clone, Default)]
struct RecordingConnection {
    calls: Arc<Mutex<Vec<String>>>,
    fail_transport: Arc<AtomicBool>,
    stall: Arc<AtomicBool>,
    next_id: Arc<AtomicU64>,
}

impl RecordingConnection {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), SqlParamsError> {
        self.calls.lock().unwrap().push(call);
        if self.fail_transport.load(Ordering::SeqCst) {
            return Err(SqlParamsError::TransportError("socket closed".into()));
        }
        Ok(())
    }

    async fn maybe_stall(&self) {
        if self.stall.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl Connection for RecordingConnection {
    async fn execute_batch(&self, sql: &str) -> Result<(), SqlParamsError> {
        self.record(format!("batch {sql}"))
    }

    async fn execute(
        &self,
        sql: &str,
        values: &[WireValue],
    ) -> Result<BackendOutput, SqlParamsError> {
        self.record(format!("execute {sql} {values:?}"))?;
        self.maybe_stall().await;
        Ok(BackendOutput {
            rows_affected: 1,
            ..BackendOutput::default()
        })
    }

    async fn prepare(&self, sql: &str) -> Result<StatementInfo, SqlParamsError> {
        self.record(format!("prepare {sql}"))?;
        let id = StatementId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        Ok(StatementInfo {
            id,
            parameter_count: sql.matches('?').count(),
            columns: Vec::new(),
        })
    }

    async fn execute_prepared(
        &self,
        id: StatementId,
        values: &[WireValue],
    ) -> Result<BackendOutput, SqlParamsError> {
        self.record(format!("execute_prepared {id} {values:?}"))?;
        Ok(BackendOutput {
            rows_affected: 1,
            ..BackendOutput::default()
        })
    }

    async fn release(&self, id: StatementId) -> Result<(), SqlParamsError> {
        self.record(format!("release {id}"))?;
        self.maybe_stall().await;
        Ok(())
    }

    fn release_detached(&self, id: StatementId) {
        self.calls.lock().unwrap().push(format!("release_detached {id}"));
    }
}

fn recording_executor() -> (Executor, RecordingConnection) {
    let conn = RecordingConnection::default();
    let exec = Executor::new(conn.clone(), ExecutorOptions::default());
    (exec, conn)
}

#[tokio::test]
async fn local_errors_make_no_backend_calls() {
    let (exec, conn) = recording_executor();
    let t = Table::new("t", ["a", "b"]);

    let res = exec
        .execute_raw("INSERT INTO t VALUES (?, ?)", &[Value::Int(1)])
        .await;
    assert!(res.error().is_some_and(SqlParamsError::is_local));

    let insert: Query = Insert::into_table(&t)
        .row([Cell::named("a"), Cell::named("b")])
        .into();
    let res = exec.execute(&insert, &Binding::named([("a", Value::Null)])).await;
    assert!(matches!(res.error(), Some(SqlParamsError::UnboundParameter(_))));

    let empty: Query = Insert::into_table(&t).into();
    let res = exec.execute(&empty, &Binding::empty()).await;
    assert!(matches!(res.error(), Some(SqlParamsError::InvalidQuery(_))));

    let res = exec.execute_raw("SELECT 1", &[Value::Int(1)]).await;
    assert!(matches!(
        res.error(),
        Some(SqlParamsError::ArityMismatch {
            expected: 0,
            actual: 1
        })
    ));

    assert!(conn.calls().is_empty(), "unexpected calls: {:?}", conn.calls());
}

#[tokio::test]
async fn resolved_values_reach_the_backend_in_slot_order() {
    let (exec, conn) = recording_executor();
    let t = Table::new("t", ["a", "b"]);
    let insert: Query = Insert::into_table(&t)
        .row([Cell::named("one"), Cell::from(1)])
        .row([Cell::named("one"), Cell::named("two")])
        .into();
    let res = exec
        .execute(
            &insert,
            &Binding::named([("one", Value::from("qiwi")), ("two", Value::Int(3))]),
        )
        .await;
    assert!(res.success());

    let calls = conn.calls();
    assert_eq!(calls.len(), 1);
    let expected = format!(
        r#"execute INSERT INTO "t" ("a", "b") VALUES (?, ?), (?, ?) {:?}"#,
        vec![
            WireValue::Text(b"qiwi".to_vec()),
            WireValue::Integer(1),
            WireValue::Text(b"qiwi".to_vec()),
            WireValue::Integer(3),
        ]
    );
    assert_eq!(calls[0], expected);
}

#[tokio::test]
async fn statement_is_released_exactly_once() {
    let (exec, conn) = recording_executor();

    let stmt = exec.prepare("UPDATE t SET a = ?").await.unwrap();
    let id = stmt.id();
    stmt.release().await.unwrap();

    let dropped = exec.prepare("UPDATE t SET b = ?").await.unwrap();
    let dropped_id = dropped.id();
    drop(dropped);

    let res = exec.execute_prepared(id, &[Value::Int(1)]).await;
    assert!(matches!(res.error(), Some(SqlParamsError::StatementReleased(n)) if *n == id.0));

    let calls = conn.calls();
    assert_eq!(calls.iter().filter(|c| c.starts_with("release")).count(), 2);
    assert!(calls.contains(&format!("release {id}")));
    assert!(calls.contains(&format!("release_detached {dropped_id}")));
    assert_eq!(exec.active_statements(), 0);
}

#[tokio::test]
async fn transport_failure_makes_every_later_call_fail_fast() {
    let (exec, conn) = recording_executor();
    let stmt = exec.prepare("INSERT INTO t VALUES (?)").await.unwrap();

    conn.fail_transport.store(true, Ordering::SeqCst);
    let res = exec.execute_raw("DELETE FROM t", &[]).await;
    assert!(res.error().is_some_and(SqlParamsError::is_transport));
    assert!(exec.is_broken());
    let before = conn.calls().len();

    conn.fail_transport.store(false, Ordering::SeqCst);
    let res = exec.execute_raw("DELETE FROM t", &[]).await;
    assert!(matches!(res.error(), Some(SqlParamsError::TransportError(_))));
    let res = stmt.execute(&[Value::Int(1)]).await;
    assert!(matches!(res.error(), Some(SqlParamsError::TransportError(_))));
    assert!(exec.execute_batch("SELECT 1").await.is_err());
    assert!(exec.prepare("SELECT ?").await.is_err());

    // Dropping on a broken connection only forgets the statement locally.
    drop(stmt);
    assert_eq!(exec.active_statements(), 0);
    assert_eq!(conn.calls().len(), before);
}

#[tokio::test]
async fn concurrent_calls_are_serialized() {
    let (exec, conn) = recording_executor();
    let mut handles = Vec::new();
    for i in 0..16 {
        let exec = exec.clone();
        handles.push(tokio::spawn(async move {
            exec.execute_raw("INSERT INTO t VALUES (?)", &[Value::Int(i)])
                .await
                .success()
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap());
    }
    assert_eq!(conn.calls().len(), 16);
}

#[tokio::test]
async fn cancelled_release_still_releases_once() {
    let (exec, conn) = recording_executor();
    let stmt = exec.prepare("UPDATE t SET a = ?").await.unwrap();
    let id = stmt.id();

    conn.stall.store(true, Ordering::SeqCst);
    let timed_out = tokio::time::timeout(Duration::from_millis(20), stmt.release()).await;
    assert!(timed_out.is_err());

    let calls = conn.calls();
    assert!(calls.contains(&format!("release {id}")));
    assert!(calls.contains(&format!("release_detached {id}")));
    assert_eq!(exec.active_statements(), 0);
}

#[tokio::test]
async fn release_cancelled_while_queued_is_detached() {
    let (exec, conn) = recording_executor();
    let stmt = exec.prepare("UPDATE t SET a = ?").await.unwrap();
    let id = stmt.id();

    // A stalled statement holds the lane, so the release below never starts.
    conn.stall.store(true, Ordering::SeqCst);
    let busy = exec.clone();
    let _blocker =
        tokio::spawn(async move { busy.execute_raw("DELETE FROM t", &[]).await.success() });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let timed_out = tokio::time::timeout(Duration::from_millis(20), stmt.release()).await;
    assert!(timed_out.is_err());

    let calls = conn.calls();
    assert!(!calls.contains(&format!("release {id}")));
    assert_eq!(
        calls.iter().filter(|c| **c == format!("release_detached {id}")).count(),
        1
    );
    assert_eq!(exec.active_statements(), 0);
}
