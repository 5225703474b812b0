#![cfg(feature = "sqlite")]

use sql_params::prelude::*;
use tempfile::tempdir;

async fn fruit_db() -> Result<Executor, SqlParamsError> {
    let exec = SqliteOptions::new(":memory:")
        .connect(ExecutorOptions::default())
        .await?;
    exec.execute_batch("CREATE TABLE fruit (a TEXT PRIMARY KEY, b INTEGER);")
        .await?;
    Ok(exec)
}

#[tokio::test]
async fn multiple_parameter_sets() -> Result<(), Box<dyn std::error::Error>> {
    let exec = fruit_db().await?;
    let stmt = exec.prepare("insert into fruit values(?, ?)").await?;
    assert_eq!(exec.active_statements(), 1);

    for (a, b) in [("apple", 10), ("apricot", 3), ("banana", -8)] {
        let res = stmt.execute(&[Value::from(a), Value::Int(b)]).await;
        assert_eq!(res.rows_affected(), Some(1), "insert {a} failed: {:?}", res.error());
    }
    stmt.release().await?;
    assert_eq!(exec.active_statements(), 0);

    let rows = exec
        .execute_raw("SELECT a, b FROM fruit", &[])
        .await
        .into_row_set()?;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][0], Value::from("apple"));
    assert_eq!(rows[1][0], Value::from("apricot"));
    assert_eq!(rows[2][0], Value::from("banana"));
    assert_eq!(rows[0][1], Value::Int(10));
    assert_eq!(rows[1][1], Value::Int(3));
    assert_eq!(rows[2][1], Value::Int(-8));
    Ok(())
}

#[tokio::test]
async fn constraint_failure_keeps_statement_usable() -> Result<(), Box<dyn std::error::Error>> {
    let exec = fruit_db().await?;
    let stmt = exec.prepare("INSERT INTO fruit (a, b) VALUES (?, ?)").await?;

    let first = stmt.execute(&[Value::from("apple"), Value::Int(1)]).await;
    assert!(first.success());

    let dupe = stmt.execute(&[Value::from("apple"), Value::Int(2)]).await;
    assert!(matches!(dupe.error(), Some(SqlParamsError::ExecutionError(_))));

    let after = stmt.execute(&[Value::from("pear"), Value::Int(3)]).await;
    assert_eq!(after.rows_affected(), Some(1), "{:?}", after.error());
    stmt.release().await?;

    let rows = exec
        .execute_raw("SELECT b FROM fruit ORDER BY b", &[])
        .await
        .into_row_set()?;
    assert_eq!(rows.column("b"), Some(vec![&Value::Int(1), &Value::Int(3)]));
    Ok(())
}

#[tokio::test]
async fn prepared_select_returns_rows() -> Result<(), Box<dyn std::error::Error>> {
    let exec = fruit_db().await?;
    exec.execute_batch("INSERT INTO fruit VALUES ('fig', 4), ('kiwi', 9);")
        .await?;

    let stmt = exec.prepare("SELECT a FROM fruit WHERE b > ?").await?;
    let rows = stmt.execute(&[Value::Int(5)]).await.into_row_set()?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("a"), Some(&Value::from("kiwi")));

    let rows = stmt.execute(&[Value::Int(0)]).await.into_row_set()?;
    assert_eq!(rows.len(), 2);
    Ok(())
}

#[tokio::test]
async fn prepared_arity_is_checked_locally() -> Result<(), Box<dyn std::error::Error>> {
    let exec = fruit_db().await?;
    let stmt = exec.prepare("INSERT INTO fruit VALUES (?, ?)").await?;
    let res = stmt.execute(&[Value::from("lonely")]).await;
    assert!(matches!(
        res.error(),
        Some(SqlParamsError::ArityMismatch {
            expected: 2,
            actual: 1
        })
    ));
    Ok(())
}

#[tokio::test]
async fn prepare_rejects_bad_sql_and_named_labels() -> Result<(), Box<dyn std::error::Error>> {
    let exec = fruit_db().await?;

    let err = exec.prepare("INSERT INTO nowhere VALUES (?)").await.unwrap_err();
    assert!(matches!(err, SqlParamsError::PrepareError(_)));

    let err = exec
        .prepare("INSERT INTO fruit VALUES (:a, :b)")
        .await
        .unwrap_err();
    assert!(matches!(err, SqlParamsError::PrepareError(_)));

    assert_eq!(exec.active_statements(), 0);
    Ok(())
}

#[tokio::test]
async fn dropped_statement_is_released() -> Result<(), Box<dyn std::error::Error>> {
    let exec = fruit_db().await?;
    let handle = {
        let stmt = exec.prepare("INSERT INTO fruit VALUES (?, ?)").await?;
        assert_eq!(exec.active_statements(), 1);
        stmt.handle()
    };
    assert_eq!(exec.active_statements(), 0);
    assert!(!handle.is_active());

    let res = handle.execute(&[Value::from("x"), Value::Int(1)]).await;
    assert!(matches!(res.error(), Some(SqlParamsError::StatementReleased(_))));

    // The queued release has been processed by the time the next command returns.
    let res = exec.execute_raw("SELECT 1 AS one", &[]).await;
    assert!(res.success(), "{:?}", res.error());
    Ok(())
}

#[tokio::test]
async fn release_on_early_return() -> Result<(), Box<dyn std::error::Error>> {
    async fn insert_until_failure(exec: &Executor) -> Result<(), SqlParamsError> {
        let stmt = exec.prepare("INSERT INTO fruit VALUES (?, ?)").await?;
        stmt.execute(&[Value::from("plum"), Value::Int(1)])
            .await
            .into_result()?;
        stmt.execute(&[Value::from("plum"), Value::Int(2)])
            .await
            .into_result()?;
        stmt.release().await
    }

    let exec = fruit_db().await?;
    let err = insert_until_failure(&exec).await.unwrap_err();
    assert!(matches!(err, SqlParamsError::ExecutionError(_)));
    assert_eq!(exec.active_statements(), 0);
    Ok(())
}

#[tokio::test]
async fn with_prepared_releases_on_every_path() -> Result<(), Box<dyn std::error::Error>> {
    let exec = fruit_db().await?;

    let inserted = exec
        .with_prepared("INSERT INTO fruit VALUES (?, ?)", |stmt| async move {
            let mut total = 0;
            for (a, b) in [("apple", 10), ("apricot", 3)] {
                let res = stmt.execute(&[Value::from(a), Value::Int(b)]).await;
                total += res.rows_affected().unwrap_or(0);
            }
            Ok(total)
        })
        .await?;
    assert_eq!(inserted, 2);
    assert_eq!(exec.active_statements(), 0);

    let mut escaped = None;
    let err = exec
        .with_prepared("INSERT INTO fruit VALUES (?, ?)", |stmt| {
            escaped = Some(stmt.clone());
            async move {
                stmt.execute(&[Value::from("apple"), Value::Int(0)])
                    .await
                    .into_result()
                    .map(|_| ())
            }
        })
        .await
        .unwrap_err();
    assert!(matches!(err, SqlParamsError::ExecutionError(_)));
    assert_eq!(exec.active_statements(), 0);

    let escaped = escaped.expect("handle captured");
    let res = escaped.execute(&[Value::from("late"), Value::Int(1)]).await;
    assert!(matches!(res.error(), Some(SqlParamsError::StatementReleased(_))));
    Ok(())
}

#[tokio::test]
async fn statements_survive_on_a_file_database() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("prepared.db");
    let opts = SqliteOptions::new(path.to_string_lossy());

    let exec = opts.connect(ExecutorOptions::default()).await?;
    exec.execute_batch("CREATE TABLE t (n INTEGER);").await?;
    let stmt = exec.prepare("INSERT INTO t VALUES (?)").await?;
    for n in 0..25 {
        stmt.execute(&[Value::Int(n)]).await.into_result()?;
    }
    stmt.release().await?;
    drop(exec);

    let reopened = opts.connect(ExecutorOptions::default()).await?;
    let rows = reopened
        .execute_raw("SELECT sum(n) AS total FROM t", &[])
        .await
        .into_row_set()?;
    assert_eq!(rows[0].get("total"), Some(&Value::Int(300)));
    Ok(())
}
