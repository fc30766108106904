//! Read-only guard tests against a real store.

use db_parley::app::{Orchestrator, PipelineOutcome};
use db_parley::db::{DatabaseClient, SqliteStore, Value};
use db_parley::safety::{classify_sql, ensure_read_only, SafetyLevel};
use tempfile::tempdir;

use super::common::{orders_store, session};

#[tokio::test]
async fn test_mutating_statements_rejected_and_store_unchanged() {
    let dir = tempdir().unwrap();
    let store = orders_store(dir.path()).await;
    let orchestrator = Orchestrator::with_mock_llm(&store);
    let mut session = session();

    for sql in [
        "INSERT INTO orders VALUES (4, 1.0)",
        "UPDATE orders SET amount = 0",
        "DELETE FROM orders",
        "DROP TABLE orders",
        "CREATE TABLE x (a INTEGER)",
        "PRAGMA writable_schema = 1",
        "SELECT 1; DELETE FROM orders",
        "WITH d AS (DELETE FROM orders RETURNING *) SELECT * FROM d",
    ] {
        let outcome = orchestrator.run_sql(&mut session, sql).await;
        assert!(!outcome.is_success(), "accepted: {sql}");
    }

    let reopened = SqliteStore::open_read_only(&store).await.unwrap();
    let result = reopened.execute_query("SELECT COUNT(*) FROM orders").await.unwrap();
    assert_eq!(result.rows[0][0].as_f64(), Some(3.0));
    reopened.close().await.unwrap();
    assert!(session.history.is_empty());
}

#[tokio::test]
async fn test_read_only_connection_refuses_writes() {
    let dir = tempdir().unwrap();
    let store = orders_store(dir.path()).await;

    let reopened = SqliteStore::open_read_only(&store).await.unwrap();
    assert!(reopened.execute_query("DELETE FROM orders").await.is_err());
    reopened.close().await.unwrap();
}

#[test]
fn test_classification_levels() {
    assert_eq!(classify_sql("SELECT * FROM orders").level, SafetyLevel::Safe);
    assert_eq!(
        classify_sql("INSERT INTO orders VALUES (1, 2)").level,
        SafetyLevel::Mutating
    );
    assert_eq!(classify_sql("DROP TABLE orders").level, SafetyLevel::Destructive);
    assert!(ensure_read_only("EXPLAIN SELECT 1").is_ok());
    assert!(ensure_read_only("EXPLAIN DELETE FROM orders").is_err());
}

#[tokio::test]
async fn test_sqlite_only_syntax_runs_end_to_end() {
    let dir = tempdir().unwrap();
    let store = orders_store(dir.path()).await;
    let orchestrator = Orchestrator::with_mock_llm(&store);
    let mut session = session();

    let outcome = orchestrator
        .run_sql(
            &mut session,
            "SELECT id FROM orders WHERE CAST(id AS TEXT) GLOB '[12]' ORDER BY id",
        )
        .await;
    match outcome {
        PipelineOutcome::Success { result, .. } => {
            assert_eq!(result.rows, vec![vec![Value::Int(1)], vec![Value::Int(2)]]);
        }
        other => panic!("GLOB query rejected: {other:?}"),
    }

    let outcome = orchestrator
        .run_sql(&mut session, "SELECT id FROM orders WHERE amount IS NOT 5 ORDER BY id")
        .await;
    assert_eq!(outcome.sql(), Some("SELECT id FROM orders WHERE amount IS NOT 5 ORDER BY id"));
    let PipelineOutcome::Success { result, .. } = outcome else {
        panic!("IS NOT query rejected");
    };
    assert_eq!(result.rows, vec![vec![Value::Int(1)], vec![Value::Int(3)]]);
    assert_eq!(session.history.len(), 2);
}
