//! End-to-end query pipeline tests.

use db_parley::app::PipelineOutcome;
use db_parley::db::{DatabaseClient, SqliteStore, Value};
use db_parley::llm::{build_prompt, sanitize_sql, LlmClient, Message, MockLlmClient, Temperature, REFUSAL_MESSAGE};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use super::common::{orchestrator_with, orders_store, session};

#[tokio::test]
async fn test_orders_scenario() {
    let dir = tempdir().unwrap();
    let store = orders_store(dir.path()).await;
    let (orchestrator, _) = orchestrator_with(MockLlmClient::fixed("SELECT * FROM orders"), &store);
    let mut session = session();

    let outcome = orchestrator.ask(&mut session, "show all orders").await;

    let PipelineOutcome::Success { sql, result } = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(sql, "SELECT * FROM orders");
    assert_eq!(result.row_count(), 3);
    assert_eq!(result.column_names(), vec!["id", "amount"]);
    assert_eq!(result.rows[1], vec![Value::Int(2), Value::Float(5.0)]);

    assert_eq!(session.history.len(), 1);
    let record = session.history.latest().unwrap();
    assert_eq!(record.question, "show all orders");
    assert_eq!(record.sql, "SELECT * FROM orders");
    assert_eq!(record.result.row_count(), 3);
}

#[tokio::test]
async fn test_refusal_scenario() {
    let dir = tempdir().unwrap();
    let store = orders_store(dir.path()).await;
    let (orchestrator, _) = orchestrator_with(MockLlmClient::fixed(REFUSAL_MESSAGE), &store);
    let mut session = session();

    let outcome = orchestrator.ask(&mut session, "delete every order").await;

    match outcome {
        PipelineOutcome::Failed { sql, error } => {
            assert_eq!(sql.as_deref(), Some(REFUSAL_MESSAGE));
            assert_eq!(error.category(), "Query Error");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(session.history.len(), 0);
}

#[tokio::test]
async fn test_invalid_sql_leaves_history_unchanged() {
    let dir = tempdir().unwrap();
    let store = orders_store(dir.path()).await;
    let (orchestrator, _) = orchestrator_with(
        MockLlmClient::new()
            .with_response("first", "SELECT id FROM orders")
            .with_response("second", "SELEC id FROM orders")
            .with_response("third", "SELECT nope FROM orders"),
        &store,
    );
    let mut session = session();

    assert!(orchestrator.ask(&mut session, "first").await.is_success());
    let before = session.history.len();

    // Rejected by the parser before reaching the store
    assert!(!orchestrator.ask(&mut session, "second").await.is_success());
    // Parses, but the engine reports an unknown column
    assert!(!orchestrator.ask(&mut session, "third").await.is_success());

    assert_eq!(session.history.len(), before);
}

#[tokio::test]
async fn test_mutating_sql_never_reaches_store() {
    let dir = tempdir().unwrap();
    let store = orders_store(dir.path()).await;
    let (orchestrator, _) = orchestrator_with(
        MockLlmClient::fixed("```sql\nDROP TABLE orders;\n```"),
        &store,
    );
    let mut session = session();

    let outcome = orchestrator.ask(&mut session, "remove the orders table").await;
    assert_eq!(outcome.sql(), Some("DROP TABLE orders;"));
    assert!(!outcome.is_success());

    let reopened = SqliteStore::open_read_only(&store).await.unwrap();
    assert_eq!(reopened.list_tables().await.unwrap(), vec!["orders"]);
    reopened.close().await.unwrap();
}

#[tokio::test]
async fn test_schema_appears_in_prompt_exactly_once() {
    let dir = tempdir().unwrap();
    let store = orders_store(dir.path()).await;
    let (orchestrator, log) = orchestrator_with(MockLlmClient::new(), &store);
    let mut session = session();

    orchestrator.ask(&mut session, "how many orders?").await;

    let calls = log.calls();
    assert_eq!(calls.len(), 1);
    let prompt = &calls[0].messages[0].content;
    assert_eq!(prompt.matches("Table: orders").count(), 1);
    assert_eq!(prompt.matches("id (INTEGER)").count(), 1);
    assert_eq!(prompt.matches("amount (REAL)").count(), 1);
}

#[tokio::test]
async fn test_echo_stub_is_deterministic_at_zero_temperature() {
    let client = MockLlmClient::echo();
    let messages = vec![Message::user(build_prompt(
        "Table: orders\nColumns: id (INTEGER)",
        "list orders",
    ))];

    let first = client.complete(&messages, Temperature::default()).await.unwrap();
    let second = client.complete(&messages, Temperature::default()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first, messages[0].content);
    assert!(client.calls().iter().all(|c| c.temperature.value() == 0.0));
}

#[tokio::test]
async fn test_session_temperature_reaches_model() {
    let dir = tempdir().unwrap();
    let store = orders_store(dir.path()).await;
    let (orchestrator, log) = orchestrator_with(MockLlmClient::new(), &store);
    let mut session = session();
    session.temperature = Temperature::new(0.8).unwrap();

    orchestrator.ask(&mut session, "show orders").await;

    assert_eq!(log.calls()[0].temperature.value(), 0.8);
}

#[test]
fn test_sanitizer_is_idempotent_across_fence_styles() {
    let clean = "SELECT * FROM orders WHERE amount > 10;";
    let variants = [
        clean.to_string(),
        format!("```\n{clean}\n```"),
        format!("```sql\n{clean}\n```"),
        format!("  ```SQL\n{clean}```  "),
    ];

    for raw in &variants {
        let once = sanitize_sql(raw);
        assert_eq!(once, clean, "input: {raw:?}");
        assert_eq!(sanitize_sql(&once), once);
    }
}

#[tokio::test]
async fn test_missing_store_fails_before_model_call() {
    let dir = tempdir().unwrap();
    let (orchestrator, log) =
        orchestrator_with(MockLlmClient::new(), &dir.path().join("absent.sqlite"));
    let mut session = session();

    let outcome = orchestrator.ask(&mut session, "show orders").await;

    match outcome {
        PipelineOutcome::Failed { sql: None, error } => {
            assert_eq!(error.category(), "Store Error");
        }
        other => panic!("expected store failure, got {other:?}"),
    }
    assert_eq!(log.call_count(), 0);
    assert!(!dir.path().join("absent.sqlite").exists());
}
