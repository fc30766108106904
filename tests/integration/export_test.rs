//! Request-to-CSV round trip tests.

use db_parley::app::PipelineOutcome;
use db_parley::export::{to_csv_bytes, write_csv, EXPORT_FILE_NAME};
use db_parley::llm::MockLlmClient;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use super::common::{orchestrator_with, orders_store, session};

#[tokio::test]
async fn test_export_matches_result_shape() {
    let dir = tempdir().unwrap();
    let store = orders_store(dir.path()).await;
    let (orchestrator, _) = orchestrator_with(
        MockLlmClient::fixed("SELECT id, amount FROM orders WHERE amount > 6 ORDER BY id"),
        &store,
    );
    let mut session = session();

    let PipelineOutcome::Success { result, .. } =
        orchestrator.ask(&mut session, "big orders").await
    else {
        panic!("query failed");
    };

    let written = write_csv(&result, dir.path()).unwrap();
    assert_eq!(written, dir.path().join(EXPORT_FILE_NAME));

    let mut reader = csv::Reader::from_path(&written).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();

    assert_eq!(headers, result.column_names());
    assert_eq!(rows.len(), result.row_count());
    assert_eq!(&rows[0][1], "19.99");
}

#[tokio::test]
async fn test_exported_bytes_are_the_last_recorded_result() {
    let dir = tempdir().unwrap();
    let store = orders_store(dir.path()).await;
    let (orchestrator, _) =
        orchestrator_with(MockLlmClient::fixed("SELECT COUNT(*) AS n FROM orders"), &store);
    let mut session = session();

    orchestrator.ask(&mut session, "count").await;

    let last = session.last_result.as_ref().unwrap();
    assert_eq!(
        String::from_utf8(to_csv_bytes(last).unwrap()).unwrap(),
        "n\n3\n"
    );
}
