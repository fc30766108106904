//! Scripted REPL sessions.

use db_parley::app::Orchestrator;
use db_parley::repl::Repl;
use db_parley::session::Session;
use tempfile::tempdir;

async fn run_script(repl: &mut Repl, script: &str) -> String {
    let mut out = Vec::new();
    repl.run(script.as_bytes(), &mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_import_ask_history_export_session() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("orders.csv");
    std::fs::write(&csv, "id,amount\n1,4.5\n2,8\n").unwrap();
    let export_dir = dir.path().join("out");
    std::fs::create_dir(&export_dir).unwrap();

    let mut repl = Repl::new(
        Orchestrator::with_mock_llm(dir.path().join("store.sqlite")),
        Session::new(10, Default::default()),
        Some("letmein".to_string()),
    );

    let script = format!(
        "/import \"{csv}\"\n\
         /login letmein\n\
         /import \"{csv}\"\n\
         /tables\n\
         show me the orders\n\
         /export \"{out}\"\n\
         /history\n\
         how many orders?\n\
         /query\n\
         /quit\n",
        csv = csv.display(),
        out = export_dir.display(),
    );

    let text = run_script(&mut repl, &script).await;

    assert!(text.contains("Admin login required"));
    assert!(text.contains("Imported orders (2 rows, 2 columns)"));
    assert!(text.contains("SQL: SELECT * FROM \"orders\" LIMIT 10;"));
    assert!(text.contains("Exported 2 rows to"));
    assert!(text.contains("History view is open"));
    assert!(text.contains("#1 (just now) show me the orders"));
    assert_eq!(repl.session().history.len(), 1);

    let csv_out = std::fs::read_to_string(export_dir.join("query_results.csv")).unwrap();
    assert_eq!(csv_out, "id,amount\n1,4.5\n2,8\n");
}

#[tokio::test]
async fn test_unknown_and_invalid_commands_keep_running() {
    let dir = tempdir().unwrap();
    let mut repl = Repl::new(
        Orchestrator::with_mock_llm(dir.path().join("store.sqlite")),
        Session::new(10, Default::default()),
        None,
    );

    let text = run_script(&mut repl, "/bogus\n/drop\n/temperature 0.4\n/temperature\n/help\n").await;

    assert!(text.contains("Unknown command: /bogus"));
    assert!(text.contains("Usage: /drop <table>"));
    assert!(text.contains("Temperature: 0.4"));
    assert!(text.contains("/visualize <table>"));
    assert_eq!(repl.session().temperature.value(), 0.4);
}

#[tokio::test]
async fn test_schema_without_store_reports_store_error() {
    let dir = tempdir().unwrap();
    let mut repl = Repl::new(
        Orchestrator::with_mock_llm(dir.path().join("nothing.sqlite")),
        Session::new(10, Default::default()),
        None,
    );

    let text = run_script(&mut repl, "/schema\n").await;

    assert!(text.contains("Store error: Store file not found"));
    assert!(!dir.path().join("nothing.sqlite").exists());
}
