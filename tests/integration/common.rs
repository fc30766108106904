//! Shared fixtures.

use std::path::{Path, PathBuf};

use db_parley::app::Orchestrator;
use db_parley::db::{DatabaseClient, SqliteStore};
use db_parley::import::import_file;
use db_parley::llm::MockLlmClient;
use db_parley::session::Session;

pub const ORDERS_CSV: &str = "id,amount\n1,19.99\n2,5\n3,42.5\n";

/// Writes `orders.csv` into `dir`, imports it into a fresh store and
/// returns the store path.
pub async fn orders_store(dir: &Path) -> PathBuf {
    let csv = dir.join("orders.csv");
    std::fs::write(&csv, ORDERS_CSV).unwrap();

    let path = dir.join("store.sqlite");
    let store = SqliteStore::open_read_write(&path).await.unwrap();
    import_file(&store, &csv).await.unwrap();
    store.close().await.unwrap();
    path
}

/// An orchestrator whose model is `llm`; the returned clone shares its call log.
pub fn orchestrator_with(llm: MockLlmClient, store: &Path) -> (Orchestrator, MockLlmClient) {
    let log = llm.clone();
    (Orchestrator::new(Box::new(llm), store), log)
}

pub fn session() -> Session {
    Session::new(100, Default::default())
}
