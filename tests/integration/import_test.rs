//! Importer tests against a real store.

use db_parley::db::{Column, DatabaseClient, SqliteStore, Value};
use db_parley::import::import_file;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

#[tokio::test]
async fn test_import_infers_types_and_cleans_headers() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("customers.csv");
    std::fs::write(
        &csv,
        "id;name;;score;name\n1;Ada;x;9.5;A\n2;Bob;;7;B\n3;;y;;C\n",
    )
    .unwrap();

    let store = SqliteStore::open_read_write(dir.path().join("store.sqlite"))
        .await
        .unwrap();
    let imported = import_file(&store, &csv).await.unwrap();

    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].name, "customers");
    assert_eq!(imported[0].row_count, 3);

    let schema = store.introspect_schema().await.unwrap();
    assert_eq!(
        schema.table("customers").unwrap().columns,
        vec![
            Column::new("id", "INTEGER"),
            Column::new("name", "TEXT"),
            Column::new("column_3", "TEXT"),
            Column::new("score", "REAL"),
            Column::new("name_1", "TEXT"),
        ]
    );

    let result = store
        .execute_query("SELECT name, score FROM customers ORDER BY id")
        .await
        .unwrap();
    assert_eq!(result.rows[1], vec![Value::from("Bob"), Value::Float(7.0)]);
    assert_eq!(result.rows[2], vec![Value::Null, Value::Null]);

    store.close().await.unwrap();
}

#[tokio::test]
async fn test_tsv_and_csv_files_become_separate_tables() {
    let dir = tempdir().unwrap();
    let tsv = dir.path().join("visits.tsv");
    let csv = dir.path().join("pages.csv");
    std::fs::write(&tsv, "page\tviews\nhome\t10\nabout\t3\n").unwrap();
    std::fs::write(&csv, "page,title\nhome,Welcome\n").unwrap();

    let store = SqliteStore::open_read_write(dir.path().join("store.sqlite"))
        .await
        .unwrap();
    import_file(&store, &tsv).await.unwrap();
    import_file(&store, &csv).await.unwrap();

    assert_eq!(store.list_tables().await.unwrap(), vec!["visits", "pages"]);

    let joined = store
        .execute_query(
            "SELECT p.title, v.views FROM pages p JOIN visits v ON v.page = p.page",
        )
        .await
        .unwrap();
    assert_eq!(joined.rows, vec![vec![Value::from("Welcome"), Value::Int(10)]]);

    store.close().await.unwrap();
}

#[tokio::test]
async fn test_reimport_replaces_previous_table() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("stock.csv");
    let store = SqliteStore::open_read_write(dir.path().join("store.sqlite"))
        .await
        .unwrap();

    std::fs::write(&csv, "sku,qty\na,1\nb,2\n").unwrap();
    import_file(&store, &csv).await.unwrap();
    std::fs::write(&csv, "sku,qty,warehouse\nc,5,north\n").unwrap();
    import_file(&store, &csv).await.unwrap();

    let result = store.execute_query("SELECT * FROM stock").await.unwrap();
    assert_eq!(result.column_names(), vec!["sku", "qty", "warehouse"]);
    assert_eq!(result.row_count(), 1);

    store.close().await.unwrap();
}

#[tokio::test]
async fn test_unsupported_extension_leaves_store_untouched() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("notes.json");
    std::fs::write(&file, "{}").unwrap();

    let store = SqliteStore::open_read_write(dir.path().join("store.sqlite"))
        .await
        .unwrap();
    let err = import_file(&store, &file).await.unwrap_err();

    assert_eq!(err.category(), "Import Error");
    assert!(store.list_tables().await.unwrap().is_empty());
    store.close().await.unwrap();
}
