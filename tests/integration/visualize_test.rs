//! Visualizer tests against an imported table.

use db_parley::db::{DatabaseClient, SqliteStore};
use db_parley::import::import_file;
use db_parley::visualize::{profile_table, render_plans, ChartKind, ChartPlan};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

/// `units` and `revenue` move together, `discount` is noisy, `id` is unique
/// per row and `region` is text.
const SALES_CSV: &str = "\
id,region,units,revenue,discount
1,north,1,10,5
2,south,2,21,1
3,north,3,30,4
4,east,1,11,2
5,south,2,21,5
6,north,3,30,1
7,east,1,10,3
8,south,2,20,4
9,north,3,30,2
10,east,1,10,3
";

async fn sales_store(dir: &std::path::Path) -> SqliteStore {
    let csv = dir.join("sales.csv");
    std::fs::write(&csv, SALES_CSV).unwrap();
    let store = SqliteStore::open_read_write(dir.join("store.sqlite"))
        .await
        .unwrap();
    import_file(&store, &csv).await.unwrap();
    store
}

#[tokio::test]
async fn test_profile_picks_safe_columns_and_correlated_pairs() {
    let dir = tempdir().unwrap();
    let store = sales_store(dir.path()).await;

    let profile = profile_table(&store, "sales").await.unwrap();

    // id has a distinct value per row; region is not numeric
    assert_eq!(profile.safe_columns, vec!["units", "revenue", "discount"]);
    assert!(profile
        .suggested_pairs
        .contains(&("units".to_string(), "revenue".to_string())));
    assert!(profile
        .suggested_pairs
        .contains(&("revenue".to_string(), "units".to_string())));
    assert_eq!(profile.preview().row_count(), 5);

    store.close().await.unwrap();
}

#[tokio::test]
async fn test_plans_and_renders_charts() {
    let dir = tempdir().unwrap();
    let store = sales_store(dir.path()).await;
    let profile = profile_table(&store, "sales").await.unwrap();

    let plans = profile
        .plan_charts(Some(("units", "revenue")), ChartKind::Bar)
        .unwrap();

    match &plans[0] {
        ChartPlan::Bivariate { x, y, kind, points } => {
            assert_eq!((x.as_str(), y.as_str()), ("units", "revenue"));
            assert_eq!(*kind, ChartKind::Bar);
            assert_eq!(points.len(), 10);
        }
        other => panic!("expected a bivariate plan, got {other:?}"),
    }
    assert_eq!(plans.len(), 2);
    assert_eq!(plans[1].title(), "Distribution of discount");

    let text = render_plans(&plans, 60, 14);
    assert!(text.contains("units vs revenue"));
    assert!(text.contains("Distribution of discount"));

    assert!(profile
        .plan_charts(Some(("region", "units")), ChartKind::Scatter)
        .is_err());

    store.close().await.unwrap();
}

#[tokio::test]
async fn test_unknown_table() {
    let dir = tempdir().unwrap();
    let store = sales_store(dir.path()).await;

    let err = profile_table(&store, "missing").await.unwrap_err();
    assert!(err.to_string().contains("Unknown table: missing"));

    store.close().await.unwrap();
}
