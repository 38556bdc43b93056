//! Schema introspection integration tests.
//!
//! Loads the bundled week 1 case study and checks table listings.

use pretty_assertions::assert_eq;
use sqlgate::config::Config;
use sqlgate::db::{self, DatabaseClient};
use std::path::PathBuf;

fn week1_script() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("sql/week1.sql")
}

async fn week1_client() -> Box<dyn DatabaseClient> {
    let mut config = Config::default();
    config.database.seed_files.push(week1_script());
    db::connect(&config.database, config.sql.row_limit)
        .await
        .expect("week 1 script should load")
}

#[tokio::test]
async fn test_week1_tables() {
    let client = week1_client().await;
    assert_eq!(
        client.table_names().await.unwrap(),
        vec!["members", "menu", "sales"]
    );
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_table_info_menu() {
    let client = week1_client().await;

    let info = client
        .table_info("menu")
        .await
        .unwrap()
        .with_description(Some("Dishes and prices".to_string()));
    assert_eq!(info.row_count, 3);
    assert_eq!(info.primary_key, vec!["product_id"]);
    assert_eq!(
        info.format_for_display(),
        "menu: 3 records\n  Dishes and prices\n  - product_id: INTEGER (PK)\n  - product_name: VARCHAR(5)\n  - price: INTEGER\n"
    );

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_table_info_sales_indexes() {
    let client = week1_client().await;

    let info = client.table_info("sales").await.unwrap();
    assert_eq!(info.row_count, 15);
    assert!(info.primary_key.is_empty());
    assert_eq!(info.indexes.len(), 1);
    assert_eq!(info.indexes[0].name, "idx_sales_customer");
    assert_eq!(info.indexes[0].columns, vec!["customer_id"]);
    assert!(!info.indexes[0].is_unique);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_table_info_unknown_table() {
    let client = week1_client().await;
    let err = client.table_info("orders").await.unwrap_err();
    assert_eq!(err.category(), "Execution Error");
    client.close().await.unwrap();
}
