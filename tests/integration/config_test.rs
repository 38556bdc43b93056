//! Configuration and database setup integration tests.
//!
//! Loads config files from disk and opens file-backed databases with seed
//! scripts.

use pretty_assertions::assert_eq;
use sqlgate::config::Config;
use sqlgate::db::{self, DatabaseClient, Value};
use sqlgate::gate::{SqlDialect, ValidationResult, DISALLOWED_KEYWORDS};
use sqlgate::query::{ExecutionResult, QueryExecutor};
use std::path::PathBuf;

#[test]
fn test_load_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[sql]
dialect = "duckdb"
disallowed_keywords = ["drop", "delete"]
row_limit = 50

[database]
path = "danny.db"
seed_files = ["sql/week1.sql"]

[tables.members]
description = "Customers enrolled in the loyalty programme"
"#,
    )
    .unwrap();

    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(config.sql.dialect, SqlDialect::DuckDb);
    assert_eq!(config.sql.row_limit, 50);
    assert_eq!(config.database.path, Some(PathBuf::from("danny.db")));
    assert_eq!(
        config.table_description("members"),
        Some("Customers enrolled in the loyalty programme")
    );

    let gate = config.gate().unwrap();
    assert_eq!(gate.policy().disallowed_keywords(), &["DROP", "DELETE"]);
    assert_eq!(
        gate.validate("DROP TABLE members"),
        ValidationResult::Invalid(DISALLOWED_KEYWORDS.to_string())
    );
    assert!(gate.validate("UPDATE members SET join_date = NULL").is_valid());
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from_file(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.sql.dialect, SqlDialect::Sqlite);
    assert_eq!(config.sql.row_limit, 1000);
    assert!(config.database.path.is_none());
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[sql]\nrow_limit = 0\n").unwrap();
    assert!(Config::load_from_file(&path).is_err());

    std::fs::write(&path, "[sql]\ndisallowed_keywords = [\"DROP\", \" \"]\n").unwrap();
    assert!(Config::load_from_file(&path).is_err());
}

#[tokio::test]
async fn test_connect_runs_seed_files() {
    let dir = tempfile::tempdir().unwrap();
    let seed = dir.path().join("members.sql");
    std::fs::write(&seed, super::MEMBERS_SQL).unwrap();

    let mut config = Config::default();
    config.database.seed_files.push(seed);

    let client = db::connect(&config.database, config.sql.row_limit)
        .await
        .unwrap();
    let gate = config.gate().unwrap();
    let executor = QueryExecutor::new(&gate, client.as_ref());

    let result = executor
        .execute("SELECT COUNT(*) FROM members")
        .await
        .unwrap();
    assert_eq!(result, ExecutionResult::Scalar(Value::Int(4)));
    assert_eq!(client.table_names().await.unwrap(), vec!["members"]);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_file_database_persists_until_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let seed = dir.path().join("members.sql");
    std::fs::write(&seed, super::MEMBERS_SQL).unwrap();

    let mut config = Config::default();
    config.database.path = Some(dir.path().join("danny.db"));
    config.database.seed_files.push(seed);

    let client = db::connect(&config.database, 1000).await.unwrap();
    client.close().await.unwrap();

    // Reopening without seeds keeps the data.
    config.database.seed_files.clear();
    let client = db::connect(&config.database, 1000).await.unwrap();
    assert_eq!(client.table_names().await.unwrap(), vec!["members"]);
    client.close().await.unwrap();

    config.database.fresh = true;
    let client = db::connect(&config.database, 1000).await.unwrap();
    assert!(client.table_names().await.unwrap().is_empty());
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_missing_seed_file_is_io_error() {
    let mut config = Config::default();
    config
        .database
        .seed_files
        .push(PathBuf::from("does/not/exist.sql"));

    let err = match db::connect(&config.database, 1000).await {
        Ok(_) => panic!("connect should fail"),
        Err(e) => e,
    };
    assert_eq!(err.category(), "I/O Error");
}
