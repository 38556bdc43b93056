//! Integration tests for sqlgate.

pub mod config_test;
pub mod gate_test;
pub mod query_test;
pub mod schema_test;

use sqlgate::config::DatabaseConfig;
use sqlgate::db::{DatabaseClient, SqliteClient};

/// Loyalty members used across the tests: four customers, one without a join date.
pub const MEMBERS_SQL: &str = r#"
CREATE TABLE members (customer_id VARCHAR(1) PRIMARY KEY, join_date DATE);
INSERT INTO members (customer_id, join_date) VALUES
    ('A', '2021-01-07'),
    ('B', '2021-01-09'),
    ('C', NULL),
    ('D', '2021-02-01');
"#;

/// Opens an in-memory database holding the members table.
pub async fn members_client(row_limit: usize) -> SqliteClient {
    let client = SqliteClient::open(&DatabaseConfig::default(), row_limit)
        .await
        .expect("in-memory database should open");
    client
        .execute_script(MEMBERS_SQL)
        .await
        .expect("members fixture should load");
    client
}
