//! Query execution integration tests.
//!
//! Runs queries through the gate and the SQLite engine together.

use super::members_client;
use pretty_assertions::assert_eq;
use sqlgate::config::DatabaseConfig;
use sqlgate::db::{DatabaseClient, SqliteClient, Value};
use sqlgate::error::GateError;
use sqlgate::gate::{Policy, QueryGate, SqlDialect, DISALLOWED_KEYWORDS, MULTIPLE_STATEMENTS};
use sqlgate::query::{ExecutionResult, QueryExecutor, QueryOutcome};

fn strict_gate() -> QueryGate {
    QueryGate::new(
        SqlDialect::Sqlite,
        Policy::new(["DROP", "DELETE", "INSERT", "UPDATE"]).unwrap(),
    )
}

#[tokio::test]
async fn test_count_is_scalar() {
    let client = members_client(1000).await;
    let gate = strict_gate();
    let executor = QueryExecutor::new(&gate, &client);

    let result = executor
        .execute("SELECT COUNT(*) FROM members")
        .await
        .unwrap();
    assert_eq!(result, ExecutionResult::Scalar(Value::Int(4)));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_zero_rows_is_table_with_columns() {
    let client = members_client(1000).await;
    let gate = strict_gate();
    let executor = QueryExecutor::new(&gate, &client);

    let result = executor
        .execute("SELECT * FROM members WHERE 1=0")
        .await
        .unwrap();
    assert_eq!(
        result,
        ExecutionResult::Table {
            columns: vec!["customer_id".to_string(), "join_date".to_string()],
            rows: vec![],
        }
    );

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_multi_row_select_is_table() {
    let client = members_client(1000).await;
    let gate = strict_gate();
    let executor = QueryExecutor::new(&gate, &client);

    let result = executor
        .execute("SELECT customer_id, join_date FROM members ORDER BY customer_id")
        .await
        .unwrap();
    let ExecutionResult::Table { columns, rows } = result else {
        panic!("expected a table");
    };
    assert_eq!(columns, vec!["customer_id", "join_date"]);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], vec![Value::from("A"), Value::from("2021-01-07")]);
    assert_eq!(rows[2], vec![Value::from("C"), Value::Null]);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_single_row_many_columns_is_table() {
    let client = members_client(1000).await;
    let gate = strict_gate();
    let executor = QueryExecutor::new(&gate, &client);

    let result = executor
        .execute("SELECT customer_id, join_date FROM members WHERE customer_id = 'B'")
        .await
        .unwrap();
    assert_eq!(result.row_count(), 1);
    assert!(matches!(result, ExecutionResult::Table { .. }));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_rejected_query_leaves_data_untouched() {
    let client = members_client(1000).await;
    let gate = strict_gate();
    let executor = QueryExecutor::new(&gate, &client);

    let outcome = executor.submit("DROP TABLE members").await;
    assert_eq!(
        outcome,
        QueryOutcome::Rejected(GateError::policy(DISALLOWED_KEYWORDS))
    );

    let outcome = executor
        .submit("SELECT 1; DELETE FROM members")
        .await;
    assert_eq!(
        outcome,
        QueryOutcome::Rejected(GateError::policy(MULTIPLE_STATEMENTS))
    );

    let count = executor
        .execute("SELECT COUNT(*) FROM members")
        .await
        .unwrap();
    assert_eq!(count, ExecutionResult::Scalar(Value::Int(4)));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_engine_error_is_reported_verbatim() {
    let client = members_client(1000).await;
    let gate = strict_gate();
    let executor = QueryExecutor::new(&gate, &client);

    let outcome = executor.submit("SELECT * FROM orders").await;
    let QueryOutcome::Failed(GateError::Execution(message)) = outcome else {
        panic!("expected an execution failure");
    };
    assert!(message.contains("no such table: orders"), "got {message}");

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_row_limit_truncates_with_warning() {
    let client = members_client(2).await;
    let gate = strict_gate();
    let executor = QueryExecutor::new(&gate, &client);

    let QueryOutcome::Completed(report) = executor
        .submit("SELECT customer_id FROM members ORDER BY customer_id")
        .await
    else {
        panic!("query should complete");
    };
    assert_eq!(report.result.row_count(), 2);
    assert_eq!(
        report.warning.as_deref(),
        Some("Result truncated: showing 2 of 4 rows")
    );

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_truncated_single_column_is_not_scalar() {
    let client = members_client(1).await;
    let gate = strict_gate();
    let executor = QueryExecutor::new(&gate, &client);

    let result = executor
        .execute("SELECT customer_id FROM members")
        .await
        .unwrap();
    assert_eq!(
        result,
        ExecutionResult::Table {
            columns: vec!["customer_id".to_string()],
            rows: vec![vec![Value::from("A")]],
        }
    );

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_permissive_policy_runs_writes() {
    let client = members_client(1000).await;
    let gate = QueryGate::new(SqlDialect::Sqlite, Policy::allow_all());
    let executor = QueryExecutor::new(&gate, &client);

    let result = executor
        .execute("DELETE FROM members WHERE join_date IS NULL")
        .await
        .unwrap();
    assert_eq!(result, ExecutionResult::Empty);

    let count = executor
        .execute("SELECT COUNT(*) FROM members")
        .await
        .unwrap();
    assert_eq!(count, ExecutionResult::Scalar(Value::Int(3)));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_timed_out_query_leaves_session_usable() {
    let config = DatabaseConfig {
        query_timeout_secs: Some(1),
        ..Default::default()
    };
    let client = SqliteClient::open(&config, 1000).await.unwrap();
    client.execute_script(super::MEMBERS_SQL).await.unwrap();
    let gate = strict_gate();
    let executor = QueryExecutor::new(&gate, &client);

    let outcome = executor
        .submit(
            "WITH RECURSIVE c(x) AS \
             (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 400000000) \
             SELECT COUNT(*) FROM c",
        )
        .await;
    assert_eq!(
        outcome,
        QueryOutcome::Failed(GateError::execution("Query timed out after 1 seconds"))
    );

    let result = executor.execute("SELECT 1").await.unwrap();
    assert_eq!(result, ExecutionResult::Scalar(Value::Int(1)));

    let count = executor
        .execute("SELECT COUNT(*) FROM members")
        .await
        .unwrap();
    assert_eq!(count, ExecutionResult::Scalar(Value::Int(4)));

    client.close().await.unwrap();
}
