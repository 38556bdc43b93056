//! Embedded database layer for sqlgate.
//!
//! Provides a trait-based interface to the engine so the executor can run
//! against the SQLite backend or an in-memory mock interchangeably.

mod mock;
mod schema;
mod sqlite;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use schema::{TableColumn, TableIndex, TableInfo};
pub use sqlite::{quote_identifier, SqliteClient};
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::DatabaseConfig;
use crate::error::{GateError, Result};
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

/// Opens the embedded database and runs the configured seed scripts.
///
/// The returned handle is meant to live for the whole process.
pub async fn connect(
    config: &DatabaseConfig,
    row_limit: usize,
) -> Result<Box<dyn DatabaseClient>> {
    let client = SqliteClient::open(config, row_limit).await?;
    for seed in &config.seed_files {
        run_sql_file(&client, seed).await?;
    }
    Ok(Box::new(client))
}

/// Reads a SQL script from disk and executes it as a batch.
///
/// Scripts are trusted setup input and bypass the gate.
pub async fn run_sql_file(client: &dyn DatabaseClient, path: &Path) -> Result<()> {
    let script = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| GateError::io(format!("Failed to read {}: {e}", path.display())))?;
    client.execute_script(&script).await?;
    info!("Executed SQL script {}", path.display());
    Ok(())
}

/// Interface to the embedded query engine.
///
/// Implementations own a single connection; callers must not assume more
/// than one query can be in flight at a time.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes one statement and returns its rows and column metadata.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Executes a multi-statement script, discarding any rows.
    async fn execute_script(&self, sql: &str) -> Result<()>;

    /// Lists user tables in name order.
    async fn table_names(&self) -> Result<Vec<String>>;

    /// Introspects one table.
    async fn table_info(&self, table: &str) -> Result<TableInfo>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}
