//! Mock database clients for testing.
//!
//! Provide canned results without a real engine, and record which
//! statements reached them.

use super::{ColumnInfo, DatabaseClient, QueryResult, TableInfo, Value};
use crate::error::{GateError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// A mock database client that returns predefined results.
#[derive(Default)]
pub struct MockDatabaseClient {
    results: HashMap<String, QueryResult>,
    tables: Vec<TableInfo>,
    executed: Mutex<Vec<String>>,
}

impl MockDatabaseClient {
    /// Creates a mock with no canned results.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the result returned for an exact SQL string.
    pub fn with_result(mut self, sql: impl Into<String>, result: QueryResult) -> Self {
        self.results.insert(sql.into(), result);
        self
    }

    /// Registers table metadata.
    pub fn with_table(mut self, table: TableInfo) -> Self {
        self.tables.push(table);
        self
    }

    /// Returns every statement sent to `execute_query`, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn record(&self, sql: &str) {
        if let Ok(mut guard) = self.executed.lock() {
            guard.push(sql.to_string());
        }
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        self.record(sql);

        if let Some(result) = self.results.get(sql) {
            return Ok(result.clone());
        }

        // Unregistered SELECTs echo the SQL back as a one-row table.
        if sql.trim_start().to_uppercase().starts_with("SELECT") {
            let columns = vec![
                ColumnInfo::new("sql", "TEXT"),
                ColumnInfo::new("note", "TEXT"),
            ];
            let rows = vec![vec![Value::from(sql), Value::from("mock")]];
            Ok(QueryResult::with_data(columns, rows).with_execution_time(Duration::from_millis(1)))
        } else {
            Ok(QueryResult::new())
        }
    }

    async fn execute_script(&self, _sql: &str) -> Result<()> {
        Ok(())
    }

    async fn table_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.tables.iter().map(|t| t.name.clone()).collect();
        names.sort();
        Ok(names)
    }

    async fn table_info(&self, table: &str) -> Result<TableInfo> {
        self.tables
            .iter()
            .find(|t| t.name == table)
            .cloned()
            .ok_or_else(|| GateError::execution(format!("no such table: {table}")))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A client whose every query fails with the same engine message.
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(GateError::execution(self.message.clone()))
    }

    async fn execute_script(&self, _sql: &str) -> Result<()> {
        Err(GateError::execution(self.message.clone()))
    }

    async fn table_names(&self) -> Result<Vec<String>> {
        Err(GateError::execution(self.message.clone()))
    }

    async fn table_info(&self, _table: &str) -> Result<TableInfo> {
        Err(GateError::execution(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
