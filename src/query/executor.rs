//! Query execution behind the validation gate.
//!
//! Runs one submitted query through the state machine
//! `Submitted -> Invalid | Valid -> Executing -> Scalar | Table | Empty | ExecutionError`
//! and normalizes the engine's result set into an `ExecutionResult`.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::db::{DatabaseClient, QueryResult, Row, Value};
use crate::error::{GateError, Result};
use crate::gate::{QueryGate, ValidationResult};

/// Normalized shape of a successful query.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// Exactly one row with exactly one column.
    Scalar(Value),
    /// Any other result set, including zero rows with declared columns.
    Table { columns: Vec<String>, rows: Vec<Row> },
    /// The statement produced no result set.
    Empty,
}

impl ExecutionResult {
    /// Classifies a raw engine result.
    ///
    /// The scalar check uses the row count before truncation, so a capped
    /// result set is never mistaken for a single value.
    pub fn from_query_result(result: QueryResult) -> Self {
        if result.total_rows == 1 && result.columns.len() == 1 {
            if let Some(value) = result.rows.into_iter().next().and_then(|r| r.into_iter().next()) {
                return Self::Scalar(value);
            }
            return Self::Empty;
        }

        if result.total_rows > 0 || !result.columns.is_empty() {
            return Self::Table {
                columns: result.columns.into_iter().map(|c| c.name).collect(),
                rows: result.rows,
            };
        }

        Self::Empty
    }

    /// Returns the number of rows held.
    pub fn row_count(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Table { rows, .. } => rows.len(),
            Self::Empty => 0,
        }
    }
}

/// A completed execution with its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    /// The normalized result.
    pub result: ExecutionResult,
    /// How long the engine took.
    pub execution_time: Duration,
    /// Set when the engine's row cap dropped rows.
    pub warning: Option<String>,
}

/// Terminal state of one submitted query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Rejected by the gate; the engine was never called.
    Rejected(GateError),
    /// Executed successfully.
    Completed(ExecutionReport),
    /// Approved by the gate but failed in the engine.
    Failed(GateError),
}

impl QueryOutcome {
    /// Returns the error message for rejected or failed queries.
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Rejected(e) | Self::Failed(e) => Some(e.reason().to_string()),
            Self::Completed(_) => None,
        }
    }

    /// Returns true if the query ran to completion.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Validates and executes queries against one engine connection.
pub struct QueryExecutor<'a> {
    gate: &'a QueryGate,
    db: &'a dyn DatabaseClient,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new query executor.
    pub fn new(gate: &'a QueryGate, db: &'a dyn DatabaseClient) -> Self {
        Self { gate, db }
    }

    /// Validates a query without executing it.
    pub fn validate(&self, sql: &str) -> ValidationResult {
        self.gate.validate(sql)
    }

    /// Executes an already validated query.
    ///
    /// The text is sent to the engine verbatim.
    pub async fn execute(&self, sql: &str) -> Result<ExecutionResult> {
        let report = self.execute_with_report(sql).await?;
        Ok(report.result)
    }

    /// Validates, then executes, returning every failure as data.
    pub async fn submit(&self, sql: &str) -> QueryOutcome {
        if let Err(e) = self.gate.check(sql) {
            info!("Query rejected: {}", e.reason());
            return QueryOutcome::Rejected(e);
        }

        debug!("Query approved, executing");
        match self.execute_with_report(sql).await {
            Ok(report) => {
                info!(
                    "Query completed in {:?} with {} row(s)",
                    report.execution_time,
                    report.result.row_count()
                );
                QueryOutcome::Completed(report)
            }
            Err(e) => {
                warn!("Query failed: {}", e.reason());
                QueryOutcome::Failed(e)
            }
        }
    }

    async fn execute_with_report(&self, sql: &str) -> Result<ExecutionReport> {
        let raw = self.db.execute_query(sql).await.map_err(|e| match e {
            GateError::Execution(_) => e,
            other => GateError::execution(other.reason()),
        })?;

        let execution_time = raw.execution_time;
        let warning = raw.truncation_warning();
        Ok(ExecutionReport {
            result: ExecutionResult::from_query_result(raw),
            execution_time,
            warning,
        })
    }
}
