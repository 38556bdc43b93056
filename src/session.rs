//! Chat session log.
//!
//! An ordered record of the queries a user submitted and the responses they
//! got back. The log is owned by the caller and threaded through each turn;
//! the gate and executor never hold it.

use crate::db::Row;
use crate::error::{GateError, Result};
use crate::query::{ExecutionResult, QueryExecutor, QueryOutcome};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Shown when a statement produced no result set.
pub const NO_RESULTS: &str = "No results returned.";

/// Response recorded for one submitted query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    /// A single value or an informational message.
    Text(String),
    /// A tabular result.
    Table { columns: Vec<String>, rows: Vec<Row> },
    /// A rejection or engine failure.
    Error { error: String },
}

impl Response {
    /// Converts a query outcome into its logged form.
    pub fn from_outcome(outcome: &QueryOutcome) -> Self {
        match outcome {
            QueryOutcome::Completed(report) => match &report.result {
                ExecutionResult::Scalar(value) => Self::Text(value.to_display_string()),
                ExecutionResult::Table { columns, rows } => Self::Table {
                    columns: columns.clone(),
                    rows: rows.clone(),
                },
                ExecutionResult::Empty => Self::Text(NO_RESULTS.to_string()),
            },
            QueryOutcome::Rejected(e) | QueryOutcome::Failed(e) => Self::Error {
                error: e.reason().to_string(),
            },
        }
    }
}

/// One entry of the log.
///
/// Serializes as `{"User": "<sql>"}` or `{"Engine": <response>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogEntry {
    User(String),
    Engine(Response),
}

/// Ordered chat history for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionLog {
    entries: Vec<LogEntry>,
}

impl SessionLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a submitted query. Blank input is ignored.
    pub fn push_query(&mut self, sql: &str) {
        let sql = sql.trim();
        if !sql.is_empty() {
            self.entries.push(LogEntry::User(sql.to_string()));
        }
    }

    /// Appends an engine response.
    pub fn push_response(&mut self, response: Response) {
        self.entries.push(LogEntry::Engine(response));
    }

    /// Returns all entries, oldest first.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns only the submitted queries, oldest first.
    pub fn queries(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                LogEntry::User(sql) => Some(sql.as_str()),
                LogEntry::Engine(_) => None,
            })
            .collect()
    }

    /// Returns the submitted queries joined by newlines.
    pub fn queries_sql(&self) -> String {
        self.queries().join("\n")
    }

    /// Serializes the whole log as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GateError::internal(format!("Failed to serialize session log: {e}")))
    }

    /// Writes the log as JSON to `path`.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        write_file(path, &self.to_json()?)?;
        info!("Exported {} log entries to {}", self.len(), path.display());
        Ok(())
    }

    /// Writes the submitted queries to `path`, one per line.
    pub fn write_queries(&self, path: &Path) -> Result<()> {
        write_file(path, &self.queries_sql())?;
        info!("Exported {} queries to {}", self.queries().len(), path.display());
        Ok(())
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .map_err(|e| GateError::io(format!("Failed to write {}: {e}", path.display())))
}

/// Runs one chat turn: logs the query, submits it, logs the response.
///
/// Takes the log by value and hands it back with the outcome.
pub async fn run_turn(
    executor: &QueryExecutor<'_>,
    mut log: SessionLog,
    sql: &str,
) -> (SessionLog, QueryOutcome) {
    log.push_query(sql);
    let outcome = executor.submit(sql).await;
    log.push_response(Response::from_outcome(&outcome));
    (log, outcome)
}
