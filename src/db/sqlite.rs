//! SQLite database client implementation.
//!
//! Provides the `SqliteClient` struct that implements the `DatabaseClient`
//! trait for an embedded SQLite database using sqlx.

use crate::config::DatabaseConfig;
use crate::db::{
    ColumnInfo, DatabaseClient, QueryResult, Row, TableColumn, TableIndex, TableInfo, Value,
};
use crate::error::{GateError, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteRow,
};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, TypeInfo, ValueRef};
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How long a statement waits on a locked database file.
const BUSY_TIMEOUT_SECS: u64 = 5;

/// How long opening the connection may take.
const ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Virtual machine steps between deadline checks while a query runs.
const PROGRESS_HANDLER_OPS: i32 = 10_000;

/// Embedded SQLite client.
///
/// Holds a pool of exactly one connection, so queries are serialized and an
/// in-memory database survives for the lifetime of the client.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
    row_limit: usize,
    query_timeout: Option<Duration>,
}

impl SqliteClient {
    /// Opens the database described by `config`.
    ///
    /// Uses an in-memory database when no path is configured. With
    /// `fresh = true` an existing file and its WAL/SHM side files are
    /// removed first.
    pub async fn open(config: &DatabaseConfig, row_limit: usize) -> Result<Self> {
        let options = match &config.path {
            Some(path) => {
                if config.fresh {
                    remove_database_files(path)?;
                }
                info!("Persisting database at {}", path.display());
                SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
            }
            None => {
                info!("Using in-memory database");
                SqliteConnectOptions::from_str("sqlite::memory:")
                    .map_err(|e| GateError::connection(e.to_string()))?
            }
        }
        .busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
            .connect_with(options)
            .await
            .map_err(|e| GateError::connection(format!("Failed to open database: {e}")))?;

        Ok(Self {
            pool,
            row_limit: row_limit.max(1),
            query_timeout: config.query_timeout_secs.map(Duration::from_secs),
        })
    }

    /// Runs one statement on the pooled connection.
    ///
    /// With a query timeout, a progress handler aborts the statement inside
    /// SQLite once the deadline passes, so the connection is free again
    /// when this returns.
    async fn run_statement(&self, sql: &str) -> Result<(Vec<ColumnInfo>, Vec<Row>, usize)> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| GateError::connection(format!("Failed to acquire connection: {e}")))?;

        let deadline = self.query_timeout.map(|limit| Instant::now() + limit);
        if let Some(deadline) = deadline {
            conn.lock_handle()
                .await
                .map_err(|e| GateError::connection(format!("Failed to lock connection: {e}")))?
                .set_progress_handler(PROGRESS_HANDLER_OPS, move || Instant::now() < deadline);
        }

        let fetched = fetch_capped(&mut conn, sql, self.row_limit).await;

        if deadline.is_some() {
            match conn.lock_handle().await {
                Ok(mut handle) => {
                    handle.remove_progress_handler();
                }
                Err(e) => warn!("Could not remove progress handler: {e}"),
            }
        }

        let (columns, rows, total_rows) = fetched.map_err(|e| match (deadline, self.query_timeout) {
            (Some(deadline), Some(limit)) if Instant::now() >= deadline => {
                warn!("Query interrupted after {:?}", limit);
                GateError::execution(format!(
                    "Query timed out after {} seconds",
                    limit.as_secs()
                ))
            }
            _ => GateError::execution(format_query_error(&e)),
        })?;

        // No rows: the statement may still declare columns.
        let columns = match columns {
            Some(columns) => columns,
            None => describe_columns(&mut conn, sql).await,
        };

        Ok((columns, rows, total_rows))
    }

    async fn fetch_columns(&self, table: &str) -> Result<(Vec<TableColumn>, Vec<String>)> {
        let rows: Vec<(String, String, i64, Option<String>, i64)> = sqlx::query_as(
            r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid"#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GateError::execution(format!("Failed to fetch columns for {table}: {e}")))?;

        let mut key_columns: Vec<(i64, String)> = rows
            .iter()
            .filter(|(_, _, _, _, pk)| *pk > 0)
            .map(|(name, _, _, _, pk)| (*pk, name.clone()))
            .collect();
        key_columns.sort();

        let columns = rows
            .into_iter()
            .map(|(name, data_type, not_null, default, _)| TableColumn {
                name,
                data_type,
                is_nullable: not_null == 0,
                default,
            })
            .collect();

        Ok((columns, key_columns.into_iter().map(|(_, name)| name).collect()))
    }

    async fn fetch_indexes(&self, table: &str) -> Result<Vec<TableIndex>> {
        let listed: Vec<(String, i64, String)> = sqlx::query_as(
            r#"SELECT name, "unique", origin FROM pragma_index_list(?1) ORDER BY name"#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GateError::execution(format!("Failed to fetch indexes for {table}: {e}")))?;

        let mut indexes = Vec::with_capacity(listed.len());
        for (name, unique, origin) in listed {
            // Primary keys are reported separately.
            if origin == "pk" {
                continue;
            }
            let columns: Vec<Option<String>> =
                sqlx::query_scalar("SELECT name FROM pragma_index_info(?1) ORDER BY seqno")
                    .bind(&name)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| {
                        GateError::execution(format!("Failed to fetch index {name}: {e}"))
                    })?;

            indexes.push(TableIndex {
                name,
                columns: columns
                    .into_iter()
                    .map(|c| c.unwrap_or_else(|| "<expr>".to_string()))
                    .collect(),
                is_unique: unique != 0,
            });
        }

        Ok(indexes)
    }

    async fn fetch_row_count(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table));
        sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| GateError::execution(format!("Failed to count rows in {table}: {e}")))
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let (columns, rows, total_rows) = self.run_statement(sql).await?;
        let execution_time = start.elapsed();

        let was_truncated = total_rows > rows.len();
        if was_truncated {
            warn!(
                "Query returned {} rows, truncating to {} rows",
                total_rows, self.row_limit
            );
        }

        Ok(QueryResult {
            columns,
            rows,
            execution_time,
            total_rows,
            was_truncated,
        })
    }

    async fn execute_script(&self, sql: &str) -> Result<()> {
        sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .map_err(|e| GateError::execution(format_query_error(&e)))?;
        Ok(())
    }

    async fn table_names(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT name
            FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GateError::execution(format!("Failed to fetch tables: {e}")))
    }

    async fn table_info(&self, table: &str) -> Result<TableInfo> {
        let (columns, primary_key) = self.fetch_columns(table).await?;
        if columns.is_empty() {
            return Err(GateError::execution(format!("no such table: {table}")));
        }

        let indexes = self.fetch_indexes(table).await?;
        let row_count = self.fetch_row_count(table).await?;

        Ok(TableInfo {
            name: table.to_string(),
            columns,
            primary_key,
            indexes,
            row_count,
            description: None,
        })
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Streams the result set, keeping at most `row_limit` rows but counting all.
async fn fetch_capped(
    conn: &mut SqliteConnection,
    sql: &str,
    row_limit: usize,
) -> std::result::Result<(Option<Vec<ColumnInfo>>, Vec<Row>, usize), sqlx::Error> {
    let mut stream = sqlx::query(sql).fetch(conn);
    let mut columns = None;
    let mut rows = Vec::new();
    let mut total_rows = 0usize;

    while let Some(row) = stream.try_next().await? {
        if columns.is_none() {
            columns = Some(column_info(row.columns()));
        }
        if rows.len() < row_limit {
            rows.push(convert_row(&row));
        }
        total_rows += 1;
    }

    Ok((columns, rows, total_rows))
}

/// Fetches column metadata for a statement without running it.
async fn describe_columns(conn: &mut SqliteConnection, sql: &str) -> Vec<ColumnInfo> {
    match conn.describe(sql).await {
        Ok(describe) => column_info(describe.columns()),
        Err(e) => {
            debug!("Could not describe result columns: {e}");
            Vec::new()
        }
    }
}

/// Removes a database file together with its `-wal` and `-shm` companions.
fn remove_database_files(path: &Path) -> Result<()> {
    let mut targets = vec![path.to_path_buf()];
    for suffix in ["-wal", "-shm"] {
        let mut side = path.as_os_str().to_owned();
        side.push(suffix);
        targets.push(side.into());
    }

    for target in targets {
        match std::fs::remove_file(&target) {
            Ok(()) => info!("Removed existing {}", target.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(GateError::io(format!(
                    "Failed to remove {}: {e}",
                    target.display()
                )))
            }
        }
    }
    Ok(())
}

/// Quotes an identifier for interpolation into SQL text.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn column_info(columns: &[sqlx::sqlite::SqliteColumn]) -> Vec<ColumnInfo> {
    columns
        .iter()
        .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
        .collect()
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    (0..row.columns().len())
        .map(|i| convert_value(row, i))
        .collect()
}

/// Converts one value, dispatching on its runtime storage class.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let type_name = match row.try_get_raw(index) {
        Ok(raw) if !raw.is_null() => raw.type_info().name().to_uppercase(),
        _ => return Value::Null,
    };

    // The storage class was just read from the value itself, so the
    // declared-type compatibility check of `try_get` adds nothing.
    match type_name.as_str() {
        "INTEGER" => row
            .try_get_unchecked::<i64, _>(index)
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "REAL" => row
            .try_get_unchecked::<f64, _>(index)
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "BLOB" => row
            .try_get_unchecked::<Vec<u8>, _>(index)
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        _ => row
            .try_get_unchecked::<String, _>(index)
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

/// Returns the engine's own message for database errors.
fn format_query_error(error: &sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    }
}
