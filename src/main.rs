//! sqlgate - validate ad-hoc SQL before running it on an embedded database.

mod cli;

use cli::{Cli, Command};
use sqlgate::config::Config;
use sqlgate::db::{self, DatabaseClient};
use sqlgate::error::{GateError, Result};
use sqlgate::gate::QueryGate;
use sqlgate::logging;
use sqlgate::output::render_outcome;
use sqlgate::query::{QueryExecutor, QueryOutcome};
use sqlgate::session::{self, SessionLog};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    if cli.is_chat() {
        logging::init_file_logging(cli.log_level());
    } else {
        logging::init_stderr_logging(cli.log_level());
    }

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("{}: {}", e.category(), e.reason());
            ExitCode::FAILURE
        }
    }
}

/// Runs the selected command. Returns `Ok(false)` when a query was refused or failed.
async fn run(cli: Cli) -> Result<bool> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let gate = config.gate()?;

    if let Command::Check { sql } = &cli.command {
        return Ok(check(&gate, sql));
    }

    let db = db::connect(&config.database, config.sql.row_limit).await?;
    let executor = QueryExecutor::new(&gate, db.as_ref());

    let result = match cli.command {
        Command::Query { sql } => Ok(query(&executor, &sql).await),
        Command::Tables { rows } => tables(&executor, db.as_ref(), &config, rows).await,
        Command::Chat {
            export_json,
            export_sql,
        } => chat(&executor, export_json, export_sql).await,
        Command::Check { .. } => Ok(true),
    };

    db.close().await?;
    result
}

fn check(gate: &QueryGate, sql: &str) -> bool {
    match gate.check_and_canonicalize(sql) {
        Ok(canonical) => {
            println!("{canonical}");
            true
        }
        Err(message) => {
            eprintln!("{message}");
            false
        }
    }
}

async fn query(executor: &QueryExecutor<'_>, sql: &str) -> bool {
    let outcome = executor.submit(sql).await;
    print_outcome(&outcome);
    outcome.is_success()
}

async fn tables(
    executor: &QueryExecutor<'_>,
    db: &dyn DatabaseClient,
    config: &Config,
    with_rows: bool,
) -> Result<bool> {
    let names = db.table_names().await?;
    if names.is_empty() {
        println!("No tables found.");
        return Ok(true);
    }

    let mut success = true;
    for name in names {
        let info = db
            .table_info(&name)
            .await?
            .with_description(config.table_description(&name).map(String::from));
        println!("{}", info.format_for_display());

        if with_rows {
            let sql = format!("SELECT * FROM {}", db::quote_identifier(&name));
            let outcome = executor.submit(&sql).await;
            print_outcome(&outcome);
            println!();
            success &= outcome.is_success();
        }
    }
    Ok(success)
}

async fn chat(
    executor: &QueryExecutor<'_>,
    export_json: Option<PathBuf>,
    export_sql: Option<PathBuf>,
) -> Result<bool> {
    println!(
        "sqlgate {} - one query per line, \\history to list queries, \\q to quit",
        env!("CARGO_PKG_VERSION")
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut log = SessionLog::new();

    loop {
        write_prompt(&mut std::io::stdout())?;

        let line = lines
            .next_line()
            .await
            .map_err(|e| GateError::io(format!("Failed to read stdin: {e}")))?;
        let Some(line) = line else {
            println!();
            break;
        };

        match line.trim() {
            "" => continue,
            "\\q" => break,
            "\\history" => {
                let history = log.queries_sql();
                if history.is_empty() {
                    println!("No queries yet.");
                } else {
                    println!("{history}");
                }
            }
            command if command.starts_with('\\') => {
                eprintln!("Unknown command: {command} (try \\history or \\q)");
            }
            sql => {
                let (next, outcome) = session::run_turn(executor, log, sql).await;
                log = next;
                print_outcome(&outcome);
            }
        }
    }

    info!("Chat ended with {} log entries", log.len());
    if let Some(path) = export_json {
        log.write_json(&path)?;
    }
    if let Some(path) = export_sql {
        log.write_queries(&path)?;
    }
    Ok(true)
}

/// Prints the chat prompt without a newline.
fn write_prompt(out: &mut impl Write) -> Result<()> {
    out.write_all(b"sql> ")
        .and_then(|()| out.flush())
        .map_err(|e| GateError::io(format!("Failed to write prompt: {e}")))
}

fn print_outcome(outcome: &QueryOutcome) {
    let text = render_outcome(outcome);
    if outcome.is_success() {
        println!("{text}");
    } else {
        eprintln!("{text}");
    }
}
