//! Command-line argument parsing for sqlgate.

use clap::{Parser, Subcommand};
use sqlgate::config::Config;
use sqlgate::gate::SqlDialect;
use std::path::PathBuf;

/// Validate ad-hoc SQL before running it on an embedded database.
#[derive(Parser, Debug)]
#[command(name = "sqlgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Database file (in-memory when neither this nor the config sets one)
    #[arg(short = 'd', long, value_name = "PATH", global = true)]
    pub database: Option<PathBuf>,

    /// Delete the database file before opening it
    #[arg(long, global = true)]
    pub fresh: bool,

    /// SQL script to run after opening (repeatable, added after configured seeds)
    #[arg(long = "seed", value_name = "PATH", global = true)]
    pub seeds: Vec<PathBuf>,

    /// Maximum rows kept from one result
    #[arg(short = 'l', long, value_name = "ROWS", global = true)]
    pub limit: Option<usize>,

    /// SQL dialect used for validation (sqlite, duckdb, postgres, generic)
    #[arg(long, value_name = "DIALECT", global = true)]
    pub dialect: Option<SqlDialect>,

    /// Log at debug level
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Validate and run one query
    Query {
        /// The SQL text
        sql: String,
    },

    /// Validate one query and print its canonical form
    Check {
        /// The SQL text
        sql: String,
    },

    /// List tables with their columns and row counts
    Tables {
        /// Also print every table's rows
        #[arg(long)]
        rows: bool,
    },

    /// Read queries from stdin, one per line
    Chat {
        /// Write the session log as JSON on exit
        #[arg(long, value_name = "PATH")]
        export_json: Option<PathBuf>,

        /// Write the submitted queries as a .sql file on exit
        #[arg(long, value_name = "PATH")]
        export_sql: Option<PathBuf>,
    },
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Applies command-line overrides on top of the file configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(path) = &self.database {
            config.database.path = Some(path.clone());
        }
        if self.fresh {
            config.database.fresh = true;
        }
        config.database.seed_files.extend(self.seeds.iter().cloned());
        if let Some(limit) = self.limit {
            config.sql.row_limit = limit;
        }
        if let Some(dialect) = self.dialect {
            config.sql.dialect = dialect;
        }
    }

    /// Returns the default log level.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// Returns true when the command reads an interactive session.
    pub fn is_chat(&self) -> bool {
        matches!(self.command, Command::Chat { .. })
    }
}
