//! Query validation gate.
//!
//! Decides whether a submitted SQL string may reach the embedded engine:
//! it must parse under the configured dialect, contain exactly one
//! statement, and its canonical text must not contain any keyword from
//! the configured denylist.

mod parser;

pub use parser::QueryGate;

use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use sqlparser::dialect::{
    Dialect, DuckDbDialect, GenericDialect, PostgreSqlDialect, SQLiteDialect,
};
use std::fmt;
use std::str::FromStr;

/// Reason returned when a query contains more than one statement.
pub const MULTIPLE_STATEMENTS: &str = "only one statement is allowed";

/// Reason returned when the canonical text matches the denylist.
pub const DISALLOWED_KEYWORDS: &str = "disallowed SQL keywords detected";

/// Reason returned when the text contains no statement at all.
pub const EMPTY_QUERY: &str = "query is empty";

/// Keywords rejected when no policy is configured.
pub const DEFAULT_DISALLOWED_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "EXEC", "CALL", "ALTER", "GRANT",
];

/// SQL grammar used for parsing and canonicalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    /// Matches the embedded SQLite engine.
    #[default]
    Sqlite,
    DuckDb,
    Postgres,
    Generic,
}

impl SqlDialect {
    /// Returns the dialect name as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::DuckDb => "duckdb",
            Self::Postgres => "postgres",
            Self::Generic => "generic",
        }
    }

    /// Returns the sqlparser grammar for this dialect.
    pub(crate) fn grammar(&self) -> Box<dyn Dialect> {
        match self {
            Self::Sqlite => Box::new(SQLiteDialect {}),
            Self::DuckDb => Box::new(DuckDbDialect {}),
            Self::Postgres => Box::new(PostgreSqlDialect {}),
            Self::Generic => Box::new(GenericDialect {}),
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "duckdb" => Ok(Self::DuckDb),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "generic" | "ansi" => Ok(Self::Generic),
            _ => Err(format!(
                "Invalid dialect: {s}. Expected: sqlite, duckdb, postgres, or generic"
            )),
        }
    }
}

/// Keyword denylist applied to the canonical text of a statement.
///
/// Keywords are stored upper-cased and matched as plain substrings, so a
/// column named `inserted_at` is rejected when `INSERT` is denied. The
/// over-rejection is intentional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    disallowed_keywords: Vec<String>,
}

impl Policy {
    /// Builds a policy from a list of keywords.
    ///
    /// Entries are trimmed and upper-cased. Blank entries are rejected, since
    /// an empty substring would match every query.
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut disallowed_keywords = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim();
            if keyword.is_empty() {
                return Err(GateError::config(
                    "disallowed_keywords contains a blank entry",
                ));
            }
            let keyword = keyword.to_uppercase();
            if !disallowed_keywords.contains(&keyword) {
                disallowed_keywords.push(keyword);
            }
        }
        Ok(Self {
            disallowed_keywords,
        })
    }

    /// A policy that denies nothing.
    pub fn allow_all() -> Self {
        Self {
            disallowed_keywords: Vec::new(),
        }
    }

    /// The upper-cased keywords, in configuration order.
    pub fn disallowed_keywords(&self) -> &[String] {
        &self.disallowed_keywords
    }

    /// Returns true if nothing is denied.
    pub fn is_empty(&self) -> bool {
        self.disallowed_keywords.is_empty()
    }

    /// Returns the first denied keyword found in already upper-cased text.
    pub fn first_violation(&self, upper: &str) -> Option<&str> {
        self.disallowed_keywords
            .iter()
            .find(|keyword| upper.contains(keyword.as_str()))
            .map(String::as_str)
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            disallowed_keywords: DEFAULT_DISALLOWED_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

/// Outcome of validating one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(String),
}

impl ValidationResult {
    /// Returns true if the query may be executed.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Returns the rejection reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid(reason) => Some(reason),
        }
    }
}

impl<T> From<Result<T>> for ValidationResult {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(_) => Self::Valid,
            Err(e) => Self::Invalid(e.reason().to_string()),
        }
    }
}
