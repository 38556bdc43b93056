//! SQL parsing, validation and canonicalization.
//!
//! Uses sqlparser-rs with the configured dialect to count statements and to
//! produce the canonical text that the keyword denylist is matched against.

use sqlparser::ast::Statement;
use sqlparser::parser::{Parser, ParserError};
use tracing::debug;

use crate::error::{GateError, Result};

use super::{
    Policy, SqlDialect, ValidationResult, DISALLOWED_KEYWORDS, EMPTY_QUERY, MULTIPLE_STATEMENTS,
};

/// Stateless gatekeeper between user-submitted SQL and the engine.
#[derive(Debug, Clone, Default)]
pub struct QueryGate {
    dialect: SqlDialect,
    policy: Policy,
}

impl QueryGate {
    /// Creates a gate for the given dialect and policy.
    pub fn new(dialect: SqlDialect, policy: Policy) -> Self {
        Self { dialect, policy }
    }

    /// Returns the dialect queries are parsed with.
    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    /// Returns the keyword policy.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Validates a query and returns the single parsed statement.
    ///
    /// Fails with `GateError::Parse` for malformed SQL and
    /// `GateError::Policy` for empty input, multiple statements, or a
    /// denied keyword.
    pub fn check(&self, sql: &str) -> Result<Statement> {
        let mut statements = self.parse(sql)?;

        match statements.len() {
            0 => return Err(GateError::policy(EMPTY_QUERY)),
            1 => {}
            count => {
                debug!("Rejected query with {} statements", count);
                return Err(GateError::policy(MULTIPLE_STATEMENTS));
            }
        }

        let statement = statements.remove(0);
        let canonical = statement.to_string().to_uppercase();
        if let Some(keyword) = self.policy.first_violation(&canonical) {
            debug!("Rejected query containing disallowed keyword {}", keyword);
            return Err(GateError::policy(DISALLOWED_KEYWORDS));
        }

        Ok(statement)
    }

    /// Validates a query against the dialect grammar and the policy.
    pub fn validate(&self, sql: &str) -> ValidationResult {
        self.check(sql).into()
    }

    /// Round-trips the query through the grammar.
    ///
    /// Returns the canonical text, or a readable parse error that names the
    /// offending position and quotes the input up to it.
    pub fn canonicalize(&self, sql: &str) -> std::result::Result<String, String> {
        let grammar = self.dialect.grammar();
        match Parser::parse_sql(grammar.as_ref(), sql) {
            Ok(statements) => Ok(statements
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")),
            Err(e) => Err(format_parse_error(sql, &parser_message(e))),
        }
    }

    /// Validates first, then canonicalizes.
    ///
    /// Rejections are reported as `ERROR: <reason>`.
    pub fn check_and_canonicalize(&self, sql: &str) -> std::result::Result<String, String> {
        match self.validate(sql) {
            ValidationResult::Valid => self.canonicalize(sql),
            ValidationResult::Invalid(reason) => Err(format!("ERROR: {reason}")),
        }
    }

    fn parse(&self, sql: &str) -> Result<Vec<Statement>> {
        let grammar = self.dialect.grammar();
        Parser::parse_sql(grammar.as_ref(), sql).map_err(|e| {
            let (description, location) = split_location(&parser_message(e));
            GateError::parse(description, location.map(|(_, column)| column))
        })
    }
}

fn parser_message(error: ParserError) -> String {
    match error {
        ParserError::TokenizerError(msg) | ParserError::ParserError(msg) => msg,
        ParserError::RecursionLimitExceeded => "recursion limit exceeded".to_string(),
    }
}

/// Formats a parser message as `SQL ERROR: <description> (line L, column C)`
/// followed by the quoted input prefix.
fn format_parse_error(sql: &str, message: &str) -> String {
    let (description, location) = split_location(message);
    match location {
        Some((line, column)) => format!(
            "SQL ERROR: {description} (line {line}, column {column})\nQuery: '{}'",
            input_prefix(sql, line, column)
        ),
        None => format!("SQL ERROR: {description}\nQuery: '{sql}'"),
    }
}

/// Splits the ` at Line: L, Column: C` suffix sqlparser appends to messages.
fn split_location(message: &str) -> (String, Option<(u64, u64)>) {
    let Some(idx) = message.rfind(" at Line: ") else {
        return (message.to_string(), None);
    };

    let location = &message[idx + " at Line: ".len()..];
    // Older sqlparser releases print "Column 8" without the colon.
    let parsed = location.split_once(", Column").and_then(|(line, column)| {
        let line = line.trim().parse::<u64>().ok()?;
        let column = column.trim_start_matches(':').trim().parse::<u64>().ok()?;
        Some((line, column))
    });

    match parsed {
        Some(position) => (message[..idx].to_string(), Some(position)),
        None => (message.to_string(), None),
    }
}

/// Returns the input up to and including `column` on the 1-based `line`.
fn input_prefix(sql: &str, line: u64, column: u64) -> String {
    let line_index = line.saturating_sub(1) as usize;
    let mut prefix = sql
        .split('\n')
        .take(line_index)
        .map(|l| format!("{l}\n"))
        .collect::<String>();
    if let Some(target) = sql.split('\n').nth(line_index) {
        prefix.extend(target.chars().take(column as usize));
    }
    prefix
}
