//! Query gate integration tests.
//!
//! Exercises validation and canonicalization through the public API.

use pretty_assertions::assert_eq;
use sqlgate::gate::{
    Policy, QueryGate, SqlDialect, ValidationResult, DISALLOWED_KEYWORDS, EMPTY_QUERY,
    MULTIPLE_STATEMENTS,
};

fn gate() -> QueryGate {
    QueryGate::new(
        SqlDialect::Sqlite,
        Policy::new(["DROP", "DELETE", "INSERT", "UPDATE"]).unwrap(),
    )
}

#[test]
fn test_single_select_is_valid() {
    assert_eq!(
        gate().validate("SELECT customer_id FROM members WHERE join_date > '2021-01-08'"),
        ValidationResult::Valid
    );
}

#[test]
fn test_drop_is_rejected() {
    assert_eq!(
        gate().validate("DROP TABLE members"),
        ValidationResult::Invalid(DISALLOWED_KEYWORDS.to_string())
    );
}

#[test]
fn test_multiple_statements_rejected_before_keywords() {
    assert_eq!(
        gate().validate("SELECT 1; SELECT 2"),
        ValidationResult::Invalid(MULTIPLE_STATEMENTS.to_string())
    );
    assert_eq!(
        gate().validate("SELECT 1; DROP TABLE members"),
        ValidationResult::Invalid(MULTIPLE_STATEMENTS.to_string())
    );
}

#[test]
fn test_keyword_inside_identifier_is_rejected() {
    assert_eq!(
        gate().validate("SELECT last_update FROM members"),
        ValidationResult::Invalid(DISALLOWED_KEYWORDS.to_string())
    );
}

#[test]
fn test_empty_query_is_rejected() {
    assert_eq!(
        gate().validate("  -- nothing here\n"),
        ValidationResult::Invalid(EMPTY_QUERY.to_string())
    );
}

#[test]
fn test_parse_error_reason() {
    let gate = gate();
    assert!(!gate.validate("SELEC * FROM members").is_valid());

    let message = gate.canonicalize("SELEC * FROM members").unwrap_err();
    assert!(message.starts_with("SQL ERROR: "), "got {message}");
    assert!(message.contains("\nQuery: 'S"), "got {message}");
    assert!(!message.contains(" at Line: "), "got {message}");
}

#[test]
fn test_allow_all_policy_admits_writes() {
    let gate = QueryGate::new(SqlDialect::Sqlite, Policy::allow_all());
    assert!(gate.validate("DELETE FROM members").is_valid());
    assert!(!gate.validate("DELETE FROM members; SELECT 1").is_valid());
}

#[test]
fn test_canonicalize_is_idempotent() {
    let gate = gate();
    let once = gate
        .canonicalize("select   customer_id ,join_date from members where customer_id='A'")
        .unwrap();
    let twice = gate.canonicalize(&once).unwrap();
    assert_eq!(once, twice);
    assert_eq!(
        once,
        "SELECT customer_id, join_date FROM members WHERE customer_id = 'A'"
    );
}

#[test]
fn test_check_and_canonicalize() {
    let gate = gate();
    assert_eq!(
        gate.check_and_canonicalize("select 1"),
        Ok("SELECT 1".to_string())
    );
    assert_eq!(
        gate.check_and_canonicalize("DROP TABLE members"),
        Err(format!("ERROR: {DISALLOWED_KEYWORDS}"))
    );
}

#[test]
fn test_dialects_parse_common_select() {
    for dialect in [
        SqlDialect::Sqlite,
        SqlDialect::DuckDb,
        SqlDialect::Postgres,
        SqlDialect::Generic,
    ] {
        let gate = QueryGate::new(dialect, Policy::default());
        assert!(
            gate.validate("SELECT COUNT(*) FROM sales GROUP BY customer_id")
                .is_valid(),
            "{dialect} should accept a plain aggregate"
        );
    }
}
