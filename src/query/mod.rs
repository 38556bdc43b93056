//! Query execution for sqlgate.
//!
//! Couples the validation gate with the engine client and normalizes result
//! shapes for callers.

pub mod executor;

pub use executor::{ExecutionReport, ExecutionResult, QueryExecutor, QueryOutcome};
