//! sqlgate - validate ad-hoc SQL before running it on an embedded database.
//!
//! This library exposes the core modules for use by the binary and the
//! integration tests.

pub mod config;
pub mod db;
pub mod error;
pub mod gate;
pub mod logging;
pub mod output;
pub mod query;
pub mod session;
