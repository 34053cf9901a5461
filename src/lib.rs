//! benchlens Library
//!
//! This crate audits a host against catalogs of security benchmark checks:
//! it runs each check's probe commands, extracts values from their output,
//! compares them against the expected conditions and reports a
//! PASS/FAIL/WARN/INFO state per check.
//!
//! The evaluation itself lives in [`rules`] and never spawns processes;
//! probe execution goes through [`utils::command::ProbeExecutor`].

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod rules;
pub mod utils;

pub use error::BenchLensError;
