//! Output formatting module for CLI

pub mod json;
mod terminal;

pub use json::JsonOutput;
pub use terminal::TerminalOutput;

use crate::error::BenchLensError;
use crate::rules::results::AuditResults;

/// Trait for rendering report output
pub trait ReportRenderer {
    fn render_report(&self, results: &AuditResults) -> Result<String, BenchLensError>;
}

/// What a report includes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Print the raw probe output of failed checks
    pub include_test_output: bool,
    pub no_remediations: bool,
    pub no_summary: bool,
    pub no_totals: bool,
}
