//! JSON output formatting

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ReportOptions, ReportRenderer};
use crate::error::BenchLensError;
use crate::rules::results::{AuditResults, ControlsReport, Summary};

pub struct JsonOutput {
    options: ReportOptions,
    generated_at: DateTime<Utc>,
}

impl JsonOutput {
    pub fn new(options: ReportOptions) -> Self {
        Self {
            options,
            generated_at: Utc::now(),
        }
    }

    /// Fix the report timestamp
    pub fn with_timestamp(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new(ReportOptions::default())
    }
}

#[derive(Serialize)]
struct ReportOutput<'a> {
    version: &'static str,
    generated_at: String,
    controls: &'a [ControlsReport],
    totals: &'a Summary,
}

impl ReportRenderer for JsonOutput {
    fn render_report(&self, results: &AuditResults) -> Result<String, BenchLensError> {
        if self.options.no_totals {
            return Ok(serde_json::to_string_pretty(&results.controls)?);
        }

        let output = ReportOutput {
            version: env!("CARGO_PKG_VERSION"),
            generated_at: self.generated_at.to_rfc3339(),
            controls: &results.controls,
            totals: &results.totals,
        };
        Ok(serde_json::to_string_pretty(&output)?)
    }
}
