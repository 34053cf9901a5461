//! Rules evaluation engine

use rayon::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info, span, Level};

use super::check::{Check, CheckType};
use super::results::{AuditResults, CheckResult, ControlsReport, GroupResult};
use crate::catalog::{Controls, Group};
use crate::error::FilterError;
use crate::utils::command::ProbeExecutor;
use crate::utils::timing::Timer;

/// Selection of checks to run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunFilter {
    groups: Vec<String>,
    checks: Vec<String>,
    only_scored: bool,
    only_unscored: bool,
}

impl RunFilter {
    /// Build a filter; group and check lists are mutually exclusive
    pub fn new(
        groups: Vec<String>,
        checks: Vec<String>,
        only_scored: bool,
        only_unscored: bool,
    ) -> Result<Self, FilterError> {
        if !groups.is_empty() && !checks.is_empty() {
            return Err(FilterError::GroupAndCheck);
        }
        Ok(Self {
            groups,
            checks,
            only_scored,
            only_unscored,
        })
    }

    /// Whether `check` of `group` is selected
    pub fn accepts(&self, group: &Group, check: &Check) -> bool {
        if !self.groups.is_empty() && !self.groups.iter().any(|g| *g == group.id) {
            return false;
        }
        if !self.checks.is_empty() && !self.checks.iter().any(|c| *c == check.id) {
            return false;
        }
        match (self.only_scored, self.only_unscored) {
            (true, false) => check.scored,
            (false, true) => !check.scored,
            _ => true,
        }
    }
}

/// Main rules evaluation engine
pub struct RulesEngine<'a> {
    probe: &'a dyn ProbeExecutor,
    filter: RunFilter,
    skip_ids: HashSet<String>,
}

impl<'a> RulesEngine<'a> {
    /// Create a new engine running probes through `probe`
    pub fn new(probe: &'a dyn ProbeExecutor) -> Self {
        Self {
            probe,
            filter: RunFilter::default(),
            skip_ids: HashSet::new(),
        }
    }

    pub fn set_filter(&mut self, filter: RunFilter) {
        self.filter = filter;
    }

    /// Group or check ids forced to skip
    pub fn set_skip_ids<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.skip_ids = ids
            .into_iter()
            .map(|id| id.as_ref().trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
    }

    /// Run every selected check of every controls file
    pub fn run(&self, catalogs: &[Controls]) -> AuditResults {
        let total = Timer::start();
        let mut results = AuditResults::new();
        for controls in catalogs {
            let timer = Timer::start();
            let report = self.run_controls(controls);
            results
                .timing
                .add(&report.id, report.summary.total(), timer.elapsed());
            results.add_controls(report);
        }
        results.sort_controls();
        results.timing.total = total.elapsed();

        info!(
            "Audit complete in {}: {} pass, {} fail, {} warn, {} info",
            results.timing.total_formatted(),
            results.totals.pass,
            results.totals.fail,
            results.totals.warn,
            results.totals.info,
        );
        results
    }

    /// Run the selected checks of one controls file
    pub fn run_controls(&self, controls: &Controls) -> ControlsReport {
        let span = span!(Level::INFO, "controls", id = %controls.id, node_type = %controls.node_type);
        let _guard = span.enter();

        let mut report = ControlsReport::new(
            &controls.id,
            &controls.version,
            &controls.text,
            &controls.node_type,
        );

        for group in &controls.groups {
            let selected: Vec<Check> = group
                .checks
                .iter()
                .filter(|check| self.filter.accepts(group, check))
                .map(|check| self.prepare(group, check))
                .collect();

            debug!(
                group = %group.id,
                selected = selected.len(),
                total = group.checks.len(),
                "Running group"
            );

            // collect() on an indexed parallel iterator keeps input order
            let outcomes: Vec<CheckResult> = selected
                .par_iter()
                .map(|check| CheckResult::new(check, check.run(self.probe)))
                .collect();

            let mut group_result = GroupResult::new(&group.id, &group.text);
            for outcome in outcomes {
                group_result.add(outcome);
            }
            report.add_group(group_result);
        }

        report
    }

    /// Copy of `check` with run-time skips applied
    fn prepare(&self, group: &Group, check: &Check) -> Check {
        let mut check = check.clone();
        if group.is_skipped() || self.skip_ids.contains(&group.id) || self.skip_ids.contains(&check.id)
        {
            check.check_type = Some(CheckType::Skip);
        }
        check
    }
}
