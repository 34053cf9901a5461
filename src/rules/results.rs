//! # Audit Results Structures
//!
//! This module defines the data structures for representing the results of
//! a benchmark run.
//!
//! ## Overview
//!
//! - [`Summary`] - Pass/fail/warn/info counters
//! - [`CheckResult`] - One evaluated check, ready for reporting
//! - [`GroupResult`] - Checks of one catalog group that were run
//! - [`ControlsReport`] - Results for one controls file
//! - [`AuditResults`] - All controls files of a run, with overall totals
//!
//! ## Examples
//!
//! ```rust
//! use benchlens::rules::results::{CheckResult, ControlsReport, GroupResult};
//! use benchlens::rules::{Check, ProbeOutputs, State};
//!
//! let check = Check::new("1.1", "Ensure something");
//! let outcome = check.evaluate(&ProbeOutputs::default());
//!
//! let mut group = GroupResult::new("1", "Control plane");
//! group.add(CheckResult::new(&check, outcome));
//!
//! let mut report = ControlsReport::new("1", "1.8", "Master Node", "master");
//! report.add_group(group);
//! assert_eq!(report.summary.count(State::Warn), 1);
//! ```

use serde::{Deserialize, Serialize, Serializer};

use super::check::{Check, CheckOutcome, CheckType, State};
use super::test_item::ProbeSource;
use crate::utils::timing::RunTiming;

/// Number of checks per final state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(rename = "total_pass")]
    pub pass: usize,
    #[serde(rename = "total_fail")]
    pub fail: usize,
    #[serde(rename = "total_warn")]
    pub warn: usize,
    #[serde(rename = "total_info")]
    pub info: usize,
}

impl Summary {
    pub fn record(&mut self, state: State) {
        match state {
            State::Pass => self.pass += 1,
            State::Fail => self.fail += 1,
            State::Warn => self.warn += 1,
            State::Info => self.info += 1,
        }
    }

    pub fn merge(&mut self, other: &Summary) {
        self.pass += other.pass;
        self.fail += other.fail;
        self.warn += other.warn;
        self.info += other.info;
    }

    pub fn count(&self, state: State) -> usize {
        match state {
            State::Pass => self.pass,
            State::Fail => self.fail,
            State::Warn => self.warn,
            State::Info => self.info,
        }
    }

    pub fn total(&self) -> usize {
        self.pass + self.fail + self.warn + self.info
    }
}

/// A check together with its outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    #[serde(rename = "test_number")]
    pub id: String,
    #[serde(rename = "test_desc")]
    pub text: String,
    pub audit: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub audit_config: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub audit_env: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub check_type: Option<CheckType>,
    pub remediation: String,
    pub scored: bool,
    pub status: State,
    pub actual_value: String,
    pub expected_result: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources_used: Vec<ProbeSource>,
}

impl CheckResult {
    pub fn new(check: &Check, outcome: CheckOutcome) -> Self {
        Self {
            id: check.id.clone(),
            text: check.text.clone(),
            audit: check.audit.clone(),
            audit_config: check.audit_config.clone(),
            audit_env: check.audit_env.clone(),
            check_type: check.check_type,
            remediation: check.remediation.clone(),
            scored: check.scored,
            status: outcome.state,
            actual_value: outcome.actual_value,
            expected_result: outcome.expected_result,
            reason: outcome.reason,
            sources_used: outcome.sources_used,
        }
    }

    pub fn is_manual(&self) -> bool {
        self.check_type == Some(CheckType::Manual)
    }
}

/// Results of one catalog group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupResult {
    #[serde(rename = "section")]
    pub id: String,
    #[serde(rename = "desc")]
    pub text: String,
    #[serde(flatten, serialize_with = "group_counts")]
    pub summary: Summary,
    #[serde(rename = "results")]
    pub checks: Vec<CheckResult>,
}

/// Per-group counters are written without the `total_` prefix
fn group_counts<S: Serializer>(summary: &Summary, serializer: S) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct GroupCounts {
        pass: usize,
        fail: usize,
        warn: usize,
        info: usize,
    }

    GroupCounts {
        pass: summary.pass,
        fail: summary.fail,
        warn: summary.warn,
        info: summary.info,
    }
    .serialize(serializer)
}

impl GroupResult {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            summary: Summary::default(),
            checks: Vec::new(),
        }
    }

    pub fn add(&mut self, result: CheckResult) {
        self.summary.record(result.status);
        self.checks.push(result);
    }
}

/// Results of one controls file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlsReport {
    pub id: String,
    pub version: String,
    pub text: String,
    pub node_type: String,
    #[serde(rename = "tests")]
    pub groups: Vec<GroupResult>,
    #[serde(flatten)]
    pub summary: Summary,
}

impl ControlsReport {
    pub fn new(
        id: impl Into<String>,
        version: impl Into<String>,
        text: impl Into<String>,
        node_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            text: text.into(),
            node_type: node_type.into(),
            groups: Vec::new(),
            summary: Summary::default(),
        }
    }

    /// Add a group's results; groups without any run check are dropped
    pub fn add_group(&mut self, group: GroupResult) {
        if group.checks.is_empty() {
            return;
        }
        self.summary.merge(&group.summary);
        self.groups.push(group);
    }

    pub fn checks(&self) -> impl Iterator<Item = &CheckResult> {
        self.groups.iter().flat_map(|g| g.checks.iter())
    }
}

/// Results of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditResults {
    pub controls: Vec<ControlsReport>,
    pub totals: Summary,
    #[serde(skip)]
    pub timing: RunTiming,
}

impl AuditResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_controls(&mut self, report: ControlsReport) {
        self.totals.merge(&report.summary);
        self.controls.push(report);
    }

    /// Order controls by numeric id (`1` < `2` < `10`); non-numeric ids sort last
    pub fn sort_controls(&mut self) {
        self.controls.sort_by(|a, b| {
            let key = |id: &str| id.trim().parse::<f64>().unwrap_or(f64::INFINITY);
            key(&a.id).total_cmp(&key(&b.id)).then_with(|| a.id.cmp(&b.id))
        });
    }

    pub fn checks(&self) -> impl Iterator<Item = &CheckResult> {
        self.controls.iter().flat_map(|c| c.checks())
    }

    pub fn has_failures(&self) -> bool {
        self.totals.fail > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.totals.warn > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::check::ProbeOutputs;

    fn result(id: &str, state: State) -> CheckResult {
        let check = Check::new(id, "text");
        CheckResult {
            status: state,
            ..CheckResult::new(&check, check.evaluate(&ProbeOutputs::default()))
        }
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = Summary::default();
        summary.record(State::Pass);
        summary.record(State::Fail);
        summary.record(State::Fail);
        summary.record(State::Info);
        assert_eq!(summary.count(State::Fail), 2);
        assert_eq!(summary.count(State::Warn), 0);
        assert_eq!(summary.total(), 4);
    }

    #[test]
    fn test_group_and_controls_counters() {
        let mut group = GroupResult::new("1.1", "Files");
        group.add(result("1.1.1", State::Pass));
        group.add(result("1.1.2", State::Warn));
        assert_eq!(group.summary.pass, 1);
        assert_eq!(group.summary.warn, 1);

        let mut report = ControlsReport::new("1", "1.8", "Master", "master");
        report.add_group(group);
        report.add_group(GroupResult::new("1.2", "Empty"));
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.summary.pass, 1);
        assert_eq!(report.checks().count(), 2);
    }

    #[test]
    fn test_totals_and_sorting() {
        let mut results = AuditResults::new();
        for id in ["10", "2", "1"] {
            let mut group = GroupResult::new(format!("{id}.1"), "g");
            group.add(result(&format!("{id}.1.1"), State::Fail));
            let mut report = ControlsReport::new(id, "1", "t", "node");
            report.add_group(group);
            results.add_controls(report);
        }
        results.sort_controls();
        let ids: Vec<&str> = results.controls.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "10"]);
        assert_eq!(results.totals.fail, 3);
        assert!(results.has_failures());
        assert!(!results.has_warnings());
    }

    #[test]
    fn test_json_field_names() {
        let mut group = GroupResult::new("1.1", "Files");
        group.add(result("1.1.1", State::Pass));
        let mut report = ControlsReport::new("1", "1.8", "Master", "master");
        report.add_group(group);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["node_type"], "master");
        assert_eq!(json["total_pass"], 1);
        assert_eq!(json["tests"][0]["section"], "1.1");
        assert_eq!(json["tests"][0]["pass"], 1);
        assert_eq!(json["tests"][0]["fail"], 0);
        assert!(json["tests"][0].get("total_pass").is_none());
        assert_eq!(json["tests"][0]["results"][0]["test_number"], "1.1.1");
        assert_eq!(json["tests"][0]["results"][0]["status"], "PASS");
    }
}
