//! Terminal output formatting with colors

use colored::{ColoredString, Colorize};

use super::{ReportOptions, ReportRenderer};
use crate::error::BenchLensError;
use crate::rules::check::State;
use crate::rules::results::{AuditResults, ControlsReport, Summary};

pub struct TerminalOutput {
    options: ReportOptions,
}

impl TerminalOutput {
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    fn tag(state: State) -> ColoredString {
        let tag = format!("[{}]", state);
        match state {
            State::Pass => tag.green(),
            State::Fail => tag.red(),
            State::Warn => tag.yellow(),
            State::Info => tag.blue(),
        }
    }

    fn line(state: State, text: &str) -> String {
        format!("{} {}\n", Self::tag(state), text)
    }

    fn format_checks(&self, report: &ControlsReport) -> String {
        let mut output = Self::line(State::Info, &format!("{} {}", report.id, report.text));

        for group in &report.groups {
            output.push_str(&Self::line(State::Info, &format!("{} {}", group.id, group.text)));
            for check in &group.checks {
                output.push_str(&Self::line(check.status, &format!("{} {}", check.id, check.text)));

                if self.options.include_test_output
                    && check.status == State::Fail
                    && !check.actual_value.is_empty()
                {
                    for row in check.actual_value.split('\n') {
                        output.push_str(&format!("\t {}\n", row));
                    }
                }
            }
        }

        output.push('\n');
        output
    }

    fn format_remediations(&self, report: &ControlsReport) -> String {
        if report.summary.fail == 0 && report.summary.warn == 0 {
            return String::new();
        }

        let mut output = format!(
            "{}\n",
            format!("== Remediations {} ==", report.node_type).yellow()
        );

        for check in report.checks() {
            match check.status {
                State::Fail => {
                    output.push_str(&format!("{} {}\n", check.id, check.remediation));
                }
                State::Warn if !check.reason.is_empty() && !check.is_manual() => {
                    output.push_str(&format!(
                        "{} audit test did not run: {}\n",
                        check.id, check.reason
                    ));
                }
                State::Warn => {
                    output.push_str(&format!("{} {}\n", check.id, check.remediation));
                }
                _ => {}
            }
        }

        output.push('\n');
        output
    }

    /// Summary block, colored after the most severe state present
    fn format_summary(summary: &Summary, section: &str) -> String {
        let title = format!("== Summary {} ==", section);
        let title = if summary.fail > 0 {
            title.red()
        } else if summary.warn > 0 {
            title.yellow()
        } else {
            title.green()
        };

        format!(
            "{}\n{} checks PASS\n{} checks FAIL\n{} checks WARN\n{} checks INFO\n\n",
            title, summary.pass, summary.fail, summary.warn, summary.info
        )
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new(ReportOptions::default())
    }
}

impl ReportRenderer for TerminalOutput {
    fn render_report(&self, results: &AuditResults) -> Result<String, BenchLensError> {
        let mut output = String::new();

        for report in &results.controls {
            output.push_str(&self.format_checks(report));

            if !self.options.no_remediations {
                output.push_str(&self.format_remediations(report));
            }

            if !self.options.no_summary {
                output.push_str(&Self::format_summary(&report.summary, &report.node_type));
            }
        }

        if !self.options.no_totals {
            output.push_str(&Self::format_summary(&results.totals, "total"));
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::check::{Check, CheckOutcome, CheckType};
    use crate::rules::results::{CheckResult, GroupResult};

    fn result(id: &str, state: State, reason: &str, actual: &str) -> CheckResult {
        let check = Check {
            remediation: format!("fix {id}"),
            ..Check::new(id, format!("check {id}"))
        };
        CheckResult::new(
            &check,
            CheckOutcome {
                state,
                reason: reason.to_string(),
                actual_value: actual.to_string(),
                expected_result: String::new(),
                sources_used: Vec::new(),
            },
        )
    }

    fn results() -> AuditResults {
        let mut group = GroupResult::new("1.1", "Files");
        group.add(result("1.1.1", State::Pass, "", ""));
        group.add(result("1.1.2", State::Fail, "", "permissions=777\nowner=root"));
        group.add(result("1.1.3", State::Warn, "failed to run: \"x\"", ""));
        let mut manual = result("1.1.4", State::Warn, "Test marked as a manual test", "");
        manual.check_type = Some(CheckType::Manual);
        group.add(manual);

        let mut report = ControlsReport::new("1", "1.8", "Control Plane", "master");
        report.add_group(group);
        let mut results = AuditResults::new();
        results.add_controls(report);
        results
    }

    fn render(options: ReportOptions) -> String {
        colored::control::set_override(false);
        TerminalOutput::new(options).render_report(&results()).unwrap()
    }

    #[test]
    fn test_check_lines() {
        let out = render(ReportOptions::default());
        assert!(out.contains("[INFO] 1 Control Plane\n"));
        assert!(out.contains("[INFO] 1.1 Files\n"));
        assert!(out.contains("[PASS] 1.1.1 check 1.1.1\n"));
        assert!(out.contains("[FAIL] 1.1.2 check 1.1.2\n"));
        assert!(!out.contains("\t permissions=777"));
    }

    #[test]
    fn test_include_test_output() {
        let out = render(ReportOptions {
            include_test_output: true,
            ..ReportOptions::default()
        });
        assert!(out.contains("\t permissions=777\n\t owner=root\n"));
    }

    #[test]
    fn test_remediations() {
        let out = render(ReportOptions::default());
        assert!(out.contains("== Remediations master ==\n"));
        assert!(out.contains("1.1.2 fix 1.1.2\n"));
        assert!(out.contains("1.1.3 audit test did not run: failed to run: \"x\"\n"));
        assert!(out.contains("1.1.4 fix 1.1.4\n"));
        assert!(!out.contains("1.1.1 fix"));

        let out = render(ReportOptions {
            no_remediations: true,
            ..ReportOptions::default()
        });
        assert!(!out.contains("== Remediations"));
    }

    #[test]
    fn test_summaries() {
        let out = render(ReportOptions::default());
        assert!(out.contains(
            "== Summary master ==\n1 checks PASS\n1 checks FAIL\n2 checks WARN\n0 checks INFO\n"
        ));
        assert!(out.contains("== Summary total ==\n"));

        let out = render(ReportOptions {
            no_summary: true,
            no_totals: true,
            ..ReportOptions::default()
        });
        assert!(!out.contains("== Summary"));
    }
}
