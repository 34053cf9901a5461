//! Check runner
//!
//! A [`Check`] is an immutable rule definition. Running it produces a fresh
//! [`CheckOutcome`]; the definition itself is never written to, so the same
//! check may be evaluated from several threads.

use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use tracing::{debug, span, Level};

use super::de::scalar_string;
use super::test_item::{ProbeSource, TestItem, TestOutcome};
use super::test_set::TestSet;
use crate::error::{EvaluationError, ProbeError};
use crate::utils::command::ProbeExecutor;

/// Check type tag from the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckType {
    Normal,
    Skip,
    Manual,
}

/// An empty `type` is the same as no type
fn deserialize_check_type<'de, D>(deserializer: D) -> Result<Option<CheckType>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some("normal") => Ok(Some(CheckType::Normal)),
        Some("skip") => Ok(Some(CheckType::Skip)),
        Some("manual") => Ok(Some(CheckType::Manual)),
        Some(other) => Err(de::Error::unknown_variant(other, &["normal", "skip", "manual"])),
    }
}

/// Final state of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum State {
    Pass,
    Fail,
    Warn,
    Info,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Pass => "PASS",
            State::Fail => "FAIL",
            State::Warn => "WARN",
            State::Info => "INFO",
        }
    }

    /// FAIL for scored checks, WARN otherwise
    fn failing(scored: bool) -> Self {
        if scored {
            State::Fail
        } else {
            State::Warn
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One benchmark rule
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Check {
    #[serde(default, deserialize_with = "scalar_string")]
    pub id: String,

    #[serde(default)]
    pub text: String,

    /// Primary probe
    #[serde(default)]
    pub audit: String,

    /// Probe returning configuration file contents
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub audit_config: String,

    /// Probe returning a process environment
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub audit_env: String,

    #[serde(
        default,
        rename = "type",
        deserialize_with = "deserialize_check_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub check_type: Option<CheckType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<TestSet>,

    #[serde(default)]
    pub remediation: String,

    #[serde(default)]
    pub scored: bool,

    /// Evaluate every output line separately
    #[serde(default)]
    pub use_multiple_values: bool,

    /// Do not generate a default env probe
    #[serde(default)]
    pub disable_env_testing: bool,
}

/// Raw probe outputs for one check
///
/// `None` means the probe is not configured for the check.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProbeOutputs {
    pub audit: String,
    pub audit_config: Option<String>,
    pub audit_env: Option<String>,
}

impl ProbeOutputs {
    pub fn primary(audit: impl Into<String>) -> Self {
        Self {
            audit: audit.into(),
            ..Self::default()
        }
    }

    pub fn with_config(mut self, output: impl Into<String>) -> Self {
        self.audit_config = Some(output.into());
        self
    }

    pub fn with_env(mut self, output: impl Into<String>) -> Self {
        self.audit_env = Some(output.into());
        self
    }

    /// Output an item may be evaluated against, if that source applies to it
    fn for_item(&self, item: &TestItem, source: ProbeSource) -> Option<&str> {
        match source {
            ProbeSource::Primary => Some(self.audit.as_str()),
            ProbeSource::Config => self.audit_config.as_deref(),
            ProbeSource::Env if item.env.is_empty() => None,
            ProbeSource::Env => self.audit_env.as_deref(),
        }
    }
}

/// Result of running a check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub state: State,
    pub reason: String,
    pub actual_value: String,
    pub expected_result: String,
    /// Source each test item was resolved against, in item order
    pub sources_used: Vec<ProbeSource>,
}

impl CheckOutcome {
    fn new(state: State, reason: impl Into<String>) -> Self {
        Self {
            state,
            reason: reason.into(),
            actual_value: String::new(),
            expected_result: String::new(),
            sources_used: Vec::new(),
        }
    }
}

impl Check {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn is_manual(&self) -> bool {
        self.check_type == Some(CheckType::Manual)
    }

    /// Whether the check declares an env probe
    pub fn has_env_probe(&self) -> bool {
        !self.audit_env.trim().is_empty()
    }

    /// Whether any test item looks up an environment variable
    pub fn uses_env(&self) -> bool {
        self.tests
            .as_ref()
            .is_some_and(|t| t.test_items.iter().any(|i| !i.env.is_empty()))
    }

    /// Run the check's probes and evaluate the result
    pub fn run(&self, probe: &dyn ProbeExecutor) -> CheckOutcome {
        let span = span!(Level::DEBUG, "check", id = %self.id);
        let _guard = span.enter();

        if let Some(outcome) = self.precheck() {
            debug!(state = %outcome.state, reason = %outcome.reason, "Check not run");
            return outcome;
        }

        let outputs = match self.collect_probes(probe) {
            Ok(outputs) => outputs,
            Err(err) => {
                debug!(error = %err, "Probe failed");
                return CheckOutcome::new(State::failing(self.scored), err.to_string());
            }
        };

        self.evaluate_tests(&outputs)
    }

    /// Evaluate against probe outputs that were already collected
    pub fn evaluate(&self, outputs: &ProbeOutputs) -> CheckOutcome {
        self.precheck()
            .unwrap_or_else(|| self.evaluate_tests(outputs))
    }

    /// States decided by the definition alone, before any probe runs
    fn precheck(&self) -> Option<CheckOutcome> {
        if self.scored && self.check_type.is_none() && self.tests.is_none() {
            return Some(CheckOutcome::new(State::Warn, "There are no tests"));
        }

        match self.check_type {
            Some(CheckType::Skip) => {
                return Some(CheckOutcome::new(State::Info, "Test marked as skip"));
            }
            Some(CheckType::Manual) => {
                return Some(CheckOutcome::new(State::Warn, "Test marked as a manual test"));
            }
            _ => {}
        }

        if self.tests.as_ref().map_or(true, TestSet::is_empty) {
            return Some(CheckOutcome::new(
                State::failing(self.scored),
                "No tests defined",
            ));
        }

        None
    }

    fn collect_probes(&self, probe: &dyn ProbeExecutor) -> Result<ProbeOutputs, ProbeError> {
        let audit = probe.run(&self.audit)?;

        let audit_config = if self.audit_config.trim().is_empty() {
            None
        } else {
            match probe.run(&self.audit_config) {
                Ok(output) => Some(output),
                Err(err) if err.is_not_found() && self.has_env_probe() => {
                    debug!(error = %err, "Config probe found nothing, relying on env probe");
                    Some(err.output().unwrap_or_default().to_string())
                }
                Err(err) => return Err(err),
            }
        };

        let audit_env = if self.has_env_probe() {
            Some(probe.run(&self.audit_env)?)
        } else {
            None
        };

        Ok(ProbeOutputs {
            audit,
            audit_config,
            audit_env,
        })
    }

    fn evaluate_tests(&self, outputs: &ProbeOutputs) -> CheckOutcome {
        let Some(tests) = &self.tests else {
            return CheckOutcome::new(State::failing(self.scored), "No tests defined");
        };

        match self.resolve_tests(tests, outputs) {
            Ok((combined, sources_used)) => {
                let state = if combined.matched {
                    State::Pass
                } else {
                    State::failing(self.scored)
                };
                debug!(%state, expected = %combined.expected_result, "Check evaluated");
                CheckOutcome {
                    state,
                    reason: String::new(),
                    actual_value: combined.actual_value,
                    expected_result: combined.expected_result,
                    sources_used,
                }
            }
            Err(err) => {
                debug!(error = %err, "Check evaluation failed");
                CheckOutcome::new(State::failing(self.scored), err.to_string())
            }
        }
    }

    fn resolve_tests(
        &self,
        tests: &TestSet,
        outputs: &ProbeOutputs,
    ) -> Result<(TestOutcome, Vec<ProbeSource>), EvaluationError> {
        let mut outcomes = Vec::with_capacity(tests.test_items.len());
        let mut sources = Vec::with_capacity(tests.test_items.len());

        for item in &tests.test_items {
            let (outcome, source) = self.resolve_item(item, outputs)?;
            debug!(
                flag = %item.flag,
                %source,
                matched = outcome.matched,
                "Test item resolved"
            );
            outcomes.push(outcome);
            sources.push(source);
        }

        let combined = tests.combine(&outcomes)?;
        Ok((combined, sources))
    }

    /// Try each source of the fallback chain until the item's locator is found
    fn resolve_item(
        &self,
        item: &TestItem,
        outputs: &ProbeOutputs,
    ) -> Result<(TestOutcome, ProbeSource), EvaluationError> {
        let mut resolved: Option<(TestOutcome, ProbeSource)> = None;

        for source in ProbeSource::FALLBACK_CHAIN {
            if resolved.as_ref().is_some_and(|(o, _)| o.flag_found) {
                break;
            }
            let Some(output) = outputs.for_item(item, source) else {
                continue;
            };
            let outcome = item.evaluate(output, source, self.use_multiple_values)?;
            resolved = Some((outcome, source));
        }

        Ok(resolved.unwrap_or_else(|| (TestOutcome::default(), ProbeSource::Primary)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_set::BinOp;
    use crate::utils::command::StaticProbe;
    use pretty_assertions::assert_eq;

    fn check(tests: Option<TestSet>, scored: bool) -> Check {
        Check {
            audit: "ps -ef | grep kubelet".to_string(),
            tests,
            scored,
            ..Check::new("4.2.1", "Ensure anonymous auth is disabled")
        }
    }

    fn anonymous_auth() -> TestSet {
        TestSet::new(
            vec![TestItem::flag("--anonymous-auth")
                .with_path("{.authentication.anonymous.enabled}")
                .with_compare("eq", "false")],
            BinOp::And,
        )
    }

    #[test]
    fn test_skip_is_info_regardless_of_tests() {
        for scored in [true, false] {
            let mut c = check(Some(anonymous_auth()), scored);
            c.check_type = Some(CheckType::Skip);
            let out = c.evaluate(&ProbeOutputs::default());
            assert_eq!(out.state, State::Info);
            assert_eq!(out.reason, "Test marked as skip");
        }
    }

    #[test]
    fn test_manual_is_warn_regardless_of_scoring() {
        for scored in [true, false] {
            let mut c = check(None, scored);
            c.check_type = Some(CheckType::Manual);
            let out = c.evaluate(&ProbeOutputs::default());
            assert_eq!(out.state, State::Warn);
            assert_eq!(out.reason, "Test marked as a manual test");
        }
    }

    #[test]
    fn test_scored_without_tests_or_type_warns() {
        let out = check(None, true).evaluate(&ProbeOutputs::default());
        assert_eq!(out.state, State::Warn);
        assert_eq!(out.reason, "There are no tests");
    }

    #[test]
    fn test_no_tests_defined() {
        let mut c = check(None, true);
        c.check_type = Some(CheckType::Normal);
        let out = c.evaluate(&ProbeOutputs::default());
        assert_eq!(out.state, State::Fail);
        assert_eq!(out.reason, "No tests defined");

        let out = check(None, false).evaluate(&ProbeOutputs::default());
        assert_eq!(out.state, State::Warn);
        assert_eq!(out.reason, "No tests defined");

        let out = check(Some(TestSet::default()), true).evaluate(&ProbeOutputs::default());
        assert_eq!(out.state, State::Fail);
        assert_eq!(out.reason, "No tests defined");
    }

    #[test]
    fn test_pass_from_primary() {
        let c = check(Some(anonymous_auth()), true);
        let out = c.evaluate(&ProbeOutputs::primary("kubelet --anonymous-auth=false"));
        assert_eq!(out.state, State::Pass);
        assert_eq!(out.sources_used, vec![ProbeSource::Primary]);
        assert_eq!(out.actual_value, "kubelet --anonymous-auth=false");
        assert_eq!(out.expected_result, "'--anonymous-auth' is equal to 'false'");
    }

    #[test]
    fn test_fail_or_warn_depends_on_scoring() {
        let outputs = ProbeOutputs::primary("kubelet --anonymous-auth=true");
        assert_eq!(
            check(Some(anonymous_auth()), true).evaluate(&outputs).state,
            State::Fail
        );
        assert_eq!(
            check(Some(anonymous_auth()), false).evaluate(&outputs).state,
            State::Warn
        );
    }

    #[test]
    fn test_falls_back_to_config() {
        let c = check(Some(anonymous_auth()), true);
        let outputs = ProbeOutputs::primary("kubelet --config=/var/lib/kubelet/config.yaml")
            .with_config("authentication:\n  anonymous:\n    enabled: false\n");
        let out = c.evaluate(&outputs);
        assert_eq!(out.state, State::Pass);
        assert_eq!(out.sources_used, vec![ProbeSource::Config]);
        assert_eq!(
            out.expected_result,
            "'{.authentication.anonymous.enabled}' is equal to 'false'"
        );
    }

    #[test]
    fn test_falls_back_to_env() {
        let tests = TestSet::new(
            vec![TestItem::flag("--auto-tls")
                .with_env("ETCD_AUTO_TLS")
                .with_compare("eq", "false")],
            BinOp::And,
        );
        let c = check(Some(tests), true);
        let outputs = ProbeOutputs::primary("etcd --name=default")
            .with_config("")
            .with_env("ETCD_AUTO_TLS=false\n");
        let out = c.evaluate(&outputs);
        assert_eq!(out.state, State::Pass);
        assert_eq!(out.sources_used, vec![ProbeSource::Env]);
    }

    #[test]
    fn test_env_fallback_requires_env_locator() {
        let c = check(Some(anonymous_auth()), true);
        let outputs = ProbeOutputs::primary("kubelet").with_env("--anonymous-auth=false");
        let out = c.evaluate(&outputs);
        assert_eq!(out.state, State::Fail);
        assert_eq!(out.sources_used, vec![ProbeSource::Primary]);
    }

    #[test]
    fn test_items_resolve_independently() {
        let tests = TestSet::new(
            vec![
                TestItem::flag("--anonymous-auth")
                    .with_path("{.authentication.anonymous.enabled}")
                    .with_compare("eq", "false"),
                TestItem::flag("--read-only-port").with_compare("eq", "0"),
            ],
            BinOp::And,
        );
        let c = check(Some(tests), true);
        let outputs = ProbeOutputs::primary("kubelet --read-only-port=0")
            .with_config("authentication:\n  anonymous:\n    enabled: false\n");
        let out = c.evaluate(&outputs);
        assert_eq!(out.state, State::Pass);
        assert_eq!(
            out.sources_used,
            vec![ProbeSource::Config, ProbeSource::Primary]
        );
    }

    #[test]
    fn test_unknown_bin_op_fails_check() {
        let mut tests = anonymous_auth();
        tests.bin_op = BinOp::parse("xor");
        let out = check(Some(tests), false)
            .evaluate(&ProbeOutputs::primary("kubelet --anonymous-auth=false"));
        assert_eq!(out.state, State::Warn);
        assert_eq!(out.reason, "unknown binary operator for tests xor");
    }

    #[test]
    fn test_malformed_path_fails_check() {
        let tests = TestSet::new(
            vec![TestItem::flag("--x").with_path("{.a[")],
            BinOp::And,
        );
        let out = check(Some(tests), true)
            .evaluate(&ProbeOutputs::primary("kubelet").with_config("a: 1"));
        assert_eq!(out.state, State::Fail);
        assert!(out.reason.contains("unable to parse path expression"));
    }

    #[test]
    fn test_run_with_probe_failure() {
        let c = check(Some(anonymous_auth()), true);
        let probe = StaticProbe::new().with_failure("ps -ef | grep kubelet", "boom", 1);
        let out = c.run(&probe);
        assert_eq!(out.state, State::Fail);
        assert_eq!(
            out.reason,
            "failed to run: \"ps -ef | grep kubelet\", output: \"boom\", error: exit status 1"
        );
    }

    #[test]
    fn test_run_suppresses_missing_config_when_env_probe_exists() {
        let tests = TestSet::new(
            vec![TestItem::flag("--auto-tls")
                .with_env("ETCD_AUTO_TLS")
                .with_compare("eq", "false")],
            BinOp::And,
        );
        let c = Check {
            audit_config: "cat /etc/etcd/etcd.conf".to_string(),
            audit_env: "cat /proc/1/environ".to_string(),
            ..check(Some(tests), true)
        };
        let probe = StaticProbe::new()
            .with_output("ps -ef | grep kubelet", "etcd")
            .with_failure(
                "cat /etc/etcd/etcd.conf",
                "cat: /etc/etcd/etcd.conf: No such file or directory",
                1,
            )
            .with_output("cat /proc/1/environ", "ETCD_AUTO_TLS=false");
        let out = c.run(&probe);
        assert_eq!(out.state, State::Pass);
        assert_eq!(out.sources_used, vec![ProbeSource::Env]);
    }

    #[test]
    fn test_run_config_failure_without_env_probe() {
        let c = Check {
            audit_config: "cat /missing".to_string(),
            ..check(Some(anonymous_auth()), false)
        };
        let probe = StaticProbe::new()
            .with_output("ps -ef | grep kubelet", "kubelet")
            .with_failure("cat /missing", "No such file or directory", 1);
        let out = c.run(&probe);
        assert_eq!(out.state, State::Warn);
        assert!(out.reason.starts_with("failed to run: \"cat /missing\""));
    }

    #[test]
    fn test_empty_config_value_counts_as_absent() {
        let present = TestSet::new(
            vec![TestItem::flag("--tls-cipher-suites").with_path("{.tlsCipherSuites}")],
            BinOp::And,
        );
        let outputs = ProbeOutputs::primary("kubelet --config=/var/lib/kubelet/config.yaml")
            .with_config("tlsCipherSuites: \"\"\n");
        let out = check(Some(present), true).evaluate(&outputs);
        assert_eq!(out.state, State::Fail);
        assert_eq!(out.expected_result, "'{.tlsCipherSuites}' is present");

        let absent = TestSet::new(
            vec![TestItem::absent("--tls-cipher-suites").with_path("{.tlsCipherSuites}")],
            BinOp::And,
        );
        assert_eq!(check(Some(absent), true).evaluate(&outputs).state, State::Pass);
    }

    #[test]
    fn test_present_and_absent_pass() {
        let tests = TestSet::new(
            vec![TestItem::flag("--authorization-mode"), TestItem::absent("--profiling")],
            BinOp::And,
        );
        let out = check(Some(tests), true)
            .evaluate(&ProbeOutputs::primary("apiserver --authorization-mode=Node,RBAC"));
        assert_eq!(out.state, State::Pass);
    }

    #[test]
    fn test_deserialize_check() {
        let yaml = r#"
id: 1.1.1
text: "Ensure that the API server pod specification file permissions are set"
audit: "stat -c permissions=%a /etc/kubernetes/manifests/kube-apiserver.yaml"
tests:
  test_items:
    - flag: "permissions"
      compare:
        op: bitmask
        value: "600"
remediation: "chmod 600 /etc/kubernetes/manifests/kube-apiserver.yaml"
scored: true
"#;
        let c: Check = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(c.id, "1.1.1");
        assert!(c.scored);
        assert!(c.check_type.is_none());
        assert_eq!(c.tests.as_ref().unwrap().test_items.len(), 1);

        let out = c.evaluate(&ProbeOutputs::primary("permissions=600\n"));
        assert_eq!(out.state, State::Pass);
        assert_eq!(
            out.expected_result,
            "permissions has permissions 600, expected 600 or more restrictive"
        );
    }

    #[test]
    fn test_deserialize_check_type() {
        let c: Check = serde_yaml::from_str("id: 1.2\ntype: manual\n").unwrap();
        assert_eq!(c.id, "1.2");
        assert!(c.is_manual());

        let c: Check = serde_yaml::from_str("id: 1\ntype: \"\"\n").unwrap();
        assert!(c.check_type.is_none());

        assert!(serde_yaml::from_str::<Check>("id: 1\ntype: sometimes\n").is_err());
    }
}
