//! Test items: one atomic condition on probe output

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::compare::CompareOp;
use super::de::scalar_string;
use super::extract::{extract, DocumentFormat, ExtractMode};
use crate::error::ExtractError;

/// Which probe output a test item was evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeSource {
    /// Output of the check's `audit` command
    Primary,
    /// Output of the check's `audit_config` command
    Config,
    /// Output of the check's `audit_env` command
    Env,
}

impl ProbeSource {
    /// Order in which sources are tried for each test item
    pub const FALLBACK_CHAIN: [ProbeSource; 3] =
        [ProbeSource::Primary, ProbeSource::Config, ProbeSource::Env];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeSource::Primary => "primary",
            ProbeSource::Config => "config",
            ProbeSource::Env => "env",
        }
    }
}

impl fmt::Display for ProbeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected comparison for a present flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compare {
    pub op: CompareOp,
    #[serde(default, deserialize_with = "scalar_string")]
    pub value: String,
}

/// One condition of a test set
///
/// `flag` is searched in the primary output (and in the config output when
/// no `path` is given), `path` is a JSONPath template applied to the config
/// output, and `env` names a variable in the env output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestItem {
    #[serde(default)]
    pub flag: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub env: String,

    /// `true`: the flag must be present (and compare, if configured);
    /// `false`: the flag must be absent
    #[serde(default = "default_set")]
    pub set: bool,

    #[serde(
        default,
        deserialize_with = "deserialize_compare",
        skip_serializing_if = "Option::is_none"
    )]
    pub compare: Option<Compare>,
}

fn default_set() -> bool {
    true
}

/// A compare block with an empty `op` means "no comparison"
fn deserialize_compare<'de, D>(deserializer: D) -> Result<Option<Compare>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct RawCompare {
        #[serde(default, deserialize_with = "scalar_string")]
        op: String,
        #[serde(default, deserialize_with = "scalar_string")]
        value: String,
    }

    let raw = Option::<RawCompare>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| {
        let op = raw.op.trim();
        if op.is_empty() {
            None
        } else {
            Some(Compare {
                op: CompareOp::parse(op),
                value: raw.value,
            })
        }
    }))
}

/// Outcome of evaluating a test item or a test set
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TestOutcome {
    /// Whether the condition holds
    pub matched: bool,
    /// Whether the locator was present in the output
    #[serde(skip)]
    pub flag_found: bool,
    /// Output the condition was evaluated against
    pub actual_value: String,
    /// What the condition expected, in words
    pub expected_result: String,
}

impl TestItem {
    /// Presence check on a flag
    pub fn flag(flag: impl Into<String>) -> Self {
        Self {
            flag: flag.into(),
            path: String::new(),
            env: String::new(),
            set: true,
            compare: None,
        }
    }

    /// Absence check on a flag
    pub fn absent(flag: impl Into<String>) -> Self {
        Self {
            set: false,
            ..Self::flag(flag)
        }
    }

    /// Add a comparison
    pub fn with_compare(mut self, op: &str, value: impl Into<String>) -> Self {
        self.compare = Some(Compare {
            op: CompareOp::parse(op),
            value: value.into(),
        });
        self
    }

    /// Add a JSONPath template used against config output
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Add an environment variable name used against env output
    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = env.into();
        self
    }

    /// The locator used against a given source, if the item has one
    pub fn locator(&self, source: ProbeSource) -> Option<&str> {
        let non_empty = |s: &str| !s.is_empty();
        let locator = match source {
            ProbeSource::Primary => Some(self.flag.as_str()),
            ProbeSource::Config if non_empty(&self.path) => Some(self.path.as_str()),
            ProbeSource::Config => Some(self.flag.as_str()),
            ProbeSource::Env => Some(self.env.as_str()),
        };
        locator.filter(|l| non_empty(l))
    }

    fn extract_mode(&self, source: ProbeSource) -> ExtractMode {
        match source {
            ProbeSource::Primary => ExtractMode::Flag,
            ProbeSource::Config if self.path.is_empty() => ExtractMode::Flag,
            ProbeSource::Config => ExtractMode::JsonPath(DocumentFormat::Auto),
            ProbeSource::Env => ExtractMode::Env,
        }
    }

    /// Evaluate against one probe output.
    ///
    /// With `multiple_values`, every line of the output must satisfy the item;
    /// evaluation stops at the first line that does not.
    pub fn evaluate(
        &self,
        output: &str,
        source: ProbeSource,
        multiple_values: bool,
    ) -> Result<TestOutcome, ExtractError> {
        let output = output.trim_end_matches(|c| c == ' ' || c == '\n');

        let lines: Vec<&str> = if multiple_values {
            output.split('\n').collect()
        } else {
            vec![output]
        };

        let mut outcome = TestOutcome::default();
        for line in lines {
            outcome = self.evaluate_line(line, source)?;
            if !outcome.matched {
                break;
            }
        }

        if self.set {
            outcome.actual_value = output.to_string();
        }
        Ok(outcome)
    }

    fn evaluate_line(&self, line: &str, source: ProbeSource) -> Result<TestOutcome, ExtractError> {
        let locator = self.locator(source).unwrap_or_default();
        let extracted = extract(line, self.extract_mode(source), locator)?;

        let (expected_result, matched) = if !self.set {
            (format!("'{locator}' is not present"), !extracted.found)
        } else {
            match &self.compare {
                Some(compare) if extracted.found => {
                    let comparison = compare.op.evaluate(&extracted.value, &compare.value, locator);
                    (comparison.explanation, comparison.result)
                }
                _ => (format!("'{locator}' is present"), extracted.found),
            }
        };

        Ok(TestOutcome {
            matched,
            flag_found: extracted.found,
            actual_value: String::new(),
            expected_result,
        })
    }
}
