//! Test sets: boolean combination of test items

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::de::null_as_default;
use super::test_item::{ProbeSource, TestItem, TestOutcome};
use crate::error::EvaluationError;

/// How item outcomes are folded together
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BinOp {
    #[default]
    And,
    Or,
    /// Anything else written in the catalog; rejected at evaluation time
    Unrecognized(String),
}

impl BinOp {
    pub fn parse(op: &str) -> Self {
        match op.trim() {
            "" | "and" => BinOp::And,
            "or" => BinOp::Or,
            other => BinOp::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Unrecognized(op) => op,
        }
    }

    fn joiner(&self) -> Result<&'static str, EvaluationError> {
        match self {
            BinOp::And => Ok(" AND "),
            BinOp::Or => Ok(" OR "),
            BinOp::Unrecognized(op) => Err(EvaluationError::UnknownBinOp(op.clone())),
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for BinOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BinOp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let op = Option::<String>::deserialize(deserializer)?;
        Ok(op.map(|op| BinOp::parse(&op)).unwrap_or_default())
    }
}

/// Ordered test items and their combinator
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestSet {
    #[serde(default, deserialize_with = "null_as_default")]
    pub test_items: Vec<TestItem>,

    #[serde(default)]
    pub bin_op: BinOp,
}

impl TestSet {
    pub fn new(test_items: Vec<TestItem>, bin_op: BinOp) -> Self {
        Self { test_items, bin_op }
    }

    pub fn is_empty(&self) -> bool {
        self.test_items.is_empty()
    }

    /// Evaluate every item against the same output and combine the results
    pub fn evaluate(
        &self,
        output: &str,
        source: ProbeSource,
        multiple_values: bool,
    ) -> Result<TestOutcome, EvaluationError> {
        let outcomes = self
            .test_items
            .iter()
            .map(|item| item.evaluate(output, source, multiple_values))
            .collect::<Result<Vec<_>, _>>()?;
        self.combine(&outcomes)
    }

    /// Fold per-item outcomes, one per item, in item order.
    ///
    /// The set's actual value is the first item's actual value.
    pub fn combine(&self, outcomes: &[TestOutcome]) -> Result<TestOutcome, EvaluationError> {
        let joiner = self.bin_op.joiner()?;

        let matched = match self.bin_op {
            BinOp::Or => outcomes.iter().any(|o| o.matched),
            _ => outcomes.iter().all(|o| o.matched),
        };

        let expected_result = outcomes
            .iter()
            .map(|o| o.expected_result.as_str())
            .collect::<Vec<_>>()
            .join(joiner);

        let first = outcomes.first();
        Ok(TestOutcome {
            matched,
            flag_found: first.map(|o| o.flag_found).unwrap_or_default(),
            actual_value: first.map(|o| o.actual_value.clone()).unwrap_or_default(),
            expected_result,
        })
    }
}
