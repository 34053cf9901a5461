//! Comparison operators for test items
//!
//! Each operator produces a boolean result together with an explanation
//! string. Explanations are part of the audit trail: they are joined across a
//! test set into the check's expected-result text, so their wording must stay
//! stable.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::{debug, warn};

const ARRAY_SEPARATOR: char = ',';

/// Comparison operator named in a test item's `compare.op`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Has,
    NotHave,
    Regex,
    ValidElements,
    Bitmask,
    /// An operator name this engine does not know; never matches
    Unrecognized(String),
}

impl CompareOp {
    /// Parse an operator name
    pub fn parse(op: &str) -> Self {
        match op {
            "eq" => Self::Eq,
            "noteq" => Self::NotEq,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "has" => Self::Has,
            "nothave" => Self::NotHave,
            "regex" => Self::Regex,
            "valid_elements" => Self::ValidElements,
            "bitmask" => Self::Bitmask,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Operator name as written in catalogs
    pub fn as_str(&self) -> &str {
        match self {
            Self::Eq => "eq",
            Self::NotEq => "noteq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Has => "has",
            Self::NotHave => "nothave",
            Self::Regex => "regex",
            Self::ValidElements => "valid_elements",
            Self::Bitmask => "bitmask",
            Self::Unrecognized(name) => name,
        }
    }

    /// Compare `observed` against `expected`; `subject` names the compared
    /// value in the explanation.
    pub fn evaluate(&self, observed: &str, expected: &str, subject: &str) -> Comparison {
        match self {
            Self::Eq => Comparison::new(
                format!("'{subject}' is equal to '{expected}'"),
                loosely_equal(observed, expected),
            ),
            Self::NotEq => Comparison::new(
                format!("'{subject}' is not equal to '{expected}'"),
                !loosely_equal(observed, expected),
            ),
            Self::Gt | Self::Gte | Self::Lt | Self::Lte => {
                self.compare_numbers(observed, expected, subject)
            }
            Self::Has => Comparison::new(
                format!("'{subject}' has '{expected}'"),
                observed.contains(expected),
            ),
            Self::NotHave => Comparison::new(
                format!("'{subject}' does not have '{expected}'"),
                !observed.contains(expected),
            ),
            Self::Regex => {
                let result = match Regex::new(expected) {
                    Ok(re) => re.is_match(observed),
                    Err(e) => {
                        warn!(pattern = expected, error = %e, "Invalid regex in comparison");
                        false
                    }
                };
                Comparison::new(
                    format!("'{subject}' matched by regex expression '{expected}'"),
                    result,
                )
            }
            Self::ValidElements => Comparison::new(
                format!("'{subject}' contains valid elements from '{expected}'"),
                all_elements_valid(&split_elements(observed), &split_elements(expected)),
            ),
            Self::Bitmask => compare_bitmask(observed, expected, subject),
            Self::Unrecognized(name) => {
                debug!(op = %name, "Unrecognized comparison operator");
                Comparison::new(String::new(), false)
            }
        }
    }

    fn compare_numbers(&self, observed: &str, expected: &str, subject: &str) -> Comparison {
        let (Ok(a), Ok(b)) = (
            observed.trim().parse::<i64>(),
            expected.trim().parse::<i64>(),
        ) else {
            debug!(observed, expected, "Not numeric value in comparison");
            return Comparison::new(
                format!("Invalid Number(s) used for comparison: '{observed}' '{expected}'"),
                false,
            );
        };

        let (explanation, result) = match self {
            Self::Gt => (format!("'{subject}' is greater than {expected}"), a > b),
            Self::Gte => (format!("'{subject}' is greater or equal to {expected}"), a >= b),
            Self::Lt => (format!("'{subject}' is lower than {expected}"), a < b),
            _ => (format!("'{subject}' is lower or equal to {expected}"), a <= b),
        };
        Comparison::new(explanation, result)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CompareOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CompareOp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::parse(name.trim()))
    }
}

/// Result of a comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    /// Human-readable statement of what was expected
    pub explanation: String,
    /// Whether the observed value satisfied it
    pub result: bool,
}

impl Comparison {
    fn new(explanation: String, result: bool) -> Self {
        Self {
            explanation,
            result,
        }
    }
}

/// Compare using an operator name; unknown names never match
pub fn compare(op: &str, observed: &str, expected: &str, subject: &str) -> Comparison {
    CompareOp::parse(op).evaluate(observed, expected, subject)
}

/// Booleans compare case-insensitively on the observed side only
fn loosely_equal(observed: &str, expected: &str) -> bool {
    let lowered = observed.to_lowercase();
    if lowered == "true" || lowered == "false" {
        lowered == expected
    } else {
        observed == expected
    }
}

fn compare_bitmask(observed: &str, expected: &str, subject: &str) -> Comparison {
    let requested = match i64::from_str_radix(observed, 8) {
        Ok(v) => v,
        Err(e) => {
            debug!(observed, expected, error = %e, "Not numeric value in bitmask");
            return Comparison::new(format!("Not numeric value - flag: {observed}"), false);
        }
    };
    let allowed = match i64::from_str_radix(expected, 8) {
        Ok(v) => v,
        Err(e) => {
            debug!(observed, expected, error = %e, "Not numeric value in bitmask");
            return Comparison::new(format!("Not numeric value - flag: {expected}"), false);
        }
    };

    Comparison::new(
        format!("{subject} has permissions {observed}, expected {expected} or more restrictive"),
        allowed & requested == requested,
    )
}

fn split_elements(s: &str) -> Vec<&str> {
    let cleaned = s.trim().trim_end_matches(ARRAY_SEPARATOR);
    if cleaned.is_empty() {
        return Vec::new();
    }
    cleaned.split(ARRAY_SEPARATOR).map(str::trim).collect()
}

fn all_elements_valid(elements: &[&str], allowed: &[&str]) -> bool {
    match (elements.is_empty(), allowed.is_empty()) {
        (true, true) => true,
        (true, false) | (false, true) => false,
        (false, false) => elements.iter().all(|e| allowed.contains(e)),
    }
}
