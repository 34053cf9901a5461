//! Value extraction from probe output
//!
//! Probe output is either free text (command lines, `stat` output, process
//! environments) or a structured document (kubelet config files, API
//! objects). [`extract`] looks up a locator in it and reports whether it was
//! found, along with the value to compare.

use regex::Regex;
use serde_json::Value;
use tracing::trace;

use super::jsonpath::JsonPath;
use crate::error::ExtractError;

/// How a locator is looked up in probe output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    /// Substring scan for a flag, e.g. `--anonymous-auth=false` or `permissions=600`
    Flag,
    /// `NAME=value` scan over a process environment
    Env,
    /// JSONPath template over a parsed document
    JsonPath(DocumentFormat),
}

/// Document syntax for [`ExtractMode::JsonPath`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    /// JSON first, YAML as a fallback
    Auto,
}

/// Outcome of a lookup
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extracted {
    /// Value to compare against
    pub value: String,
    /// Whether the locator was present
    pub found: bool,
}

impl Extracted {
    fn missing() -> Self {
        Self::default()
    }

    fn found(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            found: true,
        }
    }
}

/// Look up `locator` in `source` according to `mode`.
///
/// Only a malformed locator is an error; unparseable documents and absent
/// keys are reported as not found.
pub fn extract(source: &str, mode: ExtractMode, locator: &str) -> Result<Extracted, ExtractError> {
    let extracted = match mode {
        ExtractMode::Flag => scan_flag(source, locator)?,
        ExtractMode::Env => scan_env(source, locator)?,
        ExtractMode::JsonPath(format) => lookup_path(source, format, locator)?,
    };
    trace!(
        ?mode,
        locator,
        found = extracted.found,
        value = %extracted.value,
        "Extracted value"
    );
    Ok(extracted)
}

fn scan_flag(source: &str, flag: &str) -> Result<Extracted, ExtractError> {
    if source.is_empty() || flag.is_empty() || !source.contains(flag) {
        return Ok(Extracted::missing());
    }

    // Accepted shapes: --flag=value, flag: value, flag:value, bare --flag
    let pattern = format!(r"({})(=|: *)*([^\s]*) *", regex::escape(flag));
    let re = Regex::new(&pattern).map_err(|e| ExtractError::InvalidFlag {
        flag: flag.to_string(),
        reason: e.to_string(),
    })?;

    let Some(caps) = re.captures(source) else {
        return Err(ExtractError::InvalidFlag {
            flag: flag.to_string(),
            reason: format!("no match in {source:?}"),
        });
    };

    let value = match caps.get(3).map(|m| m.as_str()) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ if flag.starts_with("--") => "true".to_string(),
        _ => flag.to_string(),
    };

    Ok(Extracted::found(value))
}

fn scan_env(source: &str, name: &str) -> Result<Extracted, ExtractError> {
    if source.is_empty() || name.is_empty() {
        return Ok(Extracted::missing());
    }

    let pattern = format!("{}=.*", regex::escape(name));
    let re = Regex::new(&pattern).map_err(|e| ExtractError::InvalidFlag {
        flag: name.to_string(),
        reason: e.to_string(),
    })?;

    let value = re
        .find(source)
        .map(|m| m.as_str()[name.len() + 1..].trim_end_matches('\r').to_string())
        .unwrap_or_default();

    if value.is_empty() {
        Ok(Extracted::missing())
    } else {
        Ok(Extracted::found(value))
    }
}

fn lookup_path(
    source: &str,
    format: DocumentFormat,
    template: &str,
) -> Result<Extracted, ExtractError> {
    let path = JsonPath::parse(template)?;

    let Some(document) = parse_document(source, format) else {
        trace!(?format, "Probe output is not a structured document");
        return Ok(Extracted::missing());
    };

    // An empty rendering, such as a `key: ""` leaf, counts as absent
    let result = path.evaluate(&document);
    if result.matches == 0 || result.value.is_empty() {
        Ok(Extracted::missing())
    } else {
        Ok(Extracted::found(result.value))
    }
}

fn parse_document(source: &str, format: DocumentFormat) -> Option<Value> {
    match format {
        DocumentFormat::Json => serde_json::from_str(source).ok(),
        DocumentFormat::Yaml => serde_yaml::from_str(source).ok(),
        DocumentFormat::Auto => serde_json::from_str(source)
            .ok()
            .or_else(|| serde_yaml::from_str(source).ok()),
    }
}
