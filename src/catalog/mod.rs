//! Benchmark catalogs
//!
//! A catalog is a YAML controls file: a node type, a list of groups, and
//! the checks of each group. Placeholders such as `$kubeletconf` are
//! substituted from the configuration before the YAML is parsed.

pub mod substitution;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::CatalogError;
use crate::rules::de::{null_as_default, scalar_string};
use crate::rules::Check;

pub use substitution::{substitute, Substituted};

/// File name of per-benchmark settings, never a controls file
const CONFIG_YAML: &str = "config.yaml";

lazy_static! {
    /// Unquoted numeric `id:` value such as `1.10`, which YAML would read as a float
    static ref NUMERIC_ID: Regex = Regex::new(
        r"(?m)^([ \t]*(?:-[ \t]+)?id:[ \t]*)([0-9]+(?:\.[0-9]+)*)([ \t]*(?:#[^\r\n]*)?\r?)$"
    )
    .unwrap();
}

/// Quote numeric ids so they keep their written form (`1.10` stays `1.10`)
fn quote_numeric_ids(text: &str) -> Cow<'_, str> {
    NUMERIC_ID.replace_all(text, "${1}\"${2}\"${3}")
}

/// One controls file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Controls {
    #[serde(default, deserialize_with = "scalar_string")]
    pub id: String,

    #[serde(default, deserialize_with = "scalar_string")]
    pub version: String,

    #[serde(default)]
    pub text: String,

    /// Node type, e.g. `master`, `node`, `etcd`
    #[serde(default, rename = "type")]
    pub node_type: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub groups: Vec<Group>,

    /// File the controls were read from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// A group of related checks
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Group {
    #[serde(default, deserialize_with = "scalar_string")]
    pub id: String,

    #[serde(default)]
    pub text: String,

    /// `skip` marks every check of the group as skipped
    #[serde(default, rename = "type", deserialize_with = "scalar_string")]
    pub group_type: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub checks: Vec<Check>,
}

impl Group {
    pub fn is_skipped(&self) -> bool {
        self.group_type.trim() == "skip"
    }
}

/// Options applied while loading catalogs
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Placeholder values
    pub substitutions: BTreeMap<String, String>,
    /// Node type every controls file must declare
    pub target: Option<String>,
    /// Process read by generated env probes
    pub env_process: Option<String>,
}

impl Controls {
    /// Parse a controls document after substitution
    pub fn parse(content: &str, options: &LoadOptions) -> Result<Self, CatalogError> {
        Self::parse_named(content, "<inline>", options)
    }

    fn parse_named(content: &str, name: &str, options: &LoadOptions) -> Result<Self, CatalogError> {
        let substituted = substitute(content, &options.substitutions);

        let text = quote_numeric_ids(&substituted.text);
        let mut controls: Controls =
            serde_yaml::from_str(&text).map_err(|source| CatalogError::Parse {
                path: name.to_string(),
                source,
            })?;

        if let Some(target) = &options.target {
            if controls.node_type != *target {
                return Err(CatalogError::TargetMismatch {
                    expected: target.clone(),
                });
            }
        }

        let process = options.env_process.clone().or_else(|| {
            match substituted.binaries(&options.substitutions).as_slice() {
                [single] => Some(single.to_string()),
                _ => None,
            }
        });
        controls.add_default_env_probes(process.as_deref());

        Ok(controls)
    }

    /// Read and parse one controls file
    pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Self, CatalogError> {
        debug!(path = %path.display(), "Loading controls file");
        let content = fs::read_to_string(path).map_err(|source| CatalogError::FileRead {
            path: path.display().to_string(),
            source,
        })?;

        let mut controls = Self::parse_named(&content, &path.display().to_string(), options)?;
        controls.source = Some(path.to_path_buf());
        Ok(controls)
    }

    /// Give checks that look up environment variables a default env probe
    fn add_default_env_probes(&mut self, process: Option<&str>) {
        for group in &mut self.groups {
            for check in &mut group.checks {
                if check.disable_env_testing || check.has_env_probe() || !check.uses_env() {
                    continue;
                }
                match process {
                    Some(process) => check.audit_env = default_env_probe(process),
                    None => warn!(
                        check = %check.id,
                        "Env probe not set for check and the process cannot be determined"
                    ),
                }
            }
        }
    }

    pub fn check_count(&self) -> usize {
        self.groups.iter().map(|g| g.checks.len()).sum()
    }
}

/// Probe printing the environment of `process`, one variable per line
pub fn default_env_probe(process: &str) -> String {
    format!(
        "cat \"/proc/$(/bin/ps -C {process} -o pid= | tr -d ' ')/environ\" | tr '\\0' '\\n'"
    )
}

/// Controls files under `path`: the file itself, or every `*.yaml` file
/// below a directory except `config.yaml`, in path order
pub fn discover(path: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    if !path.exists() {
        return Err(CatalogError::FileRead {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry?;
        let file = entry.path();
        let is_yaml = file
            .extension()
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        let is_config = file.file_name().is_some_and(|name| name == CONFIG_YAML);
        if entry.file_type().is_file() && is_yaml && !is_config {
            files.push(file.to_path_buf());
        }
    }

    if files.is_empty() {
        return Err(CatalogError::Empty {
            path: path.display().to_string(),
        });
    }
    Ok(files)
}

/// Load every controls file found under `paths`
pub fn load_all(paths: &[PathBuf], options: &LoadOptions) -> Result<Vec<Controls>, CatalogError> {
    let mut controls = Vec::new();
    for path in paths {
        for file in discover(path)? {
            controls.push(Controls::load_file(&file, options)?);
        }
    }
    Ok(controls)
}
