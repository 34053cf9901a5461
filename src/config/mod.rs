//! Configuration module

pub mod loader;

pub use loader::Config;

use serde::{Deserialize, Serialize};

use crate::utils::command::DEFAULT_SHELL;

/// Probe execution configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Shell that runs probe scripts
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Process whose environment default env probes read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_process: Option<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            env_process: None,
        }
    }
}

fn default_shell() -> String {
    DEFAULT_SHELL.to_string()
}

/// Defaults for `benchlens run`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Check or group ids always forced to skip
    #[serde(default)]
    pub skip: Vec<String>,

    /// Node type controls files must declare
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Catalog files or directories used when none are given on the command line
    #[serde(default)]
    pub catalogs: Vec<String>,
}
