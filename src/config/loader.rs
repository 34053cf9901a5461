//! Configuration loader

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{BenchLensError, ConfigError};

use super::{ProbeConfig, RunConfig};

/// Name of the per-directory configuration file
pub const CONFIG_FILENAME: &str = ".benchlens.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Probe execution settings
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Values for `$name` placeholders in catalogs
    #[serde(default)]
    pub substitutions: BTreeMap<String, String>,

    /// Run defaults
    #[serde(default)]
    pub run: RunConfig,
}

impl Config {
    /// Load configuration from the first location that exists:
    /// `explicit`, `./.benchlens.toml`, then the user config directory.
    pub fn load(explicit: Option<&Path>) -> Result<Self, BenchLensError> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        for path in Self::search_paths() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILENAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("benchlens").join("config.toml"));
        }
        paths
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, BenchLensError> {
        debug!(path = %path.display(), "Loading configuration");
        let content = fs::read_to_string(path).map_err(|e| {
            BenchLensError::Config(ConfigError::FileRead {
                path: path.display().to_string(),
                source: e,
            })
        })?;

        toml::from_str(&content).map_err(Into::into)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, BenchLensError> {
        toml::to_string_pretty(self).map_err(Into::into)
    }

    /// Configuration written by `benchlens init`
    pub fn starter() -> Self {
        let substitutions = [
            ("apiserverbin", "kube-apiserver"),
            ("apiserverconf", "/etc/kubernetes/manifests/kube-apiserver.yaml"),
            ("kubeletbin", "kubelet"),
            ("kubeletconf", "/var/lib/kubelet/config.yaml"),
            ("kubeletkubeconfig", "/etc/kubernetes/kubelet.conf"),
            ("kubeletcafile", "/etc/kubernetes/pki/ca.crt"),
            ("etcdbin", "etcd"),
            ("etcdconf", "/etc/kubernetes/manifests/etcd.yaml"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            substitutions,
            ..Self::default()
        }
    }
}
