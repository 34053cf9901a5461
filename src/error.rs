//! Error types for benchlens
//!
//! This module defines custom error types using `thiserror` for better error handling
//! and more descriptive error messages throughout the application.
//!
//! Errors raised while evaluating a single check ([`ExtractError`],
//! [`EvaluationError`], [`ProbeError`]) never escape the check runner: they are
//! folded into the check's outcome. The remaining errors abort a command.

use thiserror::Error;

/// Main error type for benchlens
#[derive(Error, Debug)]
pub enum BenchLensError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Catalog loading errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Run filter errors
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    /// Report output errors
    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

/// Errors related to the benchlens configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        /// Path to the configuration file
        path: String,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// Failed to parse the configuration file
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to serialize configuration or metadata
    #[error("Failed to serialize: {message}")]
    Serialize {
        /// Description of the failure
        message: String,
    },

    /// Refused to overwrite an existing file
    #[error("'{path}' already exists (use --force to overwrite)")]
    AlreadyExists {
        /// Path of the existing file
        path: String,
    },
}

/// Errors that occur while loading benchmark catalogs
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Failed to read a catalog file
    #[error("Failed to read catalog '{path}': {source}")]
    FileRead {
        /// Path to the catalog file
        path: String,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// The catalog is not valid YAML or does not match the controls layout
    #[error("failed to unmarshal YAML in '{path}': {source}")]
    Parse {
        /// Path to the catalog file
        path: String,
        /// The underlying YAML error
        source: serde_yaml::Error,
    },

    /// Failed while walking a catalog directory
    #[error("Failed to walk catalog directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// The controls file targets another node type
    #[error("non-{expected} controls file specified")]
    TargetMismatch {
        /// Requested node type
        expected: String,
    },

    /// No catalog file could be found at the given location
    #[error("No catalog files found in '{path}'")]
    Empty {
        /// Searched location
        path: String,
    },
}

/// Errors in the run filter selection
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FilterError {
    /// Both group and check lists were given
    #[error("group option and check option can't be used together")]
    GroupAndCheck,
}

/// Errors that occur while writing reports
#[derive(Error, Debug)]
pub enum OutputError {
    /// Failed to write the report file
    #[error("Failed to write '{path}': {source}")]
    FileWrite {
        /// Destination path
        path: String,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// Failed to serialize the report
    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by a structured value lookup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The JSONPath template could not be parsed
    #[error("unable to parse path expression \"{expression}\": {reason}")]
    InvalidPath {
        /// The offending expression
        expression: String,
        /// Parser diagnostic
        reason: String,
    },

    /// A flag could not be turned into a scan pattern
    #[error("invalid flag in test item definition '{flag}': {reason}")]
    InvalidFlag {
        /// The offending flag
        flag: String,
        /// Diagnostic
        reason: String,
    },
}

/// Errors that abort the evaluation of one check's test set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// The test set names a combinator other than `and`/`or`
    #[error("unknown binary operator for tests {0}")]
    UnknownBinOp(String),

    /// A test item's locator was malformed
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Errors reported by a probe executor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The shell could not be started
    #[error("failed to run: {command:?}, error: {message}")]
    Spawn {
        /// The probe command
        command: String,
        /// Description of the spawn failure
        message: String,
    },

    /// The probe ran and exited unsuccessfully
    #[error("failed to run: {command:?}, output: {output:?}, error: exit status {}", exit_status(.code))]
    Failed {
        /// The probe command
        command: String,
        /// Combined output of the command
        output: String,
        /// Exit code, if the process exited normally
        code: Option<i32>,
    },
}

fn exit_status(code: &Option<i32>) -> String {
    code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
}

impl ProbeError {
    /// Output captured before the failure, if any
    pub fn output(&self) -> Option<&str> {
        match self {
            ProbeError::Failed { output, .. } => Some(output),
            ProbeError::Spawn { .. } => None,
        }
    }

    /// Whether the failure looks like a missing file or command
    pub fn is_not_found(&self) -> bool {
        match self {
            ProbeError::Failed { output, code, .. } => {
                *code == Some(127) || output.contains("No such file or directory")
            }
            ProbeError::Spawn { .. } => false,
        }
    }
}

impl From<std::io::Error> for BenchLensError {
    fn from(err: std::io::Error) -> Self {
        BenchLensError::Output(OutputError::FileWrite {
            path: "unknown".to_string(),
            source: err,
        })
    }
}

impl From<serde_json::Error> for BenchLensError {
    fn from(err: serde_json::Error) -> Self {
        BenchLensError::Output(OutputError::Json(err))
    }
}

impl From<toml::de::Error> for BenchLensError {
    fn from(err: toml::de::Error) -> Self {
        BenchLensError::Config(ConfigError::Parse(err))
    }
}

impl From<toml::ser::Error> for BenchLensError {
    fn from(err: toml::ser::Error) -> Self {
        BenchLensError::Config(ConfigError::Serialize {
            message: err.to_string(),
        })
    }
}
