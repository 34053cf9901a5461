//! CLI commands module

pub mod generate_man;
pub mod init;
pub mod run;
pub mod validate;

use clap::Args;
use std::path::PathBuf;

use crate::catalog::LoadOptions;
use crate::config::Config;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Controls file or directory of controls files (repeatable)
    #[arg(long, value_name = "PATH")]
    pub catalog: Vec<PathBuf>,

    /// Node type every controls file must declare (master, node, etcd, ...)
    #[arg(long, value_name = "TYPE")]
    pub target: Option<String>,

    /// Only run these groups
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    pub group: Vec<String>,

    /// Only run these checks
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    pub check: Vec<String>,

    /// Group or check ids to skip
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    pub skip: Vec<String>,

    /// Only run scored checks
    #[arg(long, conflicts_with = "only_unscored")]
    pub only_scored: bool,

    /// Only run unscored checks
    #[arg(long)]
    pub only_unscored: bool,

    /// Output format
    #[arg(short, long, default_value = "terminal")]
    pub format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the probe output of failed checks
    #[arg(long)]
    pub include_test_output: bool,

    /// Do not print remediations
    #[arg(long)]
    pub no_remediations: bool,

    /// Do not print per-controls summaries
    #[arg(long)]
    pub no_summary: bool,

    /// Do not print the overall totals
    #[arg(long)]
    pub no_totals: bool,

    /// Exit with a non-zero code when checks warn
    #[arg(long)]
    pub fail_on_warn: bool,
}

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Controls file or directory of controls files (repeatable)
    #[arg(long, value_name = "PATH")]
    pub catalog: Vec<PathBuf>,

    /// Node type every controls file must declare
    #[arg(long, value_name = "TYPE")]
    pub target: Option<String>,
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the generate-man command
#[derive(Args, Debug)]
pub struct GenerateManArgs {
    /// Output directory for the man page
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,
}

/// Output format for the run command
#[derive(Debug, Clone, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Terminal,
    Json,
}

/// Catalog paths from the command line, else from the configuration
fn catalog_paths(args: &[PathBuf], config: &Config) -> Vec<PathBuf> {
    if args.is_empty() {
        config.run.catalogs.iter().map(PathBuf::from).collect()
    } else {
        args.to_vec()
    }
}

fn load_options(target: Option<String>, config: &Config) -> LoadOptions {
    LoadOptions {
        substitutions: config.substitutions.clone(),
        target: target.or_else(|| config.run.target.clone()),
        env_process: config.probe.env_process.clone(),
    }
}
