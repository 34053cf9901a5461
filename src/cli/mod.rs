//! # CLI Module
//!
//! This module defines the command-line interface for benchlens using `clap`.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `run` | Run benchmark checks and report the results |
//! | `validate` | Load catalogs and report what they contain |
//! | `init` | Write a starter configuration file |
//!
//! ## Global Options
//!
//! - `-v, --verbose` - Increase verbosity level (use multiple times: -v, -vv, -vvv)
//! - `-c, --config <FILE>` - Path to configuration file
//!
//! ## Examples
//!
//! ```bash
//! # Run every check of a catalog directory
//! benchlens run --catalog cfg/cis-1.8
//!
//! # Run two groups of the node benchmark and write JSON
//! benchlens run --catalog cfg/cis-1.8/node.yaml --target node --group 4.1,4.2 \
//!     --format json -o results.json
//! ```

pub mod commands;
pub mod exit_codes;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{GenerateManArgs, InitArgs, RunArgs, ValidateArgs};

/// benchlens - Audit hosts against security benchmark catalogs
#[derive(Parser, Debug)]
#[command(name = "benchlens")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run benchmark checks
    Run(RunArgs),

    /// Load catalogs and report what they contain
    Validate(ValidateArgs),

    /// Write a starter configuration file
    Init(InitArgs),

    /// Generate man page (hidden, for packaging)
    #[command(hide = true)]
    GenerateMan(GenerateManArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::parse_from([
            "benchlens",
            "-vv",
            "run",
            "--catalog",
            "cfg/node.yaml",
            "--group",
            "4.1,4.2",
            "--skip",
            "4.1.1",
            "--format",
            "json",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.catalog, vec![PathBuf::from("cfg/node.yaml")]);
        assert_eq!(args.group, vec!["4.1", "4.2"]);
        assert_eq!(args.skip, vec!["4.1.1"]);
        assert_eq!(args.format, commands::OutputFormat::Json);
    }

    #[test]
    fn test_scored_flags_conflict() {
        let parsed = Cli::try_parse_from([
            "benchlens",
            "run",
            "--catalog",
            "x.yaml",
            "--only-scored",
            "--only-unscored",
        ]);
        assert!(parsed.is_err());
    }
}
