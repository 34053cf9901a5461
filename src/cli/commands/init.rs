//! Init command - Write a starter configuration file

use colored::Colorize;
use std::fs;
use std::path::Path;

use super::InitArgs;
use crate::cli::exit_codes;
use crate::config::loader::CONFIG_FILENAME;
use crate::config::Config;
use crate::error::{BenchLensError, ConfigError, OutputError};

pub fn execute(args: InitArgs) -> Result<i32, BenchLensError> {
    write_config(Path::new(CONFIG_FILENAME), args.force)?;

    println!(
        "{} Created {}",
        "Success:".green().bold(),
        CONFIG_FILENAME.cyan()
    );

    println!("\nNext steps:");
    println!(
        "  1. Review the {} paths in {}",
        "[substitutions]".yellow(),
        CONFIG_FILENAME.cyan()
    );
    println!(
        "  2. Run {} to check your catalogs",
        "benchlens validate --catalog <PATH>".cyan()
    );
    println!(
        "  3. Run {} to audit this host",
        "benchlens run --catalog <PATH>".cyan()
    );

    Ok(exit_codes::SUCCESS)
}

/// Write the starter configuration to `path`
pub fn write_config(path: &Path, force: bool) -> Result<(), BenchLensError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists {
            path: path.display().to_string(),
        }
        .into());
    }

    let content = Config::starter().to_toml()?;
    fs::write(path, content).map_err(|e| {
        BenchLensError::Output(OutputError::FileWrite {
            path: path.display().to_string(),
            source: e,
        })
    })
}
