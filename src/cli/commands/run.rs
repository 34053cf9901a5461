//! Run command - Evaluate benchmark checks and report the results

use colored::Colorize;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::{catalog_paths, load_options, OutputFormat, RunArgs};
use crate::catalog;
use crate::cli::exit_codes;
use crate::cli::output::{JsonOutput, ReportOptions, ReportRenderer, TerminalOutput};
use crate::config::Config;
use crate::error::{BenchLensError, OutputError};
use crate::rules::engine::{RulesEngine, RunFilter};
use crate::rules::results::AuditResults;
use crate::utils::command::ShellProbe;

pub fn execute(args: RunArgs, config_path: Option<&Path>) -> Result<i32, BenchLensError> {
    let config = Config::load(config_path)?;

    let paths = catalog_paths(&args.catalog, &config);
    if paths.is_empty() {
        eprintln!(
            "{} No catalog given. Use --catalog or set run.catalogs in the configuration.",
            "Error:".red().bold()
        );
        return Ok(exit_codes::INVALID_ARGS);
    }

    let filter = match RunFilter::new(
        args.group.clone(),
        args.check.clone(),
        args.only_scored,
        args.only_unscored,
    ) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            return Ok(exit_codes::INVALID_ARGS);
        }
    };

    let catalogs = catalog::load_all(&paths, &load_options(args.target.clone(), &config))?;
    debug!(controls = catalogs.len(), "Catalogs loaded");

    let probe = ShellProbe::new(&config.probe.shell);
    let mut engine = RulesEngine::new(&probe);
    engine.set_filter(filter);
    engine.set_skip_ids(config.run.skip.iter().chain(args.skip.iter()));

    let results = engine.run(&catalogs);

    let options = ReportOptions {
        include_test_output: args.include_test_output,
        no_remediations: args.no_remediations,
        no_summary: args.no_summary,
        no_totals: args.no_totals,
    };
    let renderer: Box<dyn ReportRenderer> = match args.format {
        OutputFormat::Terminal => Box::new(TerminalOutput::new(options)),
        OutputFormat::Json => Box::new(JsonOutput::new(options)),
    };
    let report = renderer.render_report(&results)?;

    match &args.output {
        Some(path) => {
            fs::write(path, &report).map_err(|e| {
                BenchLensError::Output(OutputError::FileWrite {
                    path: path.display().to_string(),
                    source: e,
                })
            })?;
            eprintln!(
                "{} Report written to: {}",
                "Success:".green().bold(),
                path.display().to_string().cyan()
            );
        }
        None => print!("{}", report),
    }

    Ok(exit_code(&results, args.fail_on_warn))
}

fn exit_code(results: &AuditResults, fail_on_warn: bool) -> i32 {
    if results.has_failures() {
        exit_codes::FAILED_CHECKS
    } else if fail_on_warn && results.has_warnings() {
        exit_codes::WARNINGS
    } else {
        exit_codes::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::results::Summary;

    fn results(summary: Summary) -> AuditResults {
        AuditResults {
            totals: summary,
            ..AuditResults::default()
        }
    }

    #[test]
    fn test_exit_code() {
        let clean = results(Summary {
            pass: 3,
            info: 1,
            ..Summary::default()
        });
        assert_eq!(exit_code(&clean, true), exit_codes::SUCCESS);

        let warned = results(Summary {
            pass: 3,
            warn: 1,
            ..Summary::default()
        });
        assert_eq!(exit_code(&warned, false), exit_codes::SUCCESS);
        assert_eq!(exit_code(&warned, true), exit_codes::WARNINGS);

        let failed = results(Summary {
            fail: 1,
            warn: 1,
            ..Summary::default()
        });
        assert_eq!(exit_code(&failed, true), exit_codes::FAILED_CHECKS);
    }
}
