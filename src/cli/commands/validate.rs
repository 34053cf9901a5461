//! Validate command - Load catalogs and look for definitions that cannot run

use colored::Colorize;
use regex::Regex;
use std::path::Path;

use super::{catalog_paths, load_options, ValidateArgs};
use crate::catalog::{self, Controls};
use crate::cli::exit_codes;
use crate::config::Config;
use crate::error::BenchLensError;
use crate::rules::check::Check;
use crate::rules::compare::CompareOp;
use crate::rules::jsonpath::JsonPath;
use crate::rules::test_set::BinOp;

pub fn execute(args: ValidateArgs, config_path: Option<&Path>) -> Result<i32, BenchLensError> {
    let config = Config::load(config_path)?;

    let paths = catalog_paths(&args.catalog, &config);
    if paths.is_empty() {
        eprintln!("{} No catalog given.", "Error:".red().bold());
        return Ok(exit_codes::INVALID_ARGS);
    }

    let catalogs = catalog::load_all(&paths, &load_options(args.target, &config))?;

    let mut problem_count = 0;
    for controls in &catalogs {
        let location = controls
            .source
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!(
            "{} {} {} ({}): {} groups, {} checks",
            location.dimmed(),
            controls.id.cyan(),
            controls.text,
            controls.node_type.yellow(),
            controls.groups.len(),
            controls.check_count()
        );

        for problem in lint(controls) {
            println!("  {} {}", "•".red(), problem);
            problem_count += 1;
        }
    }

    if problem_count > 0 {
        println!(
            "\n{} {} problem(s) found",
            "Error:".red().bold(),
            problem_count
        );
        Ok(exit_codes::FAILED_CHECKS)
    } else {
        println!("\n{} Catalogs are valid", "Success:".green().bold());
        Ok(exit_codes::SUCCESS)
    }
}

/// Definitions that would make a check fail for reasons unrelated to the host
pub fn lint(controls: &Controls) -> Vec<String> {
    controls
        .groups
        .iter()
        .flat_map(|g| g.checks.iter())
        .flat_map(lint_check)
        .collect()
}

fn lint_check(check: &Check) -> Vec<String> {
    let mut problems = Vec::new();
    let Some(tests) = &check.tests else {
        return problems;
    };

    if let BinOp::Unrecognized(op) = &tests.bin_op {
        problems.push(format!("{}: unknown binary operator '{}'", check.id, op));
    }

    for item in &tests.test_items {
        if item.flag.is_empty() && item.path.is_empty() && item.env.is_empty() {
            problems.push(format!("{}: test item without flag, path or env", check.id));
        }

        if !item.path.is_empty() {
            if let Err(e) = JsonPath::parse(&item.path) {
                problems.push(format!("{}: {}", check.id, e));
            }
        }

        if let Some(compare) = &item.compare {
            match &compare.op {
                CompareOp::Unrecognized(op) => {
                    problems.push(format!("{}: unknown compare operator '{}'", check.id, op));
                }
                CompareOp::Regex => {
                    if let Err(e) = Regex::new(&compare.value) {
                        problems.push(format!("{}: invalid regex: {}", check.id, e));
                    }
                }
                _ => {}
            }
        }
    }

    problems
}
