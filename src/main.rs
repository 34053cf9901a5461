//! benchlens - Audit hosts against security benchmark catalogs
//!
//! This is the main entry point for the CLI application.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use benchlens::cli::{self, exit_codes, Cli, Commands};

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    let config = cli.config.as_deref();

    // Execute the appropriate command
    let result = match cli.command {
        Commands::Run(args) => cli::commands::run::execute(args, config),
        Commands::Validate(args) => cli::commands::validate::execute(args, config),
        Commands::Init(args) => cli::commands::init::execute(args),
        Commands::GenerateMan(args) => cli::commands::generate_man::execute(args),
    };

    // Handle exit codes for CI integration
    match result {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(exit_codes::ERROR);
        }
    }
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}
