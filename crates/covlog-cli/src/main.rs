//! covlog: test and coverage reports from embedded target logs
//!
//! ## Usage
//!
//! ```bash
//! covlog test-report gtest.log -o build/        # HTML test report
//! covlog coverage serial.log -o build/ -j 8     # lcov dataset + genhtml tree
//! covlog report --transcript gtest.log --raw-log serial.log
//! ```

use clap::Parser;
use covlog_cli::{
    handlers::{execute_config, execute_coverage, execute_report, execute_test_report},
    logging::init_logging,
    Cli, CliConfig, CliResult, ColorChoice, Commands, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    // Build configuration from CLI args
    let config = build_config(&cli)?;
    init_logging(config.verbosity);
    tracing::debug!(config = ?cli.config, jobs = config.pipeline.effective_jobs(), "configuration loaded");

    match cli.command {
        Commands::TestReport(args) => execute_test_report(&config, &args).map(|_| ()),
        Commands::Coverage(args) => execute_coverage(&config, &args).map(|_| ()),
        Commands::Report(args) => execute_report(&config, &args).map(|_| ()),
        Commands::Config(args) => execute_config(&config, &args),
    }
}

fn build_config(cli: &Cli) -> CliResult<CliConfig> {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    let color: ColorChoice = cli.color.clone().into();

    let config = CliConfig::new().with_verbosity(verbosity).with_color(color);
    match &cli.config {
        Some(path) => config.with_pipeline_file(path),
        None => Ok(config),
    }
}
