//! covlog CLI library
//!
//! Command-line front end for the covlog report pipeline: argument
//! definitions, configuration, progress output and one handler per command.

#![warn(missing_docs)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, CoverageArgs, PipelineArgs, ReportArgs, ReportFormatArg,
    TestReportArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
