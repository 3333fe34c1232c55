//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// covlog: test and coverage reports from embedded target logs
#[derive(Parser, Debug)]
#[command(name = "covlog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Pipeline configuration file (YAML)
    #[arg(long, global = true, env = "COVLOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a test report from a GoogleTest transcript
    TestReport(TestReportArgs),

    /// Build a coverage report from a raw serial capture
    Coverage(CoverageArgs),

    /// Build coverage and test reports in one go (coverage first)
    Report(ReportArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Arguments for the test-report command
#[derive(Parser, Debug)]
pub struct TestReportArgs {
    /// GoogleTest console transcript
    pub transcript: PathBuf,

    /// Output directory (receives Reports/<module>/TestReport)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value = "html")]
    pub format: ReportFormatArg,
}

/// Arguments for the coverage command
#[derive(Parser, Debug)]
pub struct CoverageArgs {
    /// Raw serial capture containing hex-dumped .gcda files
    pub raw_log: PathBuf,

    /// Coverage pipeline overrides
    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Coverage pipeline overrides shared by `coverage` and `report`
#[derive(Parser, Debug, Default)]
pub struct PipelineArgs {
    /// Output directory for datasets and Reports/
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Scratch directory for sanitized logs and staged dumps
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Path prefix captured counter files live under (e.g. /home/)
    #[arg(long)]
    pub app_root: Option<String>,

    /// Concurrent lcov captures (0 = auto-detect)
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Skip genhtml rendering
    #[arg(long)]
    pub no_html: bool,

    /// gcov executable handed to lcov
    #[arg(long)]
    pub gcov_tool: Option<String>,

    /// Keep the sanitized log and merged dataset
    #[arg(long)]
    pub keep_intermediates: bool,
}

/// Arguments for the report command
#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// GoogleTest console transcript
    #[arg(long)]
    pub transcript: Option<PathBuf>,

    /// Raw serial capture
    #[arg(long)]
    pub raw_log: Option<PathBuf>,

    /// Request the coverage report
    #[arg(long)]
    pub coverage: bool,

    /// Request the test report
    #[arg(long)]
    pub test: bool,

    /// Test report format
    #[arg(long, value_enum, default_value = "html")]
    pub format: ReportFormatArg,

    /// Coverage pipeline overrides
    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

impl ReportArgs {
    /// Whether the coverage report is wanted
    ///
    /// Without `--coverage`/`--test`, every report with an input is built.
    #[must_use]
    pub const fn wants_coverage(&self) -> bool {
        self.coverage || (!self.test && self.raw_log.is_some())
    }

    /// Whether the test report is wanted
    #[must_use]
    pub const fn wants_test(&self) -> bool {
        self.test || (!self.coverage && self.transcript.is_some())
    }
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Show the effective configuration
    #[arg(long)]
    pub show: bool,

    /// Show the built-in defaults
    #[arg(long)]
    pub defaults: bool,
}

/// Test report format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportFormatArg {
    /// Linked HTML pages
    #[default]
    Html,
    /// JUnit XML
    Junit,
    /// JSON
    Json,
}

impl From<ReportFormatArg> for covlog::ReportFormat {
    fn from(arg: ReportFormatArg) -> Self {
        match arg {
            ReportFormatArg::Html => Self::Html,
            ReportFormatArg::Junit => Self::Junit,
            ReportFormatArg::Json => Self::Json,
        }
    }
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_test_report() {
            let cli = Cli::parse_from(["covlog", "test-report", "gtest.log", "--format", "junit"]);
            assert!(matches!(
                cli.command,
                Commands::TestReport(ref args)
                    if args.transcript == PathBuf::from("gtest.log") && args.format == ReportFormatArg::Junit
            ));
        }

        #[test]
        fn test_parse_coverage() {
            let cli = Cli::parse_from([
                "covlog", "coverage", "serial.log", "-j", "4", "--no-html", "--gcov-tool", "arm-none-eabi-gcov",
            ]);
            assert!(matches!(
                cli.command,
                Commands::Coverage(ref args)
                    if args.pipeline.jobs == Some(4)
                        && args.pipeline.no_html
                        && args.pipeline.gcov_tool.as_deref() == Some("arm-none-eabi-gcov")
            ));
        }

        #[test]
        fn test_parse_global_flags() {
            let cli = Cli::parse_from(["covlog", "-vv", "--color", "never", "config", "--show"]);
            assert_eq!(cli.verbose, 2);
            assert!(matches!(cli.color, ColorArg::Never));
            assert!(matches!(cli.command, Commands::Config(ref args) if args.show));
        }

        #[test]
        fn test_parse_config_file_flag() {
            let cli = Cli::parse_from(["covlog", "--config", "covlog.yaml", "config"]);
            assert_eq!(cli.config, Some(PathBuf::from("covlog.yaml")));
        }

        #[test]
        fn test_coverage_requires_log() {
            assert!(Cli::try_parse_from(["covlog", "coverage"]).is_err());
        }
    }

    mod report_args_tests {
        use super::*;

        fn report(args: &[&str]) -> ReportArgs {
            let mut argv = vec!["covlog", "report"];
            argv.extend_from_slice(args);
            if let Commands::Report(args) = Cli::parse_from(argv).command {
                args
            } else {
                panic!("expected Report command");
            }
        }

        #[test]
        fn test_inputs_imply_requests() {
            let args = report(&["--transcript", "t.log", "--raw-log", "r.log"]);
            assert!(args.wants_coverage());
            assert!(args.wants_test());
        }

        #[test]
        fn test_explicit_request_limits_reports() {
            let args = report(&["--transcript", "t.log", "--raw-log", "r.log", "--test"]);
            assert!(!args.wants_coverage());
            assert!(args.wants_test());
        }

        #[test]
        fn test_explicit_request_without_input() {
            let args = report(&["--coverage"]);
            assert!(args.wants_coverage());
            assert!(args.raw_log.is_none());
        }
    }

    #[test]
    fn test_format_conversion() {
        assert_eq!(covlog::ReportFormat::from(ReportFormatArg::Json), covlog::ReportFormat::Json);
    }
}
