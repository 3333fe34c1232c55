//! CLI configuration

use crate::commands::PipelineArgs;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use covlog::{CovlogError, PipelineConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - minimal output
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// Map `-q` and the `-v` count to a level
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Check if debug mode
    #[must_use]
    pub const fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stderr().features().colors_supported(),
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Pipeline settings from the config file, before per-command overrides
    pub pipeline: PipelineConfig,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set pipeline settings
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Load pipeline settings from a YAML file
    pub fn with_pipeline_file(self, path: &Path) -> CliResult<Self> {
        let pipeline = PipelineConfig::load(path).map_err(|e| {
            let reason = match e {
                CovlogError::Config { message } => message,
                other => other.to_string(),
            };
            CliError::config(format!("{}: {reason}", path.display()))
        })?;
        Ok(self.with_pipeline(pipeline))
    }

    /// Pipeline settings with command-line overrides applied
    pub fn pipeline_for(&self, args: &PipelineArgs) -> CliResult<PipelineConfig> {
        let mut pipeline = self.pipeline.clone();
        if let Some(output) = &args.output {
            pipeline = pipeline.with_output_dir(output);
        }
        if let Some(work_dir) = &args.work_dir {
            pipeline = pipeline.with_work_dir(work_dir);
        }
        if let Some(root) = &args.app_root {
            pipeline = pipeline.with_search_root(normalize_root(root));
        }
        if let Some(jobs) = args.jobs {
            pipeline = pipeline.with_jobs(jobs);
        }
        if let Some(tool) = &args.gcov_tool {
            pipeline = pipeline.with_gcov_tool(tool);
        }
        if args.no_html {
            pipeline = pipeline.with_html(false);
        }
        if args.keep_intermediates {
            pipeline = pipeline.with_keep_intermediates(true);
        }
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Should use colors
    #[must_use]
    pub fn use_color(&self) -> bool {
        self.color.should_color()
    }

    /// Reporter matching the color and verbosity settings
    #[must_use]
    pub fn reporter(&self) -> ProgressReporter {
        ProgressReporter::new(self.use_color(), self.verbosity.is_quiet())
            .with_verbose(self.verbosity.is_verbose())
    }
}

/// Search roots are prefixes of directory paths; `/home` means `/home/`
fn normalize_root(root: &str) -> String {
    if root.ends_with('/') {
        root.to_string()
    } else {
        format!("{root}/")
    }
}
