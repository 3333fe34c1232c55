//! Pipeline configuration
//!
//! Defaults match the layout of a CMake-built embedded application tree:
//! counter files live under `/home/<user>/.../Application/<module>/CMakeFiles/...`.

use crate::result::{CovlogError, CovlogResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Module name used when no captured path or banner names one
pub const UNNAMED_MODULE: &str = "Unnamed";

/// Configuration shared by the coverage pipeline and the transcript parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Absolute prefix every captured counter path starts with
    pub search_root: String,
    /// Directory segment marking the application root inside a path
    pub project_segment: String,
    /// Directory segment where build artifacts begin
    pub build_segment: String,
    /// Scratch directory for sanitized logs and staged `.xxd` artifacts
    pub work_dir: PathBuf,
    /// Directory receiving datasets and the `Reports/` tree
    pub output_dir: PathBuf,
    /// Concurrent capture jobs (0 = auto-detect)
    pub jobs: usize,
    /// gcov executable handed to lcov
    pub gcov_tool: String,
    /// Branch coverage accounting in lcov and genhtml
    pub branch_coverage: bool,
    /// Render the genhtml tree after filtering
    pub html: bool,
    /// Keep the sanitized log and merged dataset for inspection
    pub keep_intermediates: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            search_root: "/home/".to_string(),
            project_segment: "Application/".to_string(),
            build_segment: "CMakeFiles".to_string(),
            work_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            jobs: 0,
            gcov_tool: "gcov".to_string(),
            branch_coverage: true,
            html: true,
            keep_intermediates: false,
        }
    }
}

impl PipelineConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a YAML file; missing keys keep their defaults
    pub fn load(path: &Path) -> CovlogResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| CovlogError::file_io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> CovlogResult<Self> {
        let config: Self = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> CovlogResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> CovlogResult<()> {
        if !self.search_root.starts_with('/') {
            return Err(CovlogError::config(format!(
                "search_root must be absolute, got '{}'",
                self.search_root
            )));
        }
        if self.project_segment.trim_matches('/').is_empty() {
            return Err(CovlogError::config("project_segment must not be empty"));
        }
        if self.build_segment.is_empty() {
            return Err(CovlogError::config("build_segment must not be empty"));
        }
        Ok(())
    }

    /// Set the path prefix counter files are searched under
    #[must_use]
    pub fn with_search_root(mut self, root: impl Into<String>) -> Self {
        self.search_root = root.into();
        self
    }

    /// Set the application root segment
    #[must_use]
    pub fn with_project_segment(mut self, segment: impl Into<String>) -> Self {
        self.project_segment = segment.into();
        self
    }

    /// Set the scratch directory
    #[must_use]
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// Set the output directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set capture concurrency
    #[must_use]
    pub const fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Set the gcov executable
    #[must_use]
    pub fn with_gcov_tool(mut self, tool: impl Into<String>) -> Self {
        self.gcov_tool = tool.into();
        self
    }

    /// Enable or disable branch coverage
    #[must_use]
    pub const fn with_branch_coverage(mut self, enabled: bool) -> Self {
        self.branch_coverage = enabled;
        self
    }

    /// Enable or disable HTML rendering
    #[must_use]
    pub const fn with_html(mut self, html: bool) -> Self {
        self.html = html;
        self
    }

    /// Keep intermediate files
    #[must_use]
    pub const fn with_keep_intermediates(mut self, keep: bool) -> Self {
        self.keep_intermediates = keep;
        self
    }

    /// Project segment without surrounding slashes, e.g. `Application`
    #[must_use]
    pub fn project_name(&self) -> &str {
        self.project_segment.trim_matches('/')
    }

    /// lcov extract pattern selecting the application subtree
    #[must_use]
    pub fn subtree_pattern(&self) -> String {
        format!("*/{}/*", self.project_name())
    }

    /// Get effective number of capture jobs
    #[must_use]
    pub fn effective_jobs(&self) -> usize {
        if self.jobs == 0 {
            std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(1)
        } else {
            self.jobs
        }
    }

    /// Root of the per-module report tree
    #[must_use]
    pub fn reports_dir(&self, module: &str) -> PathBuf {
        self.output_dir.join("Reports").join(module)
    }
}
