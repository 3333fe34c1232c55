//! External coverage tool contract.
//!
//! The pipeline never looks inside a dataset. It needs four operations from
//! whatever tool owns the dataset format:
//!
//! | operation     | lcov invocation                                   |
//! |---------------|---------------------------------------------------|
//! | `capture`     | `lcov --capture --directory DIR --output-file OUT`|
//! | `merge`       | `lcov -a A -a B ... --output-file OUT`            |
//! | `extract`     | `lcov --extract IN PATTERN --output-file OUT`     |
//! | `render_html` | `genhtml IN --output-directory DIR`               |

use crate::result::{CovlogError, CovlogResult};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Four-operation contract of a coverage aggregation tool
#[async_trait]
pub trait CoverageTool: Send + Sync {
    /// Tool name for diagnostics
    fn name(&self) -> &str;

    /// Collect counter files under `dir` into a dataset at `output`
    async fn capture(&self, dir: &Path, output: &Path) -> CovlogResult<()>;

    /// Combine datasets into one
    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> CovlogResult<()>;

    /// Keep only records whose source path matches `pattern`
    async fn extract(&self, input: &Path, pattern: &str, output: &Path) -> CovlogResult<()>;

    /// Render a dataset as an HTML tree
    async fn render_html(&self, input: &Path, output_dir: &Path) -> CovlogResult<()>;
}

/// lcov/genhtml driver
#[derive(Debug, Clone)]
pub struct Lcov {
    lcov: String,
    genhtml: String,
    gcov_tool: String,
    branch_coverage: bool,
}

impl Default for Lcov {
    fn default() -> Self {
        Self {
            lcov: "lcov".to_string(),
            genhtml: "genhtml".to_string(),
            gcov_tool: "gcov".to_string(),
            branch_coverage: true,
        }
    }
}

impl Lcov {
    /// Create a driver using `lcov` and `genhtml` from `PATH`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific gcov (e.g. a cross toolchain's `arm-none-eabi-gcov`)
    #[must_use]
    pub fn with_gcov_tool(mut self, tool: impl Into<String>) -> Self {
        self.gcov_tool = tool.into();
        self
    }

    /// Override the lcov and genhtml executables
    #[must_use]
    pub fn with_programs(mut self, lcov: impl Into<String>, genhtml: impl Into<String>) -> Self {
        self.lcov = lcov.into();
        self.genhtml = genhtml.into();
        self
    }

    /// Toggle branch coverage accounting
    #[must_use]
    pub const fn with_branch_coverage(mut self, enabled: bool) -> Self {
        self.branch_coverage = enabled;
        self
    }

    fn lcov_rc(&self, args: &mut Vec<OsString>) {
        if self.branch_coverage {
            args.push("--rc".into());
            args.push("lcov_branch_coverage=1".into());
        }
    }

    /// Arguments for `capture`
    #[must_use]
    pub fn capture_args(&self, dir: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--gcov-tool".into(),
            self.gcov_tool.clone().into(),
            "--capture".into(),
        ];
        self.lcov_rc(&mut args);
        args.push("--directory".into());
        args.push(dir.into());
        args.push("--output-file".into());
        args.push(output.into());
        args
    }

    /// Arguments for `merge`
    #[must_use]
    pub fn merge_args(&self, inputs: &[PathBuf], output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::with_capacity(inputs.len() * 2 + 4);
        for input in inputs {
            args.push("-a".into());
            args.push(input.into());
        }
        args.push("--output-file".into());
        args.push(output.into());
        self.lcov_rc(&mut args);
        args
    }

    /// Arguments for `extract`
    #[must_use]
    pub fn extract_args(&self, input: &Path, pattern: &str, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--extract".into(),
            input.into(),
            pattern.into(),
            "--output-file".into(),
            output.into(),
        ];
        self.lcov_rc(&mut args);
        args
    }

    /// Arguments for `render_html`
    #[must_use]
    pub fn html_args(&self, input: &Path, output_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            input.into(),
            "--output-directory".into(),
            output_dir.into(),
        ];
        if self.branch_coverage {
            args.push("--rc".into());
            args.push("genhtml_branch_coverage=1".into());
        }
        args
    }
}

/// Run a program to completion, failing on non-zero exit
pub async fn run_tool(program: &str, args: &[OsString]) -> CovlogResult<()> {
    debug!(program, args = ?args, "spawning");

    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| CovlogError::ToolNotFound {
            tool: program.to_string(),
            message: e.to_string(),
        })?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(CovlogError::ToolFailed {
            tool: program.to_string(),
            status: output.status.to_string(),
            stderr: last_lines(&stderr, 5),
        })
    }
}

/// Keep the tail of noisy tool output
fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    lines[lines.len().saturating_sub(count)..].join("\n")
}

#[async_trait]
impl CoverageTool for Lcov {
    fn name(&self) -> &str {
        &self.lcov
    }

    async fn capture(&self, dir: &Path, output: &Path) -> CovlogResult<()> {
        run_tool(&self.lcov, &self.capture_args(dir, output)).await
    }

    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> CovlogResult<()> {
        run_tool(&self.lcov, &self.merge_args(inputs, output)).await
    }

    async fn extract(&self, input: &Path, pattern: &str, output: &Path) -> CovlogResult<()> {
        run_tool(&self.lcov, &self.extract_args(input, pattern, output)).await
    }

    async fn render_html(&self, input: &Path, output_dir: &Path) -> CovlogResult<()> {
        run_tool(&self.genhtml, &self.html_args(input, output_dir)).await
    }
}
