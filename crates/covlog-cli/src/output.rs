//! Output formatting and progress reporting

use console::{style, Style, Term};
use covlog::{PipelineEvent, TestRun};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Progress reporter for report generation
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
    /// Print per-file and per-suite detail
    pub verbose: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
            verbose: false,
        }
    }

    /// Enable detail lines
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose && !self.quiet;
        self
    }

    /// Start a spinner for a stage of unknown length
    pub fn start_spinner(&mut self, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Start a progress bar for a known number of steps
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        if let Some(pb) = self.progress_bar.take() {
            pb.finish_and_clear();
        }
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Update progress message
    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    /// Finish and remove the progress bar
    pub fn finish(&mut self) {
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_and_clear();
        }
    }

    /// Reflect a pipeline event in the progress display
    pub fn pipeline_event(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StageStarted(stage) => {
                if self.progress_bar.is_none() {
                    self.start_spinner(stage.label());
                } else {
                    self.set_message(stage.label());
                }
            }
            PipelineEvent::CapturesPlanned { count } => {
                self.start_progress(*count as u64, "lcov --capture");
            }
            PipelineEvent::DirectoryCaptured { dir, produced } => {
                self.increment(1);
                if !produced {
                    self.set_message(&format!("no data from {}", dir.display()));
                }
            }
        }
    }

    fn line(&self, prefix: &str, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.suspend(|| {
                let _ = self.term.write_line(&format!("{prefix} {message}"));
            });
        } else {
            let _ = self.term.write_line(&format!("{prefix} {message}"));
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "OK".to_string()
        };
        self.line(&prefix, message);
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };
        self.line(&prefix, message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };
        self.line(&prefix, message);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };
        self.line(&prefix, message);
    }

    /// Print a detail line, only in verbose mode
    pub fn detail(&self, message: &str) {
        if !self.verbose {
            return;
        }

        let prefix = if self.use_color {
            style("·").dim().to_string()
        } else {
            "  ".to_string()
        };
        self.line(&prefix, message);
    }

    /// Print the location of a generated report
    pub fn report_path(&self, label: &str, path: &Path) {
        self.success(&format!("{label}: {}", path.display()));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Print test run totals
    pub fn run_summary(&self, run: &TestRun) {
        let failed = run.failed();
        if self.quiet && run.all_passed() {
            return;
        }

        let passed = run.passed();
        let pending = run.total_cases() - passed - failed;
        let suites = run.observed_suites();

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let pending_style = Style::new().yellow();

            let status = if run.all_passed() {
                passed_style.apply_to("PASSED")
            } else {
                failed_style.apply_to("FAILED")
            };

            let _ = self.term.write_line(&format!(
                "{} {} tests from {} suites ({} passed, {} failed, {} without outcome)",
                status,
                run.total_cases(),
                suites,
                passed_style.apply_to(passed),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
                pending_style.apply_to(pending)
            ));
        } else {
            let status = if run.all_passed() { "PASSED" } else { "FAILED" };
            let total = run.total_cases();
            let _ = self.term.write_line(&format!(
                "{status} {total} tests from {suites} suites ({passed} passed, {failed} failed, {pending} without outcome)"
            ));
        }

        for suite in &run.suites {
            self.detail(&format!(
                "{}: {}/{} passed, {} failed",
                suite.name,
                suite.passed(),
                suite.total(),
                suite.failed()
            ));
        }

        if run.counts_mismatch() {
            self.warning(&format!(
                "runner announced {} tests from {} suites",
                run.declared_tests, run.declared_suites
            ));
        }
    }
}
