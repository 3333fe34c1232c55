//! Coverage pipeline orchestration.
//!
//! ```text
//! raw log ─► sanitize ─► split ─► resolve ─► capture (xN) ─► merge ─► extract ─► genhtml
//! ```
//!
//! The file-bound stages (sanitize, split, resolve) run on the blocking pool;
//! the tool stages are async. A spawned pipeline reports completion through
//! its `JoinHandle` and progress through an optional event channel.

use crate::aggregate::{capture_targets, Aggregator};
use crate::config::{PipelineConfig, UNNAMED_MODULE};
use crate::resolver::{PathResolver, ResolvedCoverageFile, RoutingOutcome, SkippedArtifact};
use crate::result::{CovlogError, CovlogResult};
use crate::sanitize::sanitize_file;
use crate::splitter::split_file;
use crate::tool::{CoverageTool, Lcov};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    /// Stripping the raw capture
    Sanitize,
    /// Staging hex dumps
    Split,
    /// Decoding dumps into build directories
    Resolve,
    /// Per-directory capture
    Capture,
    /// Merge and subtree extraction
    Merge,
    /// genhtml rendering
    Html,
    /// Removing intermediates
    Cleanup,
}

impl PipelineStage {
    /// Short label for status output
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sanitize => "sanitize",
            Self::Split => "split",
            Self::Resolve => "resolve",
            Self::Capture => "capture",
            Self::Merge => "merge",
            Self::Html => "html",
            Self::Cleanup => "cleanup",
        }
    }
}

/// Progress notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// A stage began
    StageStarted(PipelineStage),
    /// Number of directories about to be captured
    CapturesPlanned {
        /// Directory count
        count: usize,
    },
    /// One directory capture finished
    DirectoryCaptured {
        /// Captured directory
        dir: PathBuf,
        /// Whether a dataset was produced
        produced: bool,
    },
}

/// What a pipeline run produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageOutcome {
    /// Module the capture belongs to
    pub module_name: String,
    /// Filtered dataset, `<output>/<module>_filtered.info`
    pub dataset: PathBuf,
    /// genhtml tree, when rendered
    pub html_dir: Option<PathBuf>,
    /// Per-directory datasets in merge order
    pub captured: Vec<PathBuf>,
    /// Counter files written back to the build tree
    pub resolved: Vec<ResolvedCoverageFile>,
    /// Artifacts left in the working directory
    pub skipped: Vec<SkippedArtifact>,
}

/// One coverage run over a raw capture
pub struct CoveragePipeline {
    config: PipelineConfig,
    tool: Arc<dyn CoverageTool>,
    events: Option<UnboundedSender<PipelineEvent>>,
}

impl std::fmt::Debug for CoveragePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoveragePipeline")
            .field("config", &self.config)
            .field("tool", &self.tool.name())
            .finish_non_exhaustive()
    }
}

impl CoveragePipeline {
    /// Create a pipeline driving lcov with the configured gcov tool
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            tool: Arc::new(lcov_for(&config)),
            config,
            events: None,
        }
    }

    /// Replace the coverage tool
    #[must_use]
    pub fn with_tool(mut self, tool: Arc<dyn CoverageTool>) -> Self {
        self.tool = tool;
        self
    }

    /// Send progress events to `events`
    #[must_use]
    pub fn with_events(mut self, events: UnboundedSender<PipelineEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Pipeline configuration
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline on a background task
    pub fn spawn(self, raw_log: PathBuf) -> JoinHandle<CovlogResult<CoverageOutcome>> {
        tokio::spawn(async move { self.run(&raw_log).await })
    }

    /// Run every stage over `raw_log`
    pub async fn run(&self, raw_log: &Path) -> CovlogResult<CoverageOutcome> {
        self.config.validate()?;
        for dir in [&self.config.work_dir, &self.config.output_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| CovlogError::file_io(dir, e))?;
        }

        let (sanitized, routing) = self.prepare(raw_log).await?;
        let module_name = routing.module_name.clone().unwrap_or_else(|| {
            warn!("no module name in captured paths, using '{UNNAMED_MODULE}'");
            UNNAMED_MODULE.to_string()
        });

        let mut aggregator = Aggregator::new(self.tool.clone(), &self.config.output_dir)
            .with_jobs(self.config.effective_jobs())
            .with_subtree_pattern(self.config.subtree_pattern())
            .with_keep_merged(self.config.keep_intermediates);
        if let Some(events) = &self.events {
            aggregator = aggregator.with_events(events.clone());
        }

        self.emit(PipelineEvent::StageStarted(PipelineStage::Capture));
        let targets = capture_targets(&routing);
        self.emit(PipelineEvent::CapturesPlanned {
            count: targets.len(),
        });
        let captured = aggregator.capture_all(&targets).await;

        self.emit(PipelineEvent::StageStarted(PipelineStage::Merge));
        let dataset = aggregator.merge_and_filter(&captured, &module_name).await?;

        let html_dir = if self.config.html {
            self.emit(PipelineEvent::StageStarted(PipelineStage::Html));
            let dir = self.config.reports_dir(&module_name).join("CoverageReport");
            aggregator.render(&dataset, &dir).await?;
            Some(dir)
        } else {
            None
        };

        if !self.config.keep_intermediates {
            self.emit(PipelineEvent::StageStarted(PipelineStage::Cleanup));
            remove_intermediate(&sanitized).await;
        }

        info!(
            module = %module_name,
            dataset = %dataset.display(),
            resolved = routing.resolved.len(),
            skipped = routing.skipped.len(),
            "coverage pipeline finished"
        );
        Ok(CoverageOutcome {
            module_name,
            dataset,
            html_dir,
            captured,
            resolved: routing.resolved,
            skipped: routing.skipped,
        })
    }

    /// Sanitize, split and resolve on the blocking pool
    async fn prepare(&self, raw_log: &Path) -> CovlogResult<(PathBuf, RoutingOutcome)> {
        let resolver = PathResolver::new(&self.config)?;
        let raw_log = raw_log.to_path_buf();
        let work_dir = self.config.work_dir.clone();
        let events = self.events.clone();
        let emit = move |stage| {
            if let Some(events) = &events {
                let _ = events.send(PipelineEvent::StageStarted(stage));
            }
        };

        tokio::task::spawn_blocking(move || {
            emit(PipelineStage::Sanitize);
            let sanitized = sanitize_file(&raw_log, &work_dir)?;

            emit(PipelineStage::Split);
            let artifacts = split_file(&sanitized, &work_dir)?;

            emit(PipelineStage::Resolve);
            let text = std::fs::read_to_string(&sanitized)
                .map_err(|e| CovlogError::file_io(&sanitized, e))?;
            let routing = resolver.resolve(&text, &artifacts)?;
            Ok((sanitized, routing))
        })
        .await
        .map_err(|e| CovlogError::Task {
            message: e.to_string(),
        })?
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

/// lcov driver honouring the configured gcov tool and branch accounting
fn lcov_for(config: &PipelineConfig) -> Lcov {
    Lcov::new()
        .with_gcov_tool(config.gcov_tool.clone())
        .with_branch_coverage(config.branch_coverage)
}

async fn remove_intermediate(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed intermediate"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove intermediate"),
    }
}
