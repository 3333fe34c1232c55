//! Coverage aggregator driver.
//!
//! One capture per destination directory, then a single merge and a
//! subtree extraction. Captures are independent and run concurrently; the
//! merge input keeps directory order no matter which capture finishes first.

use crate::pipeline::PipelineEvent;
use crate::resolver::RoutingOutcome;
use crate::result::{CovlogError, CovlogResult};
use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::tool::CoverageTool;

/// Dataset file extension
pub const DATASET_EXTENSION: &str = "info";

/// One directory to capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureTarget {
    /// Directory holding the decoded counter files
    pub dir: PathBuf,
    /// Where the per-directory dataset is written
    pub dataset: PathBuf,
}

/// Group resolved counter files into one capture per directory
///
/// The dataset is named after the first translation unit routed into the
/// directory.
#[must_use]
pub fn capture_targets(outcome: &RoutingOutcome) -> Vec<CaptureTarget> {
    let mut by_dir: IndexMap<&Path, &str> = IndexMap::new();
    for resolved in &outcome.resolved {
        by_dir
            .entry(resolved.dir.as_path())
            .or_insert_with(|| resolved.unit_stem());
    }

    by_dir
        .into_iter()
        .map(|(dir, stem)| CaptureTarget {
            dir: dir.to_path_buf(),
            dataset: dir.join(format!("{stem}.{DATASET_EXTENSION}")),
        })
        .collect()
}

/// Drives a [`CoverageTool`] over a set of directories
pub struct Aggregator {
    tool: Arc<dyn CoverageTool>,
    jobs: usize,
    output_dir: PathBuf,
    subtree_pattern: String,
    keep_merged: bool,
    events: Option<UnboundedSender<PipelineEvent>>,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("tool", &self.tool.name())
            .field("jobs", &self.jobs)
            .field("output_dir", &self.output_dir)
            .field("subtree_pattern", &self.subtree_pattern)
            .finish_non_exhaustive()
    }
}

impl Aggregator {
    /// Create an aggregator writing merged datasets to `output_dir`
    #[must_use]
    pub fn new(tool: Arc<dyn CoverageTool>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            jobs: 1,
            output_dir: output_dir.into(),
            subtree_pattern: "*/Application/*".to_string(),
            keep_merged: false,
            events: None,
        }
    }

    /// Maximum captures in flight
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Pattern handed to the extract step
    #[must_use]
    pub fn with_subtree_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.subtree_pattern = pattern.into();
        self
    }

    /// Keep the unfiltered merge after extraction
    #[must_use]
    pub const fn with_keep_merged(mut self, keep: bool) -> Self {
        self.keep_merged = keep;
        self
    }

    /// Report each finished capture on `events`
    #[must_use]
    pub fn with_events(mut self, events: UnboundedSender<PipelineEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Capture every target, returning the datasets that were produced in
    /// target order
    ///
    /// A failed capture, or one that writes no dataset, is logged and left
    /// out.
    pub async fn capture_all(&self, targets: &[CaptureTarget]) -> Vec<PathBuf> {
        let captures: Vec<_> = targets.iter().map(|t| self.capture_one(t)).collect();
        let produced: Vec<Option<PathBuf>> = stream::iter(captures)
            .buffered(self.jobs)
            .collect()
            .await;

        let datasets: Vec<PathBuf> = produced.into_iter().flatten().collect();
        info!(
            directories = targets.len(),
            datasets = datasets.len(),
            "per-directory capture finished"
        );
        datasets
    }

    async fn capture_one(&self, target: &CaptureTarget) -> Option<PathBuf> {
        let result = self.tool.capture(&target.dir, &target.dataset).await;
        let produced = match result {
            Ok(()) if is_file(&target.dataset).await => Some(target.dataset.clone()),
            Ok(()) => {
                warn!(dir = %target.dir.display(), "capture produced no dataset");
                None
            }
            Err(e) => {
                warn!(dir = %target.dir.display(), error = %e, "capture failed, no coverage for directory");
                None
            }
        };

        if let Some(events) = &self.events {
            let _ = events.send(PipelineEvent::DirectoryCaptured {
                dir: target.dir.clone(),
                produced: produced.is_some(),
            });
        }
        produced
    }

    /// Merge datasets and extract the application subtree
    ///
    /// Returns the filtered dataset. Either tool step failing aborts.
    pub async fn merge_and_filter(&self, datasets: &[PathBuf], module: &str) -> CovlogResult<PathBuf> {
        if datasets.is_empty() {
            return Err(CovlogError::NoCoverageData {
                message: "no directory produced a dataset".to_string(),
            });
        }
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| CovlogError::file_io(&self.output_dir, e))?;

        let merged = self.output_dir.join(format!("{module}_merged.{DATASET_EXTENSION}"));
        self.tool.merge(datasets, &merged).await?;
        info!(inputs = datasets.len(), output = %merged.display(), "merged datasets");

        let filtered = self.output_dir.join(format!("{module}_filtered.{DATASET_EXTENSION}"));
        self.tool
            .extract(&merged, &self.subtree_pattern, &filtered)
            .await?;
        info!(pattern = %self.subtree_pattern, output = %filtered.display(), "extracted subtree");

        if !self.keep_merged {
            tokio::fs::remove_file(&merged)
                .await
                .map_err(|e| CovlogError::file_io(&merged, e))?;
        }
        Ok(filtered)
    }

    /// Render a dataset as HTML into `html_dir`
    pub async fn render(&self, dataset: &Path, html_dir: &Path) -> CovlogResult<()> {
        tokio::fs::create_dir_all(html_dir)
            .await
            .map_err(|e| CovlogError::file_io(html_dir, e))?;
        self.tool.render_html(dataset, html_dir).await?;
        info!(dir = %html_dir.display(), "rendered coverage html");
        Ok(())
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file())
}
