//! Coverage command handler

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use crate::CoverageArgs;
use covlog::{CoverageOutcome, CoveragePipeline, SkipReason};
use std::path::Path;
use tokio::sync::mpsc;

/// Execute the coverage command
pub fn execute_coverage(config: &CliConfig, args: &CoverageArgs) -> CliResult<CoverageOutcome> {
    let pipeline = CoveragePipeline::new(config.pipeline_for(&args.pipeline)?);
    let mut reporter = config.reporter();

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::runtime(format!("Failed to create tokio runtime: {e}")))?;
    rt.block_on(run_coverage(&mut reporter, pipeline, &args.raw_log))
}

/// Run a pipeline on a background task, mirroring its progress
pub async fn run_coverage(
    reporter: &mut ProgressReporter,
    pipeline: CoveragePipeline,
    raw_log: &Path,
) -> CliResult<CoverageOutcome> {
    reporter.header("Coverage report");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = pipeline.with_events(tx).spawn(raw_log.to_path_buf());
    while let Some(event) = rx.recv().await {
        reporter.pipeline_event(&event);
    }
    let result = handle
        .await
        .map_err(|e| CliError::runtime(format!("coverage task failed: {e}")));
    reporter.finish();

    let outcome = result??;
    print_outcome(reporter, &outcome);
    Ok(outcome)
}

fn print_outcome(reporter: &ProgressReporter, outcome: &CoverageOutcome) {
    for skipped in &outcome.skipped {
        let reason = match &skipped.reason {
            SkipReason::NoDestination => "no captured path carries this name".to_string(),
            SkipReason::MissingDirectory(dir) => format!("{} does not exist", dir.display()),
            SkipReason::Malformed(message) => message.clone(),
        };
        reporter.warning(&format!(
            "{} left at {}: {reason}",
            skipped.artifact.key,
            skipped.artifact.path.display()
        ));
    }

    for resolved in &outcome.resolved {
        reporter.detail(&resolved.counter_file.display().to_string());
    }
    for dataset in &outcome.captured {
        reporter.detail(&format!("captured {}", dataset.display()));
    }

    reporter.info(&format!(
        "module {}: {} counter files, {} directories captured",
        outcome.module_name,
        outcome.resolved.len(),
        outcome.captured.len()
    ));
    reporter.report_path("Coverage dataset", &outcome.dataset);
    if let Some(dir) = &outcome.html_dir {
        reporter.report_path("Coverage report", &dir.join("index.html"));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::commands::PipelineArgs;
    use covlog::{CovlogError, Lcov, PipelineConfig};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn pipeline_args(temp: &TempDir) -> PipelineArgs {
        PipelineArgs {
            output: Some(temp.path().join("out")),
            work_dir: Some(temp.path().join("work")),
            ..PipelineArgs::default()
        }
    }

    #[test]
    fn test_log_without_dumps() {
        let temp = TempDir::new().unwrap();
        let raw_log = temp.path().join("serial.log");
        std::fs::write(&raw_log, "boot\r\nidle\r\n").unwrap();

        let args = CoverageArgs {
            raw_log,
            pipeline: pipeline_args(&temp),
        };
        let config = CliConfig::new().with_verbosity(crate::config::Verbosity::Quiet);
        let err = execute_coverage(&config, &args).unwrap_err();
        assert!(matches!(err, CliError::Covlog(CovlogError::NoCoverageData { .. })));
    }

    #[test]
    fn test_missing_raw_log() {
        let temp = TempDir::new().unwrap();
        let args = CoverageArgs {
            raw_log: temp.path().join("missing.log"),
            pipeline: pipeline_args(&temp),
        };
        let config = CliConfig::new().with_verbosity(crate::config::Verbosity::Quiet);
        assert!(execute_coverage(&config, &args).is_err());
    }

    #[tokio::test]
    async fn test_unavailable_tool_is_reported() {
        let temp = TempDir::new().unwrap();
        let build_dir = temp.path().join("home/u/Application/Motor/CMakeFiles/motor.dir");
        std::fs::create_dir_all(&build_dir).unwrap();
        let raw_log = temp.path().join("serial.log");
        std::fs::write(
            &raw_log,
            format!(
                "Emitting\n00000000: 6164 6367  adcg\n{}\n",
                build_dir.join("Pwm.cpp.gcda").display()
            ),
        )
        .unwrap();

        let config = PipelineConfig::new()
            .with_search_root(format!("{}/home/", temp.path().display()))
            .with_work_dir(temp.path())
            .with_output_dir(temp.path());
        let tool = Lcov::new().with_programs("covlog-missing-lcov", "covlog-missing-genhtml");
        let pipeline = CoveragePipeline::new(config).with_tool(Arc::new(tool));

        let mut reporter = ProgressReporter::new(false, true);
        let err = run_coverage(&mut reporter, pipeline, &raw_log).await.unwrap_err();

        // Captures fail individually, leaving nothing to merge
        assert!(matches!(err, CliError::Covlog(CovlogError::NoCoverageData { .. })));
        assert_eq!(std::fs::read(build_dir.join("Pwm.cpp.gcda")).unwrap(), b"adcg");
    }
}
