//! Report command handler
//!
//! The combined request: coverage first, then the test report. A failed
//! coverage run does not prevent the test report; the command still fails
//! afterwards.

use super::coverage::run_coverage;
use super::test_report::{generate_test_report, TestReportOutput};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::ReportArgs;
use covlog::{CoverageOutcome, CoveragePipeline};
use std::path::PathBuf;

/// What the combined request produced
#[derive(Debug, Default)]
pub struct ReportOutput {
    /// Coverage run, when requested
    pub coverage: Option<CoverageOutcome>,
    /// Test report, when requested
    pub test: Option<TestReportOutput>,
}

/// Inputs of a validated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPlan {
    /// Raw capture, when coverage is wanted
    pub raw_log: Option<PathBuf>,
    /// Transcript, when the test report is wanted
    pub transcript: Option<PathBuf>,
}

/// Check that every requested report has its input
pub fn plan_reports(args: &ReportArgs) -> CliResult<ReportPlan> {
    let wants_coverage = args.wants_coverage();
    let wants_test = args.wants_test();
    if !wants_coverage && !wants_test {
        return Err(CliError::invalid_argument(
            "nothing to report, pass --raw-log and/or --transcript",
        ));
    }

    let raw_log = if wants_coverage {
        Some(
            args.raw_log
                .clone()
                .ok_or_else(|| CliError::invalid_argument("coverage report requested without --raw-log"))?,
        )
    } else {
        None
    };
    let transcript = if wants_test {
        Some(
            args.transcript
                .clone()
                .ok_or_else(|| CliError::invalid_argument("test report requested without --transcript"))?,
        )
    } else {
        None
    };

    Ok(ReportPlan { raw_log, transcript })
}

/// Execute the report command
pub fn execute_report(config: &CliConfig, args: &ReportArgs) -> CliResult<ReportOutput> {
    let plan = plan_reports(args)?;
    let pipeline = config.pipeline_for(&args.pipeline)?;
    let mut reporter = config.reporter();
    let mut output = ReportOutput::default();

    let coverage_result = match &plan.raw_log {
        Some(raw_log) => {
            let rt = tokio::runtime::Runtime::new()
                .map_err(|e| CliError::runtime(format!("Failed to create tokio runtime: {e}")))?;
            rt.block_on(run_coverage(
                &mut reporter,
                CoveragePipeline::new(pipeline.clone()),
                raw_log,
            ))
            .map(Some)
        }
        None => Ok(None),
    };
    let coverage_error = match coverage_result {
        Ok(coverage) => {
            output.coverage = coverage;
            None
        }
        Err(e) => {
            reporter.failure(&format!("coverage report failed: {e}"));
            Some(e)
        }
    };

    if let Some(transcript) = &plan.transcript {
        output.test = Some(generate_test_report(
            &reporter,
            &pipeline,
            transcript,
            args.format.into(),
        )?);
    }

    match coverage_error {
        Some(e) => Err(e),
        None => Ok(output),
    }
}
