//! Test report command handler

use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::ProgressReporter;
use crate::TestReportArgs;
use covlog::{parse_transcript_file, write_test_report, PipelineConfig, ReportFormat, TestRun, UNNAMED_MODULE};
use std::path::{Path, PathBuf};

/// A rendered test report
#[derive(Debug, Clone)]
pub struct TestReportOutput {
    /// Parsed run
    pub run: TestRun,
    /// Written files, entry point first
    pub files: Vec<PathBuf>,
}

/// Execute the test-report command
pub fn execute_test_report(config: &CliConfig, args: &TestReportArgs) -> CliResult<TestReportOutput> {
    let mut pipeline = config.pipeline.clone();
    if let Some(output) = &args.output {
        pipeline = pipeline.with_output_dir(output);
    }

    let reporter = config.reporter();
    generate_test_report(&reporter, &pipeline, &args.transcript, args.format.into())
}

/// Parse `transcript` and write its report under the module's report root
pub fn generate_test_report(
    reporter: &ProgressReporter,
    pipeline: &PipelineConfig,
    transcript: &Path,
    format: ReportFormat,
) -> CliResult<TestReportOutput> {
    reporter.header("Test report");
    let run = parse_transcript_file(transcript, pipeline)?;

    let module = match &run.module_name {
        Some(module) => module.clone(),
        None => {
            reporter.warning(&format!(
                "no module banner in {}, reporting as '{UNNAMED_MODULE}'",
                transcript.display()
            ));
            UNNAMED_MODULE.to_string()
        }
    };

    let files = write_test_report(&run, format, &pipeline.reports_dir(&module))?;
    reporter.run_summary(&run);
    if let Some(entry) = files.first() {
        reporter.report_path("Test report", entry);
    }
    Ok(TestReportOutput { run, files })
}
