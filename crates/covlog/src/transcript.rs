//! GoogleTest transcript parser.
//!
//! Reads the console output of a gtest binary in one forward pass:
//!
//! ```text
//! Running main() from /home/dev/proj/Application/States/UnitTest/main.cc
//! [==========] Running 3 tests from 1 test suite.
//! [----------] 3 tests from MathTests
//! [ RUN      ] MathTests.Add
//! [       OK ] MathTests.Add (0 ms)
//! [ RUN      ] MathTests.Sub
//! [  FAILED  ] MathTests.Sub (0 ms)
//! [----------] 3 tests from MathTests (0 ms total)
//! ```
//!
//! The closing `[----------]` line of a suite looks like an opening one; it
//! opens an empty suite that is dropped when the next boundary arrives.

use crate::config::PipelineConfig;
use crate::model::{CaseStatus, TestCase, TestRun, TestSuite};
use crate::result::{CovlogError, CovlogResult};
use regex::Regex;
use std::path::Path;
use tracing::{debug, info, warn};

const SUITE_MARKER: &str = "[----------]";
const RUN_MARKER: &str = "[ RUN      ]";
const OK_MARKER: &str = "[       OK ]";
const FAILED_MARKER: &str = "[  FAILED  ]";
const BANNER_MARKER: &str = "Running main()";

/// Incremental transcript parser
#[derive(Debug)]
pub struct TranscriptParser {
    summary_pattern: Regex,
    module_pattern: Regex,
    suite_pattern: Regex,
    summary_seen: bool,
    run: TestRun,
    current: Option<TestSuite>,
}

impl TranscriptParser {
    /// Parser recognizing module banners under `/<project>/<module>/UnitTest/`
    pub fn new(project: &str) -> CovlogResult<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| CovlogError::config(format!("invalid pattern: {e}")))
        };

        Ok(Self {
            summary_pattern: compile(r"Running (\d+) tests? from (\d+) test suites?")?,
            module_pattern: compile(&format!(
                r"/{}/(\w+)/UnitTest/",
                regex::escape(project.trim_matches('/'))
            ))?,
            suite_pattern: compile(r"from (\S+)")?,
            summary_seen: false,
            run: TestRun::default(),
            current: None,
        })
    }

    /// Parser using the project segment of `config`
    pub fn from_config(config: &PipelineConfig) -> CovlogResult<Self> {
        Self::new(config.project_name())
    }

    /// Consume one transcript line
    pub fn feed(&mut self, line: &str) {
        if !self.summary_seen {
            if let Some(caps) = self.summary_pattern.captures(line) {
                self.run.declared_tests = caps[1].parse().unwrap_or(0);
                self.run.declared_suites = caps[2].parse().unwrap_or(0);
                self.summary_seen = true;
                debug!(
                    tests = self.run.declared_tests,
                    suites = self.run.declared_suites,
                    "run summary"
                );
            }
        }

        if self.run.module_name.is_none() && line.contains(BANNER_MARKER) {
            if let Some(caps) = self.module_pattern.captures(line) {
                debug!(module = &caps[1], "module banner");
                self.run.module_name = Some(caps[1].to_string());
            }
        }

        if line.contains(SUITE_MARKER) && (line.contains("tests from") || line.contains("test from")) {
            self.close_suite();
            self.current = self
                .suite_pattern
                .captures(line)
                .map(|caps| TestSuite::new(&caps[1]));
        } else if line.contains(RUN_MARKER) {
            self.start_case(line);
        } else if line.contains(OK_MARKER) {
            self.finish_case(CaseStatus::Pass);
        } else if line.contains(FAILED_MARKER) {
            self.finish_case(CaseStatus::Fail);
        }
    }

    fn start_case(&mut self, line: &str) {
        let name = line
            .split_whitespace()
            .last()
            .and_then(|token| token.rsplit('.').next())
            .unwrap_or_default();

        match &mut self.current {
            Some(suite) => suite.cases.push(TestCase::pending(name)),
            None => debug!(case = name, "case started outside a suite, ignoring"),
        }
    }

    fn finish_case(&mut self, outcome: CaseStatus) {
        let Some(case) = self.current.as_mut().and_then(|s| s.cases.last_mut()) else {
            return;
        };
        if !case.resolve(outcome) {
            debug!(case = %case.name, ?outcome, "case already has an outcome");
        }
    }

    fn close_suite(&mut self) {
        if let Some(suite) = self.current.take() {
            if suite.cases.is_empty() {
                debug!(suite = %suite.name, "dropping suite without cases");
            } else {
                self.run.suites.push(suite);
            }
        }
    }

    /// Close the open suite and return the run
    #[must_use]
    pub fn finish(mut self) -> TestRun {
        self.close_suite();

        if !self.summary_seen {
            warn!("no run summary line found, declared totals are 0");
        }
        if self.run.counts_mismatch() {
            info!(
                declared_tests = self.run.declared_tests,
                observed_tests = self.run.total_cases(),
                declared_suites = self.run.declared_suites,
                observed_suites = self.run.observed_suites(),
                "observed totals differ from the run summary"
            );
        }
        self.run
    }
}

/// Parse a complete transcript
pub fn parse_transcript(text: &str, config: &PipelineConfig) -> CovlogResult<TestRun> {
    let mut parser = TranscriptParser::from_config(config)?;
    for line in text.lines() {
        parser.feed(line);
    }
    Ok(parser.finish())
}

/// Read and parse a transcript file
///
/// The file is read lossily; non-UTF-8 bytes never abort a parse.
pub fn parse_transcript_file(path: &Path, config: &PipelineConfig) -> CovlogResult<TestRun> {
    let bytes = std::fs::read(path).map_err(|e| CovlogError::file_io(path, e))?;
    let run = parse_transcript(&String::from_utf8_lossy(&bytes), config)?;
    info!(path = %path.display(), summary = %run.summary(), "parsed transcript");
    Ok(run)
}
