//! Test report rendering.
//!
//! HTML output is a `main_test_report.html` index linking one page per
//! suite, written to `Reports/<module>/TestReport/`. JUnit XML and JSON
//! exports of the same run land next to it.

use crate::model::{CaseStatus, TestRun, TestSuite};
use crate::result::{CovlogError, CovlogResult};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Index page file name
pub const INDEX_FILE: &str = "main_test_report.html";
/// Directory under the module's report root
pub const TEST_REPORT_DIR: &str = "TestReport";

/// Output format of a test report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Linked HTML pages
    #[default]
    Html,
    /// JUnit XML for CI systems
    Junit,
    /// Serialized run
    Json,
}

const STYLE: &str = r"
        body { font-family: Arial, sans-serif; margin: 20px; background-color: #f4f4f4; }
        h1 { color: #007BFF; }
        h2, h3 { color: #333; }
        .total-info { margin-bottom: 20px; color: #333; }
        .tab { display: inline-block; width: 40px; }
        table { width: 100%; border-collapse: collapse; background: white; }
        th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
        th { background-color: #007BFF; color: white; }
        a { color: #007BFF; text-decoration: none; }
        a.failing { color: red; }
        .pass { color: #28a745; font-weight: bold; }
        .fail { color: #dc3545; font-weight: bold; }
        .pending { color: #ff9800; font-weight: bold; }
        .mismatch { color: #ff9800; }
        footer { margin-top: 20px; color: #777; font-size: 0.9em; }
";

fn page_header(title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{}</title>
    <style>{STYLE}    </style>
</head>
<body>
"#,
        escape_xml(title)
    )
}

fn page_footer() -> String {
    format!(
        "<footer>\n    <p>Generated by covlog on {}</p>\n</footer>\n</body>\n</html>\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}

/// File name of a suite's page
///
/// Characters outside `[A-Za-z0-9_.-]` (e.g. the `/` of parameterized
/// suites) become `_`.
#[must_use]
pub fn suite_file_name(suite: &str) -> String {
    let stem: String = suite
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}.html")
}

/// Render the index page
#[must_use]
pub fn render_index_html(run: &TestRun) -> String {
    let mut html = page_header("Test Report");

    html.push_str("<h1>Test Report</h1>\n");
    if let Some(module) = &run.module_name {
        let _ = writeln!(html, "<h2>Module: {}</h2>", escape_xml(module));
    }
    let observed_class = if run.counts_mismatch() { r#" class="mismatch""# } else { "" };
    let _ = write!(
        html,
        r#"<div class="total-info">
    <p>Total Test Suites: {}<span class="tab"></span>Total Test Cases: {}</p>
    <p{observed_class}>Observed Test Suites: {}<span class="tab"></span>Observed Test Cases: {}</p>
    <p>Total Pass: {}</p>
    <p>Total Fail: {}</p>
</div>
"#,
        run.declared_suites,
        run.declared_tests,
        run.observed_suites(),
        run.total_cases(),
        run.passed(),
        run.failed()
    );

    html.push_str(
        "<table>
    <tr>
        <th>Test Suite</th>
        <th>Number of Test Cases</th>
        <th>Number of Passed Test Cases</th>
        <th>Number of Failed Test Cases</th>
    </tr>
",
    );
    for suite in &run.suites {
        let class = if suite.has_failures() { r#" class="failing""# } else { "" };
        let _ = write!(
            html,
            r#"    <tr>
        <td><a href="{}"{class}>{}</a></td>
        <td>{}</td>
        <td>{}</td>
        <td>{}</td>
    </tr>
"#,
            escape_xml(&suite_file_name(&suite.name)),
            escape_xml(&suite.name),
            suite.total(),
            suite.passed(),
            suite.failed()
        );
    }
    html.push_str("</table>\n");

    html.push_str(&page_footer());
    html
}

/// Render one suite's page
#[must_use]
pub fn render_suite_html(suite: &TestSuite) -> String {
    let mut html = page_header(&format!("{} Test Suite", suite.name));

    let name = escape_xml(&suite.name);
    let _ = write!(
        html,
        r#"<p><a href="{INDEX_FILE}">&larr; All suites</a></p>
<h2>Total Test Cases in {name}: {}</h2>
<h3>Number of Passed Test Cases: {}</h3>
<h3>Number of Failed Test Cases: {}</h3>
"#,
        suite.total(),
        suite.passed(),
        suite.failed()
    );
    if suite.pending() > 0 {
        let _ = writeln!(html, "<h3>Without Outcome: {}</h3>", suite.pending());
    }

    html.push_str(
        "<table>
    <tr>
        <th>Test Case Name</th>
        <th>Status</th>
    </tr>
",
    );
    for case in &suite.cases {
        let class = match case.status() {
            CaseStatus::Pass => "pass",
            CaseStatus::Fail => "fail",
            CaseStatus::Pending => "pending",
        };
        let _ = write!(
            html,
            r#"    <tr>
        <td class="test-case-name">{}</td>
        <td><span class="{class}">{}</span></td>
    </tr>
"#,
            escape_xml(&case.name),
            case.status().label()
        );
    }
    html.push_str("</table>\n");

    html.push_str(&page_footer());
    html
}

/// Render JUnit XML
///
/// Cases without an outcome are reported as skipped.
#[must_use]
pub fn render_junit(run: &TestRun) -> String {
    let mut xml = String::new();

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    let _ = writeln!(
        xml,
        r#"<testsuites name="{}" tests="{}" failures="{}" timestamp="{}">"#,
        escape_xml(run.module_name.as_deref().unwrap_or("tests")),
        run.total_cases(),
        run.failed(),
        Local::now().format("%Y-%m-%dT%H:%M:%S")
    );

    for suite in &run.suites {
        let _ = writeln!(
            xml,
            r#"  <testsuite name="{}" tests="{}" failures="{}" skipped="{}">"#,
            escape_xml(&suite.name),
            suite.total(),
            suite.failed(),
            suite.pending()
        );
        for case in &suite.cases {
            let name = escape_xml(&case.name);
            let classname = escape_xml(&suite.name);
            match case.status() {
                CaseStatus::Pass => {
                    let _ = writeln!(xml, r#"    <testcase name="{name}" classname="{classname}"/>"#);
                }
                CaseStatus::Fail => {
                    let _ = writeln!(xml, r#"    <testcase name="{name}" classname="{classname}">"#);
                    xml.push_str("      <failure message=\"test failed\"/>\n");
                    xml.push_str("    </testcase>\n");
                }
                CaseStatus::Pending => {
                    let _ = writeln!(xml, r#"    <testcase name="{name}" classname="{classname}">"#);
                    xml.push_str("      <skipped message=\"no outcome recorded\"/>\n");
                    xml.push_str("    </testcase>\n");
                }
            }
        }
        xml.push_str("  </testsuite>\n");
    }

    xml.push_str("</testsuites>\n");
    xml
}

/// Render the run as pretty-printed JSON
pub fn render_json(run: &TestRun) -> CovlogResult<String> {
    Ok(serde_json::to_string_pretty(run)?)
}

/// Escape XML special characters
#[must_use]
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn write_file(path: &Path, content: &str) -> CovlogResult<()> {
    std::fs::write(path, content).map_err(|e| CovlogError::file_io(path, e))
}

/// Write a test report into `<reports_dir>/TestReport/`
///
/// Returns the written files, the entry point first.
pub fn write_test_report(run: &TestRun, format: ReportFormat, reports_dir: &Path) -> CovlogResult<Vec<PathBuf>> {
    let dir = reports_dir.join(TEST_REPORT_DIR);
    std::fs::create_dir_all(&dir).map_err(|e| CovlogError::file_io(&dir, e))?;

    let written = match format {
        ReportFormat::Html => {
            let index = dir.join(INDEX_FILE);
            write_file(&index, &render_index_html(run))?;
            let mut written = vec![index];
            for suite in &run.suites {
                let page = dir.join(suite_file_name(&suite.name));
                write_file(&page, &render_suite_html(suite))?;
                written.push(page);
            }
            written
        }
        ReportFormat::Junit => {
            let path = dir.join("test_report.xml");
            write_file(&path, &render_junit(run))?;
            vec![path]
        }
        ReportFormat::Json => {
            let path = dir.join("test_report.json");
            write_file(&path, &render_json(run)?)?;
            vec![path]
        }
    };

    info!(format = ?format, files = written.len(), dir = %dir.display(), "wrote test report");
    Ok(written)
}
