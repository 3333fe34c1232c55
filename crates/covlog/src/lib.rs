//! covlog: test and coverage reports from embedded target logs
//!
//! Two inputs, two reports:
//!
//! - a GoogleTest console transcript becomes a suite/case [`TestRun`],
//!   rendered as linked HTML pages, JUnit XML or JSON;
//! - a raw serial capture with hex-dumped `.gcda` counter files becomes a
//!   merged, filtered lcov dataset plus a genhtml tree.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  serial capture                                                      │
//! │    │                                                                 │
//! │    ▼                                                                 │
//! │  sanitize ──► splitter ──► resolver ──► aggregate (lcov) ──► genhtml │
//! │  (ASCII)      (.xxd)       (.gcda in     capture/merge/extract       │
//! │                             build dirs)                              │
//! │                                                                      │
//! │  gtest transcript ──► transcript ──► model ──► render                │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use covlog::{parse_transcript, PipelineConfig};
//!
//! let transcript = "\
//! [==========] Running 1 test from 1 test suite.
//! [----------] 1 test from MathTests
//! [ RUN      ] MathTests.Add
//! [       OK ] MathTests.Add (0 ms)
//! ";
//! let run = parse_transcript(transcript, &PipelineConfig::default()).unwrap();
//! assert_eq!(run.passed(), 1);
//! ```

#![warn(missing_docs)]

mod config;
mod model;
mod result;

/// Coverage tool driving: per-directory capture, merge and extraction
pub mod aggregate;
/// xxd-compatible hex dump codec
pub mod hexdump;
/// Coverage pipeline orchestration and progress events
pub mod pipeline;
/// HTML, JUnit and JSON test reports
pub mod render;
/// Routing of staged dumps back to their build directories
pub mod resolver;
/// Raw capture sanitizing
pub mod sanitize;
/// Splitting of a capture into per-unit hex dumps
pub mod splitter;
/// External coverage tool contract and the lcov driver
pub mod tool;
/// GoogleTest transcript parsing
pub mod transcript;

pub use aggregate::{capture_targets, Aggregator, CaptureTarget};
pub use config::{PipelineConfig, UNNAMED_MODULE};
pub use model::{CaseStatus, TestCase, TestRun, TestSuite};
pub use pipeline::{CoverageOutcome, CoveragePipeline, PipelineEvent, PipelineStage};
pub use render::{write_test_report, ReportFormat};
pub use resolver::{PathResolver, ResolvedCoverageFile, RoutingOutcome, SkipReason, SkippedArtifact};
pub use result::{CovlogError, CovlogResult};
pub use splitter::CoverageArtifact;
pub use tool::{CoverageTool, Lcov};
pub use transcript::{parse_transcript, parse_transcript_file, TranscriptParser};
