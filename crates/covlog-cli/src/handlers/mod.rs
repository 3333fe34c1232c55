//! Command handlers
//!
//! Each handler module contains the execution logic for one CLI command and
//! the helpers it shares with `report`.

pub mod config;
pub mod coverage;
pub mod report;
pub mod test_report;

pub use config::execute_config;
pub use coverage::{execute_coverage, run_coverage};
pub use report::execute_report;
pub use test_report::{execute_test_report, generate_test_report};
