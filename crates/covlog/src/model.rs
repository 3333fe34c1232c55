//! Report model: runs, suites and cases recovered from a test transcript.

use serde::{Deserialize, Serialize};

/// Outcome of a single test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaseStatus {
    /// Started, no outcome seen yet
    #[default]
    Pending,
    /// Passed
    Pass,
    /// Failed
    Fail,
}

impl CaseStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Check if status is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Fail)
    }

    /// Display label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Pass => "Pass",
            Self::Fail => "Fail",
        }
    }
}

/// One test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Case name, unique within its suite
    pub name: String,
    status: CaseStatus,
}

impl TestCase {
    /// A case that has started but not finished
    #[must_use]
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CaseStatus::Pending,
        }
    }

    /// Current status
    #[must_use]
    pub const fn status(&self) -> CaseStatus {
        self.status
    }

    /// Record an outcome
    ///
    /// Only a pending case takes an outcome; returns whether it did.
    pub fn resolve(&mut self, outcome: CaseStatus) -> bool {
        if self.status != CaseStatus::Pending || outcome == CaseStatus::Pending {
            return false;
        }
        self.status = outcome;
        true
    }
}

/// A group of cases sharing a fixture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSuite {
    /// Suite name
    pub name: String,
    /// Cases in transcript order
    pub cases: Vec<TestCase>,
}

impl TestSuite {
    /// Create an empty suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new(),
        }
    }

    /// Number of cases
    #[must_use]
    pub fn total(&self) -> usize {
        self.cases.len()
    }

    /// Number of passed cases
    #[must_use]
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.status.is_passed()).count()
    }

    /// Number of failed cases
    #[must_use]
    pub fn failed(&self) -> usize {
        self.cases.iter().filter(|c| c.status.is_failed()).count()
    }

    /// Number of cases without an outcome
    #[must_use]
    pub fn pending(&self) -> usize {
        self.total() - self.passed() - self.failed()
    }

    /// Whether any case failed
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

/// Everything recovered from one transcript
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRun {
    /// Module under test, from the invocation banner
    pub module_name: Option<String>,
    /// Test count announced by the runner
    pub declared_tests: usize,
    /// Suite count announced by the runner
    pub declared_suites: usize,
    /// Non-empty suites in transcript order
    pub suites: Vec<TestSuite>,
}

impl TestRun {
    /// Number of suites that contained cases
    #[must_use]
    pub fn observed_suites(&self) -> usize {
        self.suites.len()
    }

    /// Number of cases across all suites
    #[must_use]
    pub fn total_cases(&self) -> usize {
        self.suites.iter().map(TestSuite::total).sum()
    }

    /// Number of passed cases
    #[must_use]
    pub fn passed(&self) -> usize {
        self.suites.iter().map(TestSuite::passed).sum()
    }

    /// Number of failed cases
    #[must_use]
    pub fn failed(&self) -> usize {
        self.suites.iter().map(TestSuite::failed).sum()
    }

    /// Check if all observed cases passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    /// Whether observed totals disagree with the runner's announcement
    #[must_use]
    pub fn counts_mismatch(&self) -> bool {
        self.declared_tests != self.total_cases() || self.declared_suites != self.observed_suites()
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {}/{} passed, {} failed in {} suites",
            self.module_name.as_deref().unwrap_or("tests"),
            self.passed(),
            self.total_cases(),
            self.failed(),
            self.observed_suites()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(name: &str, status: CaseStatus) -> TestCase {
        let mut case = TestCase::pending(name);
        case.resolve(status);
        case
    }

    mod test_case_tests {
        use super::*;

        #[test]
        fn test_pending_by_default() {
            assert_eq!(TestCase::pending("Add").status(), CaseStatus::Pending);
        }

        #[test]
        fn test_resolve_once() {
            let mut case = TestCase::pending("Add");
            assert!(case.resolve(CaseStatus::Fail));
            assert!(!case.resolve(CaseStatus::Pass));
            assert_eq!(case.status(), CaseStatus::Fail);
        }

        #[test]
        fn test_resolve_to_pending_is_ignored() {
            let mut case = TestCase::pending("Add");
            assert!(!case.resolve(CaseStatus::Pending));
            assert!(case.resolve(CaseStatus::Pass));
        }

        #[test]
        fn test_labels() {
            assert_eq!(CaseStatus::Pass.label(), "Pass");
            assert_eq!(CaseStatus::Fail.label(), "Fail");
            assert!(CaseStatus::Pass.is_passed());
            assert!(CaseStatus::Fail.is_failed());
        }
    }

    mod test_suite_tests {
        use super::*;

        #[test]
        fn test_counts() {
            let mut suite = TestSuite::new("MathTests");
            suite.cases.push(case("Add", CaseStatus::Pass));
            suite.cases.push(case("Sub", CaseStatus::Fail));
            suite.cases.push(TestCase::pending("Mul"));

            assert_eq!(suite.total(), 3);
            assert_eq!(suite.passed(), 1);
            assert_eq!(suite.failed(), 1);
            assert_eq!(suite.pending(), 1);
            assert!(suite.has_failures());
        }
    }

    mod test_run_tests {
        use super::*;

        fn run() -> TestRun {
            let mut a = TestSuite::new("A");
            a.cases.push(case("one", CaseStatus::Pass));
            a.cases.push(case("two", CaseStatus::Pass));
            let mut b = TestSuite::new("B");
            b.cases.push(case("three", CaseStatus::Fail));
            TestRun {
                module_name: Some("States".to_string()),
                declared_tests: 3,
                declared_suites: 2,
                suites: vec![a, b],
            }
        }

        #[test]
        fn test_totals() {
            let run = run();
            assert_eq!(run.observed_suites(), 2);
            assert_eq!(run.total_cases(), 3);
            assert_eq!(run.passed(), 2);
            assert_eq!(run.failed(), 1);
            assert!(!run.all_passed());
            assert!(!run.counts_mismatch());
        }

        #[test]
        fn test_mismatch() {
            let mut run = run();
            run.declared_tests = 5;
            assert!(run.counts_mismatch());
        }

        #[test]
        fn test_summary() {
            assert_eq!(run().summary(), "States: 2/3 passed, 1 failed in 2 suites");
        }

        #[test]
        fn test_empty_run() {
            let run = TestRun::default();
            assert_eq!(run.total_cases(), 0);
            assert!(run.all_passed());
        }
    }
}
