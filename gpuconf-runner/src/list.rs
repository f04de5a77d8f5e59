// Copyright (c) The gpuconf Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test identity, terminal results, and test selection.

use crate::tester::Tester;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// Terminal classification of one test invocation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestResult {
    /// The workload ran and met its pass criteria.
    Pass,
    /// The workload ran and did not meet its pass criteria.
    Fail,
    /// The tester faulted: `run` returned an error, panicked, or completed
    /// without recording a result.
    Error,
    /// The tester declined to run the workload on this host.
    Skip,
}

impl TestResult {
    /// All result values, in report group order.
    pub const ALL: [TestResult; 4] = [
        TestResult::Pass,
        TestResult::Fail,
        TestResult::Error,
        TestResult::Skip,
    ];

    /// The uppercase display name used in reports.
    pub fn name(self) -> &'static str {
        match self {
            TestResult::Pass => "PASS",
            TestResult::Fail => "FAIL",
            TestResult::Error => "ERROR",
            TestResult::Skip => "SKIP",
        }
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single selected conformance test.
///
/// Identity is the name: every run-level mapping is keyed by the lowercased
/// name, and a name must be unique within a run.
#[derive(Clone)]
pub struct Test {
    name: String,
    tester: Arc<dyn Tester>,
}

impl Test {
    /// Creates a test from a name and the tester that executes it.
    pub fn new(name: impl Into<String>, tester: Arc<dyn Tester>) -> Self {
        Self {
            name: name.into(),
            tester,
        }
    }

    /// The name as registered.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The lowercased name used for display and as the mapping key.
    pub fn display_name(&self) -> String {
        self.name.to_lowercase()
    }

    /// The tester that executes this test.
    pub fn tester(&self) -> &dyn Tester {
        &*self.tester
    }
}

impl fmt::Debug for Test {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Test")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Capability interface for test selection.
///
/// Implementations own discovery and filtering; the engine only consumes the
/// returned list (and sorts it by name before execution).
pub trait TestSelect {
    /// Returns the tests selected for this run.
    ///
    /// `log_root` is the run's timestamped log directory; `exclude_paths`
    /// names locations the selector must not consider.
    fn select(&self, log_root: &Utf8Path, exclude_paths: &[Utf8PathBuf]) -> Vec<Test>;
}

/// Selector over a registered suite, applying the run's name filter.
pub struct SuiteSelector {
    tests: Vec<Test>,
    filter: Option<Vec<String>>,
}

impl SuiteSelector {
    /// Creates a selector over the given registered tests, with no filter.
    pub fn new(tests: Vec<Test>) -> Self {
        Self {
            tests,
            filter: None,
        }
    }

    /// Restricts selection to the named tests. Matching is case-insensitive.
    pub fn with_filter(mut self, filter: Option<Vec<String>>) -> Self {
        self.filter = filter;
        self
    }
}

impl TestSelect for SuiteSelector {
    fn select(&self, _log_root: &Utf8Path, _exclude_paths: &[Utf8PathBuf]) -> Vec<Test> {
        match &self.filter {
            None => self.tests.clone(),
            Some(names) => {
                let wanted: Vec<String> = names.iter().map(|name| name.to_lowercase()).collect();
                self.tests
                    .iter()
                    .filter(|test| wanted.contains(&test.display_name()))
                    .cloned()
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tester::{BasicTestData, TestData, TesterError};

    struct NoopTester;

    impl Tester for NoopTester {
        fn new_data(&self) -> Box<dyn TestData> {
            Box::new(BasicTestData::default())
        }

        fn run(&self, _data: &mut dyn TestData) -> Result<(), TesterError> {
            Ok(())
        }

        fn clean(&self) -> Result<(), TesterError> {
            Ok(())
        }
    }

    fn suite(names: &[&str]) -> Vec<Test> {
        names
            .iter()
            .map(|name| Test::new(*name, Arc::new(NoopTester)))
            .collect()
    }

    #[test]
    fn result_names_match_report_vocabulary() {
        let names: Vec<_> = TestResult::ALL.iter().map(|result| result.name()).collect();
        assert_eq!(names, ["PASS", "FAIL", "ERROR", "SKIP"]);
    }

    #[test]
    fn result_serializes_to_uppercase() {
        assert_eq!(
            serde_json::to_string(&TestResult::Error).unwrap(),
            r#""ERROR""#
        );
        assert_eq!(
            serde_json::from_str::<TestResult>(r#""SKIP""#).unwrap(),
            TestResult::Skip
        );
    }

    #[test]
    fn unfiltered_selection_returns_all_tests() {
        let selector = SuiteSelector::new(suite(&["beta", "alpha"]));
        let selected = selector.select(Utf8Path::new("/tmp"), &[]);
        let names: Vec<_> = selected.iter().map(Test::name).collect();
        assert_eq!(names, ["beta", "alpha"]);
    }

    #[test]
    fn filter_matches_case_insensitively() {
        let selector = SuiteSelector::new(suite(&["Alpha", "beta", "gamma"]))
            .with_filter(Some(vec!["ALPHA".to_owned(), "gamma".to_owned()]));
        let selected = selector.select(Utf8Path::new("/tmp"), &[]);
        let names: Vec<_> = selected.iter().map(Test::name).collect();
        assert_eq!(names, ["Alpha", "gamma"]);
    }

    #[test]
    fn filter_with_no_match_selects_nothing() {
        let selector =
            SuiteSelector::new(suite(&["alpha"])).with_filter(Some(vec!["delta".to_owned()]));
        assert!(selector.select(Utf8Path::new("/tmp"), &[]).is_empty());
    }
}
