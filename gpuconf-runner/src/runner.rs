// Copyright (c) The gpuconf Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The sequential execution loop.
//!
//! Tests run strictly one at a time, in ascending name order, each inside a
//! fault-containment boundary: an `Err` from the tester, a panic, or a
//! failure to create the test's log directory forces that test's result to
//! ERROR and the loop moves on. After the last test, every tester's
//! `clean` is invoked in the same order, each call contained the same way.

use crate::{
    config::RunConfig,
    helpers::{error_chain, panic_message},
    list::{Test, TestResult},
    tester::TestData,
};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::panic::{self, AssertUnwindSafe};
use tracing::{error, info, warn};

/// Suffix appended to a test's display name to form its log directory.
pub const TEST_LOG_DIR_SUFFIX: &str = ".log.d";

/// Per-test records produced by the execution loop.
///
/// The three mappings are parallel: same keys, same insertion order (the
/// execution order).
#[derive(Clone, Debug, Default)]
pub struct ExecutedTests {
    /// Terminal result per test.
    pub statuses: IndexMap<String, TestResult>,

    /// Absolute log directory per test.
    pub log_dirs: IndexMap<String, Utf8PathBuf>,

    /// Log directory per test, relative to the base log location.
    pub relative_log_dirs: IndexMap<String, Utf8PathBuf>,
}

/// Runs every test in order, then cleans every test in the same order.
///
/// `tests` must already be sorted by name; the session guarantees this.
/// `run_log_root` is the timestamped run directory, `relative_run_root` the
/// same directory relative to the base log location (used for display
/// paths).
pub fn execute_tests(
    tests: &[Test],
    config: &RunConfig,
    run_log_root: &Utf8Path,
    relative_run_root: &Utf8Path,
) -> ExecutedTests {
    let mut executed = ExecutedTests::default();

    for test in tests {
        let name = test.display_name();
        info!("Started Test: {name}");

        let mut data = test.tester().new_data();
        data.apply_config(config);

        let log_dir = run_log_root.join(format!("{name}{TEST_LOG_DIR_SUFFIX}"));
        let relative_log_dir = relative_run_root.join(format!("{name}{TEST_LOG_DIR_SUFFIX}"));
        {
            let core = data.core_mut();
            core.test_name = name.clone();
            core.log_dir = log_dir.clone();
        }

        let status = match std::fs::create_dir_all(&log_dir) {
            Ok(()) => run_contained(test, &name, &mut *data),
            Err(io_error) => {
                error!("Test {name} could not be given log directory `{log_dir}`: {io_error}");
                TestResult::Error
            }
        };

        if executed.statuses.insert(name.clone(), status).is_some() {
            warn!("duplicate test name {name}; keeping the later record");
        }
        executed.log_dirs.insert(name.clone(), log_dir);
        executed.relative_log_dirs.insert(name.clone(), relative_log_dir);
        info!("Completed Test: {name} with result {status}");
    }

    for test in tests {
        clean_contained(test);
    }

    executed
}

/// Invokes `run` with both error returns and panics converted into a
/// terminal result. Nothing thrown here escapes the loop.
fn run_contained(test: &Test, name: &str, data: &mut dyn TestData) -> TestResult {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| test.tester().run(data)));
    match outcome {
        Ok(Ok(())) => match data.core().result {
            Some(result) => result,
            None => {
                warn!("Test {name} completed without recording a result; forcing ERROR");
                TestResult::Error
            }
        },
        Ok(Err(run_error)) => {
            error!("Test {name} errored: {}", error_chain(&*run_error));
            TestResult::Error
        }
        Err(payload) => {
            error!("Test {name} panicked: {}", panic_message(payload.as_ref()));
            TestResult::Error
        }
    }
}

/// Invokes `clean`, containing failures the same way as `run`. A cleanup
/// fault never touches the recorded result and never blocks the remaining
/// cleanups.
fn clean_contained(test: &Test) {
    let name = test.display_name();
    match panic::catch_unwind(AssertUnwindSafe(|| test.tester().clean())) {
        Ok(Ok(())) => {}
        Ok(Err(clean_error)) => {
            warn!("Cleanup for {name} failed: {}", error_chain(&*clean_error));
        }
        Err(payload) => {
            warn!("Cleanup for {name} panicked: {}", panic_message(payload.as_ref()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tester::{BasicTestData, Tester, TesterError};
    use camino_tempfile::Utf8TempDir;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    enum Behavior {
        Record(TestResult),
        ErrorOut,
        Panic,
        NoResult,
    }

    struct ScriptedTester {
        behavior: Behavior,
        cleans: Arc<AtomicUsize>,
        clean_fails: bool,
    }

    impl ScriptedTester {
        fn test(name: &str, behavior: Behavior, cleans: &Arc<AtomicUsize>) -> Test {
            Test::new(
                name,
                Arc::new(ScriptedTester {
                    behavior,
                    cleans: Arc::clone(cleans),
                    clean_fails: false,
                }),
            )
        }
    }

    impl Tester for ScriptedTester {
        fn new_data(&self) -> Box<dyn TestData> {
            Box::new(BasicTestData::default())
        }

        fn run(&self, data: &mut dyn TestData) -> Result<(), TesterError> {
            match self.behavior {
                Behavior::Record(result) => {
                    data.core_mut().result = Some(result);
                    Ok(())
                }
                Behavior::ErrorOut => Err("scripted failure".into()),
                Behavior::Panic => panic!("scripted panic"),
                Behavior::NoResult => Ok(()),
            }
        }

        fn clean(&self) -> Result<(), TesterError> {
            self.cleans.fetch_add(1, Ordering::SeqCst);
            if self.clean_fails {
                return Err("scripted cleanup failure".into());
            }
            Ok(())
        }
    }

    fn run(tests: &[Test]) -> (ExecutedTests, Utf8TempDir) {
        let dir = Utf8TempDir::new().expect("tempdir");
        let executed = execute_tests(
            tests,
            &RunConfig::default(),
            dir.path(),
            Utf8Path::new("report/stamp"),
        );
        (executed, dir)
    }

    #[test]
    fn error_return_forces_error_without_aborting_the_loop() {
        let cleans = Arc::new(AtomicUsize::new(0));
        let tests = [
            ScriptedTester::test("alpha", Behavior::Record(TestResult::Pass), &cleans),
            ScriptedTester::test("beta", Behavior::ErrorOut, &cleans),
            ScriptedTester::test("gamma", Behavior::Record(TestResult::Pass), &cleans),
        ];
        let (executed, _dir) = run(&tests);

        assert_eq!(executed.statuses["beta"], TestResult::Error);
        assert_eq!(executed.statuses["gamma"], TestResult::Pass);
        assert_eq!(cleans.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn panic_is_contained_and_forces_error() {
        let cleans = Arc::new(AtomicUsize::new(0));
        let tests = [
            ScriptedTester::test("panicky", Behavior::Panic, &cleans),
            ScriptedTester::test("steady", Behavior::Record(TestResult::Skip), &cleans),
        ];
        let (executed, _dir) = run(&tests);

        assert_eq!(executed.statuses["panicky"], TestResult::Error);
        assert_eq!(executed.statuses["steady"], TestResult::Skip);
        assert_eq!(cleans.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_result_after_success_is_an_error() {
        let cleans = Arc::new(AtomicUsize::new(0));
        let tests = [ScriptedTester::test("quiet", Behavior::NoResult, &cleans)];
        let (executed, _dir) = run(&tests);
        assert_eq!(executed.statuses["quiet"], TestResult::Error);
    }

    #[test]
    fn cleanup_fault_does_not_block_remaining_cleanups() {
        let cleans = Arc::new(AtomicUsize::new(0));
        let failing = Test::new(
            "first",
            Arc::new(ScriptedTester {
                behavior: Behavior::Record(TestResult::Pass),
                cleans: Arc::clone(&cleans),
                clean_fails: true,
            }),
        );
        let tests = [
            failing,
            ScriptedTester::test("second", Behavior::Record(TestResult::Pass), &cleans),
        ];
        let (executed, _dir) = run(&tests);

        assert_eq!(cleans.load(Ordering::SeqCst), 2);
        assert_eq!(executed.statuses["first"], TestResult::Pass);
    }

    #[test]
    fn log_directories_are_created_before_run_and_recorded_both_ways() {
        let cleans = Arc::new(AtomicUsize::new(0));
        let tests = [ScriptedTester::test(
            "MixedCase",
            Behavior::Record(TestResult::Pass),
            &cleans,
        )];
        let (executed, dir) = run(&tests);

        let log_dir = &executed.log_dirs["mixedcase"];
        assert_eq!(log_dir, &dir.path().join("mixedcase.log.d"));
        assert!(log_dir.is_dir(), "log dir exists: {log_dir}");
        assert_eq!(
            executed.relative_log_dirs["mixedcase"],
            Utf8PathBuf::from("report/stamp/mixedcase.log.d")
        );
    }
}
