// Copyright (c) The gpuconf Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The top-level run coordinator.
//!
//! A [`RunSession`] establishes the timestamped log hierarchy and the
//! run-scoped logger, obtains the selected tests, drives the execution
//! loop, gathers the environment facts, and hands the aggregate
//! [`RunOutcome`] to the report emitter. Only setup and report-write
//! failures propagate; every test-level and probe-level fault has already
//! been converted into data by the time this module sees it.

use crate::{
    config::RunConfig,
    errors::{RunError, SetupError},
    list::{TestResult, TestSelect},
    logging::RunLogger,
    probe::{EnvironmentFacts, EnvironmentProbe},
    report, runner,
};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use tracing::info;

/// Directory under the base log location that holds all run directories.
pub const REPORT_ROOT_DIR: &str = "report";

/// File name of the dual-sink run log inside the run directory.
pub const RUN_LOG_FILE_NAME: &str = "report.log";

/// Timestamp format shared by run directory names and report timestamps.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

/// Aggregate record of one orchestration run.
///
/// Built incrementally during the run, immutable once the run completes,
/// and the sole input to reporting.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    /// Terminal result per test, keyed by lowercased name, in execution
    /// order.
    pub statuses: IndexMap<String, TestResult>,

    /// Absolute log directory per test.
    pub log_dirs: IndexMap<String, Utf8PathBuf>,

    /// Log directory per test, relative to the base log location.
    pub relative_log_dirs: IndexMap<String, Utf8PathBuf>,

    /// When the run started, recorded before any test executed.
    pub started_at: DateTime<Local>,

    /// When the run ended, recorded after the last cleanup returned.
    pub finished_at: DateTime<Local>,

    /// The active test-name filter, if one was set.
    pub selected_test_filter: Option<Vec<String>>,

    /// The collected environment facts.
    pub environment: EnvironmentFacts,

    /// The run's timestamped log directory.
    pub run_log_root: Utf8PathBuf,

    /// The run's log directory relative to the base log location.
    pub relative_run_root: Utf8PathBuf,
}

/// Coordinates one run over a configuration.
pub struct RunSession<'cfg> {
    config: &'cfg RunConfig,
    probe: EnvironmentProbe,
}

impl<'cfg> RunSession<'cfg> {
    /// Creates a session over `config` with the default environment probe.
    pub fn new(config: &'cfg RunConfig) -> Self {
        Self {
            config,
            probe: EnvironmentProbe::default(),
        }
    }

    /// Replaces the environment probe. Embedders and tests use this to
    /// redirect the probed locations.
    pub fn with_probe(mut self, probe: EnvironmentProbe) -> Self {
        self.probe = probe;
        self
    }

    /// Executes the full run: log hierarchy, selection, execution loop,
    /// classification, probing, and reporting.
    ///
    /// Returns the aggregate outcome. Fails only on setup faults (the log
    /// hierarchy or log file cannot be established) or on failure to write
    /// the structured report.
    pub fn execute(&self, selector: &dyn TestSelect) -> Result<RunOutcome, RunError> {
        let started_at = Local::now();

        let base = self.base_log_location()?;
        create_dir(&base)?;
        let report_root = base.join(REPORT_ROOT_DIR);
        create_dir(&report_root)?;
        let stamp = started_at.format(TIMESTAMP_FORMAT).to_string();
        let run_log_root = report_root.join(&stamp);
        create_dir(&run_log_root)?;
        let relative_run_root = Utf8PathBuf::from(REPORT_ROOT_DIR).join(&stamp);

        let logger = RunLogger::new(&run_log_root.join(RUN_LOG_FILE_NAME))?;
        logger.scope(|| {
            self.execute_logged(selector, started_at, &base, &run_log_root, &relative_run_root)
        })
    }

    /// The body of the run, executed with the run logger installed.
    fn execute_logged(
        &self,
        selector: &dyn TestSelect,
        started_at: DateTime<Local>,
        base: &Utf8Path,
        run_log_root: &Utf8Path,
        relative_run_root: &Utf8Path,
    ) -> Result<RunOutcome, RunError> {
        if let Some(filter) = &self.config.run_tests {
            info!("Selected Test Filter: {}", filter.join(" "));
        }
        info!("Execution Logs: {base}");

        let mut tests = selector.select(run_log_root, &[]);
        tests.sort_by_key(|test| test.display_name());

        let executed = runner::execute_tests(&tests, self.config, run_log_root, relative_run_root);
        let finished_at = Local::now();

        let environment = self.probe.collect();

        let outcome = RunOutcome {
            statuses: executed.statuses,
            log_dirs: executed.log_dirs,
            relative_log_dirs: executed.relative_log_dirs,
            started_at,
            finished_at,
            selected_test_filter: self.config.run_tests.clone(),
            environment,
            run_log_root: run_log_root.to_owned(),
            relative_run_root: relative_run_root.to_owned(),
        };

        info!("Start Time: {}", outcome.started_at.format("%Y/%m/%d %H:%M:%S"));
        info!("End Time: {}", outcome.finished_at.format("%Y/%m/%d %H:%M:%S"));

        report::emit_summary(&outcome);
        info!("Note, all log locations are relative to {base}");

        let run_report = report::build_report(&outcome);
        report::write_json(&run_report, run_log_root)?;

        info!("Test Complete: Log file directory is {relative_run_root}");
        Ok(outcome)
    }

    fn base_log_location(&self) -> Result<Utf8PathBuf, SetupError> {
        match &self.config.log_location {
            Some(path) => Ok(path.clone()),
            None => {
                let cwd = std::env::current_dir().map_err(SetupError::CurrentDir)?;
                Utf8PathBuf::try_from(cwd).map_err(SetupError::CurrentDirInvalidUtf8)
            }
        }
    }
}

fn create_dir(path: &Utf8Path) -> Result<(), SetupError> {
    std::fs::create_dir_all(path).map_err(|error| SetupError::CreateLogDir {
        path: path.to_owned(),
        error,
    })
}
