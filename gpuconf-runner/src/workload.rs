// Copyright (c) The gpuconf Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reference tester implementations for native workloads.
//!
//! [`MakeWorkload`] covers the common build-then-execute lifecycle shared
//! by most conformance workloads: `make clean; make` in the workload
//! directory, run the produced binary, classify the captured output, and
//! tear back down with `make clean`. [`CommandTester`] is the lighter
//! variant suite files use: one shell command, classified by exit status
//! and an optional pass pattern.

use crate::{
    config::SuiteConfig,
    list::{Test, TestResult},
    tester::{BasicTestData, TestData, Tester, TesterError},
};
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::{
    fs::OpenOptions,
    io::Write as _,
    sync::Arc,
};

/// Name of the captured-output file inside a test's log directory.
pub const WORKLOAD_LOG_FILE: &str = "output.log";

/// Capability for classifying a workload's captured log output.
pub trait Verdict: Send + Sync {
    /// Classifies a complete workload log.
    fn parse(&self, log: &str) -> TestResult;
}

/// Verdict that passes when a pattern appears in the log.
pub struct PatternVerdict {
    pattern: Regex,
}

impl PatternVerdict {
    /// Builds a verdict from a regex pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl Verdict for PatternVerdict {
    fn parse(&self, log: &str) -> TestResult {
        if self.pattern.is_match(log) {
            TestResult::Pass
        } else {
            TestResult::Fail
        }
    }
}

/// Target platform for vendor-specific build environments.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Platform {
    /// AMD: the workload builds with the default toolchain environment.
    #[default]
    Amd,

    /// NVIDIA: the workload builds through the HIP-on-CUDA cross-compile
    /// environment.
    Nvidia,
}

impl Platform {
    /// Environment overrides applied to every workload command.
    fn env(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Platform::Amd => &[],
            Platform::Nvidia => &[
                ("HIP_PLATFORM", "nvidia"),
                ("HIP_COMPILER", "nvcc"),
                ("HIP_RUNTIME", "cuda"),
            ],
        }
    }
}

/// Tester for workloads that build with make and run a produced binary.
pub struct MakeWorkload {
    path: Utf8PathBuf,
    run_command: String,
    platform: Platform,
    verdict: Box<dyn Verdict>,
}

impl MakeWorkload {
    /// Creates a tester over the workload directory at `path`. `run_command`
    /// executes the built binary; `verdict` classifies its output.
    pub fn new(
        path: impl Into<Utf8PathBuf>,
        run_command: impl Into<String>,
        verdict: Box<dyn Verdict>,
    ) -> Self {
        Self {
            path: path.into(),
            run_command: run_command.into(),
            platform: Platform::default(),
            verdict,
        }
    }

    /// Selects the target platform's build environment.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    fn sh(&self, script: &str) -> duct::Expression {
        let mut expression = duct::cmd("sh", ["-c", script]).dir(self.path.as_std_path());
        for (key, value) in self.platform.env() {
            expression = expression.env(key, value);
        }
        expression
    }
}

impl Tester for MakeWorkload {
    fn new_data(&self) -> Box<dyn TestData> {
        Box::new(BasicTestData::default())
    }

    fn run(&self, data: &mut dyn TestData) -> Result<(), TesterError> {
        let log_path = data.core().log_dir.join(WORKLOAD_LOG_FILE);

        let build = self
            .sh("make clean; make")
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()?;
        append_log(&log_path, &build.stdout)?;
        if !build.status.success() {
            data.core_mut().result = Some(TestResult::Fail);
            return Ok(());
        }

        let execution = self
            .sh(&self.run_command)
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()?;
        append_log(&log_path, &execution.stdout)?;

        let result = if execution.status.success() {
            self.verdict.parse(&String::from_utf8_lossy(&execution.stdout))
        } else {
            TestResult::Fail
        };
        data.core_mut().result = Some(result);
        Ok(())
    }

    fn clean(&self) -> Result<(), TesterError> {
        self.sh("make clean")
            .stdout_null()
            .stderr_null()
            .unchecked()
            .run()?;
        Ok(())
    }
}

/// Tester that runs one configured shell command.
///
/// The exit status decides the result; an optional pass pattern refines a
/// successful exit into PASS or FAIL based on the captured output.
pub struct CommandTester {
    command: String,
    verdict: Option<PatternVerdict>,
}

impl CommandTester {
    /// Creates a tester for a shell command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            verdict: None,
        }
    }

    /// Requires `pattern` to appear in the output for the test to pass.
    pub fn with_pass_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.verdict = Some(PatternVerdict::new(pattern)?);
        Ok(self)
    }
}

impl Tester for CommandTester {
    fn new_data(&self) -> Box<dyn TestData> {
        Box::new(BasicTestData::default())
    }

    fn run(&self, data: &mut dyn TestData) -> Result<(), TesterError> {
        let log_path = data.core().log_dir.join(WORKLOAD_LOG_FILE);

        let output = duct::cmd("sh", ["-c", self.command.as_str()])
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()?;
        std::fs::write(&log_path, &output.stdout)?;

        let result = if !output.status.success() {
            TestResult::Fail
        } else {
            match &self.verdict {
                Some(verdict) => verdict.parse(&String::from_utf8_lossy(&output.stdout)),
                None => TestResult::Pass,
            }
        };
        data.core_mut().result = Some(result);
        Ok(())
    }

    fn clean(&self) -> Result<(), TesterError> {
        Ok(())
    }
}

/// Builds the test list a suite definition registers.
pub fn suite_tests(suite: &SuiteConfig) -> Result<Vec<Test>, regex::Error> {
    suite
        .tests
        .iter()
        .map(|entry| {
            let mut tester = CommandTester::new(entry.command.clone());
            if let Some(pattern) = &entry.pass_pattern {
                tester = tester.with_pass_pattern(pattern)?;
            }
            Ok(Test::new(entry.name.clone(), Arc::new(tester)))
        })
        .collect()
}

fn append_log(path: &Utf8Path, bytes: &[u8]) -> Result<(), TesterError> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(bytes)?;
    Ok(())
}
