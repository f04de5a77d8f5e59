// Copyright (c) The gpuconf Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run and suite configuration.
//!
//! [`RunConfig`] carries the settings the engine itself consumes: the base
//! log location and the optional test-name filter. [`SuiteConfig`] is the
//! on-disk suite definition the CLI loads, registering command-driven tests
//! alongside the run settings.

use crate::errors::SuiteReadError;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

/// Configuration consumed by a run session.
///
/// Read-only for the engine; propagated into configuration-aware test data
/// via [`TestData::apply_config`](crate::tester::TestData::apply_config).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RunConfig {
    /// Base location for the report hierarchy. Falls back to the current
    /// directory when unset.
    #[serde(default)]
    pub log_location: Option<Utf8PathBuf>,

    /// Names of the tests to run. All registered tests run when unset.
    #[serde(default)]
    pub run_tests: Option<Vec<String>>,
}

/// A suite definition file: run settings plus the registered tests.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SuiteConfig {
    /// Run-level settings.
    #[serde(flatten)]
    pub run: RunConfig,

    /// The registered tests, in declaration order.
    #[serde(default, rename = "test")]
    pub tests: Vec<SuiteTest>,
}

/// One registered test in a suite file.
#[derive(Clone, Debug, Deserialize)]
pub struct SuiteTest {
    /// Test name, unique within the suite.
    pub name: String,

    /// Shell command executed for this test.
    pub command: String,

    /// Pattern that must appear in the captured output for the test to
    /// pass. Exit status alone decides when unset.
    #[serde(default)]
    pub pass_pattern: Option<String>,
}

impl SuiteConfig {
    /// Loads a suite definition from a TOML file.
    pub fn from_path(path: &Utf8Path) -> Result<Self, SuiteReadError> {
        let raw = std::fs::read_to_string(path).map_err(|error| SuiteReadError::Read {
            path: path.to_owned(),
            error,
        })?;
        toml::from_str(&raw).map_err(|error| SuiteReadError::Parse {
            path: path.to_owned(),
            error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn suite_file_parses_run_settings_and_tests() {
        let suite: SuiteConfig = toml::from_str(indoc! {r#"
            log_location = "/var/log/conformance"
            run_tests = ["vectoradd", "bandwidth"]

            [[test]]
            name = "vectoradd"
            command = "./vectoradd"
            pass_pattern = "PASSED"

            [[test]]
            name = "bandwidth"
            command = "./bandwidth --quick"
        "#})
        .expect("suite parses");

        assert_eq!(
            suite.run.log_location.as_deref(),
            Some(Utf8Path::new("/var/log/conformance"))
        );
        assert_eq!(
            suite.run.run_tests,
            Some(vec!["vectoradd".to_owned(), "bandwidth".to_owned()])
        );
        assert_eq!(suite.tests.len(), 2);
        assert_eq!(suite.tests[0].pass_pattern.as_deref(), Some("PASSED"));
        assert_eq!(suite.tests[1].pass_pattern, None);
    }

    #[test]
    fn empty_suite_is_valid() {
        let suite: SuiteConfig = toml::from_str("").expect("empty suite parses");
        assert_eq!(suite.run.log_location, None);
        assert_eq!(suite.run.run_tests, None);
        assert!(suite.tests.is_empty());
    }
}
