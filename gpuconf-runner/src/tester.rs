// Copyright (c) The gpuconf Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The tester capability interface and per-invocation test data.
//!
//! A [`Tester`] knows how to build, run, and clean one workload. Each
//! implementation declares the concrete [`TestData`] variant its `run`
//! expects through the [`Tester::new_data`] factory; the execution loop
//! instantiates exactly that variant without knowing its shape. A tester
//! that carries extra per-invocation fields reaches them back through
//! [`TestData::as_any_mut`] — the one narrowly-scoped downcast in the
//! system.

use crate::{config::RunConfig, list::TestResult};
use camino::Utf8PathBuf;
use std::any::Any;
use std::error::Error;

/// The error type testers may surface from `run` and `clean`.
pub type TesterError = Box<dyn Error + Send + Sync + 'static>;

/// Capability interface implemented per workload or vendor variant.
pub trait Tester: Send + Sync {
    /// Builds the concrete test-data variant this tester's `run` expects.
    fn new_data(&self) -> Box<dyn TestData>;

    /// Executes the workload, recording the outcome on `data`.
    ///
    /// Invoked under fault containment: an `Err` return or a panic forces
    /// the recorded result to [`TestResult::Error`] without aborting the
    /// run.
    fn run(&self, data: &mut dyn TestData) -> Result<(), TesterError>;

    /// Tears down whatever `run` built.
    ///
    /// Must be idempotent and safe to call even if `run` never completed.
    fn clean(&self) -> Result<(), TesterError>;
}

/// Fields shared by every test-data variant.
#[derive(Clone, Debug, Default)]
pub struct TestDataCore {
    /// Lowercased name of the test this invocation belongs to.
    pub test_name: String,

    /// Directory reserved for this invocation's logs. Created before the
    /// tester runs.
    pub log_dir: Utf8PathBuf,

    /// Terminal result. Unset until `run` records it or the loop forces it
    /// on a fault.
    pub result: Option<TestResult>,
}

/// Per-invocation mutable context handed to [`Tester::run`].
///
/// Created fresh for each test, owned by the execution loop for the
/// duration of that test, read-only afterwards.
pub trait TestData: Any {
    /// The shared core fields.
    fn core(&self) -> &TestDataCore;

    /// Mutable access to the shared core fields.
    fn core_mut(&mut self) -> &mut TestDataCore;

    /// Configuration-injection hook. Variants that consume run
    /// configuration override this; the default is a no-op.
    fn apply_config(&mut self, _config: &RunConfig) {}

    /// Downcasting access for the owning tester's variant-specific fields.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// The test-data variant with no fields beyond the core.
#[derive(Clone, Debug, Default)]
pub struct BasicTestData {
    /// The shared core fields.
    pub core: TestDataCore,
}

impl TestData for BasicTestData {
    fn core(&self) -> &TestDataCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TestDataCore {
        &mut self.core
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct TimeoutTestData {
        core: TestDataCore,
        timeout_secs: u64,
    }

    impl TestData for TimeoutTestData {
        fn core(&self) -> &TestDataCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut TestDataCore {
            &mut self.core
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn variant_fields_are_reachable_through_downcast() {
        let mut data: Box<dyn TestData> = Box::new(TimeoutTestData::default());
        let variant = data
            .as_any_mut()
            .downcast_mut::<TimeoutTestData>()
            .expect("factory-built variant downcasts to itself");
        variant.timeout_secs = 30;
        variant.core.result = Some(TestResult::Skip);
        assert_eq!(variant.timeout_secs, 30);

        assert_eq!(data.core().result, Some(TestResult::Skip));
    }
}
