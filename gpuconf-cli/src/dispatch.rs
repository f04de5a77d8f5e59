// Copyright (c) The gpuconf Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use gpuconf_runner::{
    config::SuiteConfig,
    list::{SuiteSelector, TestResult},
    probe::EnvironmentProbe,
    session::RunSession,
    workload::suite_tests,
};

/// A hardware-conformance test harness.
#[derive(Debug, Parser)]
#[command(name = "gpuconf", version, about)]
pub struct GpuconfApp {
    #[command(subcommand)]
    command: Command,
}

impl GpuconfApp {
    /// Executes the selected subcommand, returning the process exit code.
    pub fn exec(self) -> Result<i32> {
        match self.command {
            Command::Run(opts) => opts.exec(),
            Command::Probe => {
                let facts = EnvironmentProbe::default().collect();
                println!("{}", serde_json::to_string_pretty(&facts)?);
                Ok(0)
            }
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the tests a suite file defines
    Run(RunOpts),

    /// Print the host and accelerator facts as JSON
    Probe,
}

#[derive(Debug, Args)]
struct RunOpts {
    /// Path to the suite definition file
    #[arg(long, value_name = "PATH", default_value = "suite.toml")]
    suite: Utf8PathBuf,

    /// Base directory for report output [default: current directory]
    #[arg(long, value_name = "DIR")]
    log_location: Option<Utf8PathBuf>,

    /// Only run the named tests (repeatable)
    #[arg(short = 't', long = "test", value_name = "NAME")]
    tests: Vec<String>,
}

impl RunOpts {
    fn exec(self) -> Result<i32> {
        let suite = SuiteConfig::from_path(&self.suite)
            .wrap_err_with(|| format!("failed to load suite `{}`", self.suite))?;

        let mut config = suite.run.clone();
        if let Some(log_location) = self.log_location {
            config.log_location = Some(log_location);
        }
        if !self.tests.is_empty() {
            config.run_tests = Some(self.tests);
        }

        let tests = suite_tests(&suite).wrap_err("invalid pass pattern in suite")?;
        let selector = SuiteSelector::new(tests).with_filter(config.run_tests.clone());

        let outcome = RunSession::new(&config).execute(&selector)?;

        let any_bad = outcome
            .statuses
            .values()
            .any(|status| matches!(status, TestResult::Fail | TestResult::Error));
        Ok(if any_bad { 1 } else { 0 })
    }
}
