// Copyright (c) The gpuconf Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering of run outcomes.
//!
//! One [`RunOutcome`] snapshot feeds every channel: the tabular summary
//! (or its plain-text fallback when the `pretty-tables` renderer is
//! compiled out) and the structured `report.json` document. The textual
//! rows are materialized once and shared by both renderings, so the two
//! cannot diverge.

use crate::{
    classify::tests_with_status,
    errors::ReportWriteError,
    list::TestResult,
    probe::EnvironmentFacts,
    session::{RunOutcome, TIMESTAMP_FORMAT},
};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Write as _};
use tracing::info;

/// File name of the structured report inside the run's log directory.
pub const REPORT_FILE_NAME: &str = "report.json";

/// Placeholder rendered for an absent environment fact.
pub const UNAVAILABLE: &str = "unavailable";

const SUMMARY_FIELDS: [&str; 3] = ["Test Name", "Result", "Log"];
const METRICS_FIELDS: [&str; 5] = ["TOTAL", "PASS", "FAIL", "ERROR", "SKIP"];
const SYSTEM_INFO_FIELDS: [&str; 2] = ["Component", "Information"];

/// Machine-readable record of one run, serialized to `report.json`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct RunReport {
    /// Per-test entries, keyed by lowercased test name, in execution order.
    pub tests: IndexMap<String, TestReportEntry>,

    /// Number of selected tests.
    pub num_total: usize,

    /// Number of tests with result PASS.
    pub num_passed: usize,

    /// Number of tests with result FAIL.
    pub num_failed: usize,

    /// Number of tests with result ERROR.
    pub num_errored: usize,

    /// Number of tests with result SKIP.
    pub num_skipped: usize,

    /// The environment facts, each nullable.
    #[serde(flatten)]
    pub environment: EnvironmentFacts,

    /// Run start time, in the same format as the run directory name.
    pub start_datetime: String,

    /// Run end time, in the same format as the run directory name.
    pub end_datetime: String,

    /// The active test-name filter, if one was set.
    pub selected_test_filter: Option<Vec<String>>,
}

/// One test's entry in the structured report.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TestReportEntry {
    /// The terminal result.
    pub status: TestResult,

    /// Absolute log directory for this test.
    pub log_location: Utf8PathBuf,
}

/// Assembles the structured report from a run outcome.
pub fn build_report(outcome: &RunOutcome) -> RunReport {
    let tests = outcome
        .statuses
        .iter()
        .map(|(name, status)| {
            (
                name.clone(),
                TestReportEntry {
                    status: *status,
                    log_location: outcome.log_dirs[name].clone(),
                },
            )
        })
        .collect();

    RunReport {
        tests,
        num_total: outcome.statuses.len(),
        num_passed: tests_with_status(&outcome.statuses, TestResult::Pass).len(),
        num_failed: tests_with_status(&outcome.statuses, TestResult::Fail).len(),
        num_errored: tests_with_status(&outcome.statuses, TestResult::Error).len(),
        num_skipped: tests_with_status(&outcome.statuses, TestResult::Skip).len(),
        environment: outcome.environment.clone(),
        start_datetime: outcome.started_at.format(TIMESTAMP_FORMAT).to_string(),
        end_datetime: outcome.finished_at.format(TIMESTAMP_FORMAT).to_string(),
        selected_test_filter: outcome.selected_test_filter.clone(),
    }
}

/// Writes the structured report to `report.json` under `run_log_root`,
/// returning the written path.
pub fn write_json(report: &RunReport, run_log_root: &Utf8Path) -> Result<Utf8PathBuf, ReportWriteError> {
    let path = run_log_root.join(REPORT_FILE_NAME);
    let file = std::fs::File::create(&path).map_err(|error| ReportWriteError::Create {
        path: path.clone(),
        error,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report).map_err(|error| {
        ReportWriteError::Serialize {
            path: path.clone(),
            error,
        }
    })?;
    writer.flush().map_err(|error| ReportWriteError::Flush {
        path: path.clone(),
        error,
    })?;
    Ok(path)
}

/// Logs the run summary: results, metrics, and system information.
///
/// Rendered as tables when the `pretty-tables` renderer is available, as
/// pipe-delimited plain text otherwise. Both forms consume the same rows.
pub fn emit_summary(outcome: &RunOutcome) {
    let summary = summary_rows(outcome);
    let metrics = metrics_row(&outcome.statuses);
    let system_info = system_info_rows(&outcome.environment);

    #[cfg(feature = "pretty-tables")]
    {
        let [summary_table, metrics_table, system_info_table] =
            render_tables(&summary, &metrics, &system_info);
        info!("\nSummary\n{summary_table}");
        info!("\nMetrics\n{metrics_table}");
        info!("\nSystem Information\n{system_info_table}");
    }

    #[cfg(not(feature = "pretty-tables"))]
    {
        for line in plain_lines(&summary, &metrics, &system_info) {
            info!("{line}");
        }
    }
}

/// Summary rows (test name, result, relative log path) in the fixed group
/// order PASS, FAIL, ERROR, SKIP, preserving classifier order within each
/// group.
fn summary_rows(outcome: &RunOutcome) -> Vec<[String; 3]> {
    let mut rows = Vec::with_capacity(outcome.statuses.len());
    for status in TestResult::ALL {
        for (name, recorded) in tests_with_status(&outcome.statuses, status) {
            let log = outcome.relative_log_dirs[&name].to_string();
            rows.push([name, recorded.name().to_owned(), log]);
        }
    }
    rows
}

fn metrics_row(statuses: &IndexMap<String, TestResult>) -> [String; 5] {
    let count = |status| tests_with_status(statuses, status).len().to_string();
    [
        statuses.len().to_string(),
        count(TestResult::Pass),
        count(TestResult::Fail),
        count(TestResult::Error),
        count(TestResult::Skip),
    ]
}

/// System-information rows. An absent fact renders as the explicit
/// [`UNAVAILABLE`] placeholder, never as an empty field.
fn system_info_rows(facts: &EnvironmentFacts) -> Vec<[String; 2]> {
    let field = |value: &Option<String>| {
        value.clone().unwrap_or_else(|| UNAVAILABLE.to_owned())
    };
    let list = |value: &Option<Vec<String>>| match value {
        Some(items) => items.join(", "),
        None => UNAVAILABLE.to_owned(),
    };
    vec![
        [
            "OS".to_owned(),
            format!("{} {}", field(&facts.os_name), field(&facts.os_version)),
        ],
        ["ROCm Agents".to_owned(), list(&facts.rocm_agents)],
        ["ROCm Version".to_owned(), field(&facts.rocm_version)],
        ["CUDA RT Version".to_owned(), field(&facts.cuda_rt_version)],
        ["CUDA GPUs".to_owned(), list(&facts.cuda_gpus)],
    ]
}

#[cfg(feature = "pretty-tables")]
fn render_tables(
    summary: &[[String; 3]],
    metrics: &[String; 5],
    system_info: &[[String; 2]],
) -> [String; 3] {
    use comfy_table::{Table, presets::ASCII_FULL};

    let mut summary_table = Table::new();
    summary_table.load_preset(ASCII_FULL);
    summary_table.set_header(SUMMARY_FIELDS);
    for row in summary {
        summary_table.add_row(row.clone());
    }

    let mut metrics_table = Table::new();
    metrics_table.load_preset(ASCII_FULL);
    metrics_table.set_header(METRICS_FIELDS);
    metrics_table.add_row(metrics.clone());

    let mut system_info_table = Table::new();
    system_info_table.load_preset(ASCII_FULL);
    system_info_table.set_header(SYSTEM_INFO_FIELDS);
    for row in system_info {
        system_info_table.add_row(row.clone());
    }

    [
        summary_table.to_string(),
        metrics_table.to_string(),
        system_info_table.to_string(),
    ]
}

/// The plain-text fallback: the same three groupings as pipe-delimited
/// lines with header rows, field order and content identical to the
/// tabular form. Used for the summary when the `pretty-tables` renderer is
/// compiled out.
pub fn plain_lines(
    summary: &[[String; 3]],
    metrics: &[String; 5],
    system_info: &[[String; 2]],
) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push("********Summary********".to_owned());
    lines.push(SUMMARY_FIELDS.join(" | "));
    for row in summary {
        lines.push(row.join(" | "));
    }
    lines.push("********Metrics********".to_owned());
    lines.push(METRICS_FIELDS.join(" | "));
    lines.push(metrics.join(" | "));
    lines.push("********System Information********".to_owned());
    lines.push(SYSTEM_INFO_FIELDS.join(" | "));
    for row in system_info {
        lines.push(row.join(" | "));
    }
    lines
}
