// Copyright (c) The gpuconf Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by gpuconf.

use camino::Utf8PathBuf;
use std::io;
use thiserror::Error;

/// A fatal error raised while establishing the run's log hierarchy or log
/// file.
///
/// Setup errors are the only faults that abort a run: no test can be safely
/// attributed a log location once the hierarchy itself cannot be created.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SetupError {
    /// The current directory, used as the base log location when none is
    /// configured, could not be resolved.
    #[error("failed to resolve the current directory as the base log location")]
    CurrentDir(#[source] io::Error),

    /// The current directory is not valid UTF-8.
    #[error("current directory is not valid UTF-8")]
    CurrentDirInvalidUtf8(#[source] camino::FromPathBufError),

    /// A directory in the log hierarchy could not be created.
    #[error("failed to create log directory `{path}`")]
    CreateLogDir {
        /// The directory that could not be created.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The run log file could not be opened for writing.
    #[error("failed to open run log file `{path}`")]
    OpenLogFile {
        /// The log file path.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },
}

/// An error raised while writing the structured report document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportWriteError {
    /// The report file could not be created.
    #[error("failed to create report file `{path}`")]
    Create {
        /// The report file path.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The report could not be serialized into the file.
    #[error("failed to serialize report to `{path}`")]
    Serialize {
        /// The report file path.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },

    /// Buffered report output could not be flushed.
    #[error("failed to flush report file `{path}`")]
    Flush {
        /// The report file path.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },
}

/// The error surface of [`RunSession::execute`](crate::session::RunSession::execute).
///
/// Test-level and probe-level faults never appear here: they are contained
/// and converted into result values or absent facts.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunError {
    /// The log hierarchy or log file could not be set up.
    #[error("failed to set up the run log hierarchy")]
    Setup(#[from] SetupError),

    /// The structured report could not be written.
    #[error("failed to write the structured report")]
    ReportWrite(#[from] ReportWriteError),
}

/// An error raised while loading a suite definition file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SuiteReadError {
    /// The suite file could not be read.
    #[error("failed to read suite file `{path}`")]
    Read {
        /// The suite file path.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The suite file is not valid TOML for a suite definition.
    #[error("failed to parse suite file `{path}`")]
    Parse {
        /// The suite file path.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: toml::de::Error,
    },
}

/// Why a single environment fact could not be resolved.
///
/// Never escapes the probe: every variant is logged and converted into an
/// absent fact.
#[derive(Debug, Error)]
pub(crate) enum ProbeError {
    #[error("failed to run `{command}`")]
    Command {
        command: String,
        #[source]
        error: io::Error,
    },

    #[error("failed to read `{path}`")]
    ReadFile {
        path: Utf8PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("key `{key}` not found")]
    MissingKey { key: &'static str },

    /// The query tool ran but reported no devices. Distinct from a missing
    /// tool, though both surface as an absent fact.
    #[error("no devices reported")]
    NoDevices,

    #[error("empty output")]
    Empty,

    #[error("failed to parse `{path}`")]
    ParseJson {
        path: Utf8PathBuf,
        #[source]
        error: serde_json::Error,
    },
}
