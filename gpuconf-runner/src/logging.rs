// Copyright (c) The gpuconf Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run-scoped dual-sink logging.
//!
//! Each run owns its own subscriber: one sink mirrors to the console, one
//! writes `report.log` inside the run's timestamped directory. Both share
//! the `timestamp - target - LEVEL - message` line format and a DEBUG
//! floor. The subscriber is installed only for the scope of the run, never
//! as the process-global default.

use crate::errors::SetupError;
use camino::Utf8Path;
use chrono::Local;
use std::{fs::File, io, sync::Arc};
use tracing::{Dispatch, Event, Subscriber};
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{
        self, FmtContext, FormatEvent, FormatFields,
        format::Writer,
    },
    layer::SubscriberExt,
    registry::LookupSpan,
};

/// The line format shared by both sinks.
struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        write!(
            writer,
            "{} - {} - {} - ",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            metadata.target(),
            metadata.level(),
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Logger owned by one run.
pub(crate) struct RunLogger {
    dispatch: Dispatch,
}

impl RunLogger {
    /// Builds the dual-sink subscriber, opening `log_file` for the file
    /// sink. Failure to open the file is a fatal setup error.
    pub(crate) fn new(log_file: &Utf8Path) -> Result<Self, SetupError> {
        let file = File::create(log_file).map_err(|error| SetupError::OpenLogFile {
            path: log_file.to_owned(),
            error,
        })?;

        let subscriber = tracing_subscriber::registry()
            .with(LevelFilter::DEBUG)
            .with(fmt::layer().event_format(LineFormat).with_writer(io::stdout))
            .with(
                fmt::layer()
                    .event_format(LineFormat)
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            );
        Ok(Self {
            dispatch: Dispatch::new(subscriber),
        })
    }

    /// Runs `f` with this logger installed as the default subscriber.
    pub(crate) fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use tracing::{debug, info, trace};

    #[test]
    fn both_sinks_share_the_line_format_and_debug_floor() {
        let dir = Utf8TempDir::new().expect("tempdir");
        let log_file = dir.path().join("report.log");
        let logger = RunLogger::new(&log_file).expect("logger builds");

        logger.scope(|| {
            info!("run started");
            debug!("debug detail");
            trace!("below the floor");
        });

        let contents = std::fs::read_to_string(&log_file).expect("log file readable");
        let info_line = contents
            .lines()
            .find(|line| line.ends_with("run started"))
            .expect("info line recorded");
        assert!(info_line.contains(" - INFO - "), "line: {info_line}");
        assert!(
            info_line.contains("gpuconf_runner::logging"),
            "line: {info_line}"
        );
        assert!(contents.contains(" - DEBUG - debug detail"));
        assert!(!contents.contains("below the floor"));
    }

    #[test]
    fn unopenable_log_file_is_a_setup_error() {
        let result = RunLogger::new(Utf8Path::new("/nonexistent-dir/report.log"));
        assert!(matches!(result, Err(SetupError::OpenLogFile { .. })));
    }
}
