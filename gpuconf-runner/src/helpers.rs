// Copyright (c) The gpuconf Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for gpuconf-runner.

use std::any::Any;
use std::error::Error;
use std::fmt::Write as _;

/// Renders an error together with its source chain on one line.
pub(crate) fn error_chain(error: &dyn Error) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(out, ": {cause}");
        source = cause.source();
    }
    out
}

/// Extracts a human-readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "(non-string panic payload)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn error_chain_includes_sources() {
        #[derive(Debug, thiserror::Error)]
        #[error("outer failure")]
        struct Outer(#[source] io::Error);

        let error = Outer(io::Error::new(io::ErrorKind::NotFound, "inner failure"));
        assert_eq!(error_chain(&error), "outer failure: inner failure");
    }

    #[test]
    fn panic_message_handles_both_payload_kinds() {
        let static_payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(static_payload.as_ref()), "static message");

        let owned_payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(owned_payload.as_ref()), "owned message");

        let other_payload: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(other_payload.as_ref()), "(non-string panic payload)");
    }
}
