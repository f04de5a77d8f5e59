// Copyright (c) The gpuconf Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for [gpuconf](https://crates.io/crates/gpuconf-cli), a
//! hardware-conformance test harness.
//!
//! The engine runs each selected test strictly sequentially under fault
//! containment, classifies the outcomes, probes the host for system and
//! accelerator inventory, and renders one tabular (or plain-text) summary
//! plus a structured `report.json` document per run. Test discovery, the
//! per-workload build/run/clean lifecycle, and verdict parsing all live
//! behind capability traits; reference implementations are provided in
//! [`workload`].

pub mod classify;
pub mod config;
pub mod errors;
mod helpers;
pub mod list;
mod logging;
pub mod probe;
pub mod report;
pub mod runner;
pub mod session;
pub mod tester;
pub mod workload;
