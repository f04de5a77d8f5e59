// Copyright (c) The gpuconf Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI logic for gpuconf, exposed as a library for testing.

mod dispatch;

pub use dispatch::GpuconfApp;
