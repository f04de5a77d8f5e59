// Copyright (c) The gpuconf Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::Parser;
use color_eyre::Result;
use gpuconf_cli::GpuconfApp;

fn main() -> Result<()> {
    color_eyre::install()?;
    let app = GpuconfApp::parse();
    let code = app.exec()?;
    std::process::exit(code)
}
