// Copyright (c) The gpuconf Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort host and accelerator inventory collection.
//!
//! Every fact is obtained by an independent query; a source that fails in
//! any way (missing tool, non-zero exit, malformed output, missing file)
//! records an absent value and never affects the other sources. Absence is
//! a normal state for a fact, not an error for the run.

use crate::errors::ProbeError;
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

/// Host and accelerator facts collected for reporting.
///
/// Each field is independently present or absent.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct EnvironmentFacts {
    /// Operating-system name, from os-release `NAME`.
    pub os_name: Option<String>,

    /// Operating-system version, from os-release `VERSION_ID`.
    pub os_version: Option<String>,

    /// ROCm agent names reported by rocminfo.
    pub rocm_agents: Option<Vec<String>>,

    /// CUDA GPU names reported by nvidia-smi.
    pub cuda_gpus: Option<Vec<String>>,

    /// CUDA runtime version from the CUDA installation's version manifest.
    pub cuda_rt_version: Option<String>,

    /// Installed ROCm stack version from the installation's version file.
    pub rocm_version: Option<String>,
}

/// Probe over a fixed set of host information sources.
///
/// The source locations default to the system paths and can be redirected,
/// which is how tests simulate partial availability.
#[derive(Clone, Debug)]
pub struct EnvironmentProbe {
    /// Path to the os-release metadata file.
    pub os_release: Utf8PathBuf,

    /// Path to the rocminfo agent-inventory tool.
    pub rocminfo: Utf8PathBuf,

    /// Path to the ROCm installation's version file.
    pub rocm_version_file: Utf8PathBuf,

    /// Path to the CUDA installation's version manifest.
    pub cuda_version_file: Utf8PathBuf,

    /// Name or path of the nvidia-smi GPU query tool.
    pub nvidia_smi: Utf8PathBuf,
}

impl Default for EnvironmentProbe {
    fn default() -> Self {
        Self {
            os_release: "/etc/os-release".into(),
            rocminfo: "/opt/rocm/bin/rocminfo".into(),
            rocm_version_file: "/opt/rocm/.info/version".into(),
            cuda_version_file: "/usr/local/cuda/version.json".into(),
            nvidia_smi: "nvidia-smi".into(),
        }
    }
}

impl EnvironmentProbe {
    /// Collects every fact, tolerating per-source failure independently.
    pub fn collect(&self) -> EnvironmentFacts {
        EnvironmentFacts {
            os_name: absent_on_error("OS name", self.os_name()),
            os_version: absent_on_error("OS version", self.os_version()),
            rocm_agents: absent_on_error("ROCm agents", self.rocm_agents()),
            cuda_gpus: absent_on_error("CUDA GPUs", self.cuda_gpus()),
            cuda_rt_version: absent_on_error("CUDA RT version", self.cuda_rt_version()),
            rocm_version: absent_on_error("ROCm version", self.rocm_version()),
        }
    }

    fn os_name(&self) -> Result<String, ProbeError> {
        self.os_release_field("NAME")
    }

    fn os_version(&self) -> Result<String, ProbeError> {
        self.os_release_field("VERSION_ID")
    }

    fn os_release_field(&self, key: &'static str) -> Result<String, ProbeError> {
        let text = read_file(&self.os_release)?;
        os_release_value(&text, key).ok_or(ProbeError::MissingKey { key })
    }

    fn rocm_agents(&self) -> Result<Vec<String>, ProbeError> {
        let output = run_tool(duct::cmd(
            self.rocminfo.as_str(),
            std::iter::empty::<&str>(),
        ))
        .map_err(|error| ProbeError::Command {
            command: self.rocminfo.to_string(),
            error,
        })?;
        let agents = rocm_agent_names(&output);
        if agents.is_empty() {
            // The tool ran but saw no agents; reported as absent, like a
            // missing tool.
            return Err(ProbeError::NoDevices);
        }
        Ok(agents)
    }

    fn cuda_gpus(&self) -> Result<Vec<String>, ProbeError> {
        let output = run_tool(duct::cmd(
            self.nvidia_smi.as_str(),
            ["--query-gpu=name", "--format=csv,noheader"],
        ))
        .map_err(|error| ProbeError::Command {
            command: self.nvidia_smi.to_string(),
            error,
        })?;
        let gpus: Vec<String> = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();
        if gpus.is_empty() {
            return Err(ProbeError::NoDevices);
        }
        Ok(gpus)
    }

    fn cuda_rt_version(&self) -> Result<String, ProbeError> {
        let text = read_file(&self.cuda_version_file)?;
        let manifest: serde_json::Value =
            serde_json::from_str(&text).map_err(|error| ProbeError::ParseJson {
                path: self.cuda_version_file.clone(),
                error,
            })?;
        manifest
            .pointer("/cuda_cudart/version")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned)
            .ok_or(ProbeError::MissingKey {
                key: "cuda_cudart.version",
            })
    }

    fn rocm_version(&self) -> Result<String, ProbeError> {
        let version = read_file(&self.rocm_version_file)?.trim().to_owned();
        if version.is_empty() {
            return Err(ProbeError::Empty);
        }
        Ok(version)
    }
}

fn absent_on_error<T>(what: &str, result: Result<T, ProbeError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            debug!(
                "environment fact `{what}` unavailable: {}",
                crate::helpers::error_chain(&error)
            );
            None
        }
    }
}

fn read_file(path: &Utf8Path) -> Result<String, ProbeError> {
    std::fs::read_to_string(path).map_err(|error| ProbeError::ReadFile {
        path: path.to_owned(),
        error,
    })
}

/// Runs a query tool, capturing stdout. A non-zero exit reports as an error.
fn run_tool(command: duct::Expression) -> Result<String, std::io::Error> {
    command.stderr_null().read()
}

/// Extracts a `key=value` field from os-release text, tolerating
/// surrounding whitespace and double quoting.
fn os_release_value(text: &str, key: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let (field, value) = line.split_once('=')?;
        if field.trim() != key {
            return None;
        }
        let value = value.trim().trim_matches('"').to_owned();
        (!value.is_empty()).then_some(value)
    })
}

/// Agent names from rocminfo output. Only the top-level `Name:` lines are
/// agent names; the deeper-indented ISA `Name:` lines are not.
fn rocm_agent_names(output: &str) -> Vec<String> {
    static AGENT_NAME: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^  Name:\s+(.+)$").expect("valid regex"));
    AGENT_NAME
        .captures_iter(output)
        .map(|captures| captures[1].trim().to_owned())
        .collect()
}
