// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ShellTool` (spec.md §4.2 "Built-in modules"): a generic `Tool` that
//! renders a config-supplied command template against its resolved input
//! keys, analogous to a thin wrapper module around a single bioinformatics
//! binary (`bwa`, `samtools`, ...). Output paths are declared up front in
//! config rather than discovered from stdout, matching how the original's
//! `Tool` subclasses call `add_output` with a predetermined path before
//! `define_command` even runs.

use crate::input::{single_path, values_for};
use conflux_core::{
    DataKey, FileRef, InputBundle, ModuleContract, ModuleError, OutputBundle, OutputValue,
    ResourceRequest,
};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Deserialize)]
pub struct ShellToolParams {
    #[serde(default)]
    pub requires: Vec<String>,
    /// Output key -> path template. `{tool_id}` is substituted before any
    /// other placeholder.
    #[serde(default)]
    pub outputs: IndexMap<String, String>,
    /// Shell command template; every required key's resolved path is
    /// substituted for its `{key}` placeholder, and every declared output's
    /// final path is substituted for `{out.key}`.
    pub command: String,
    #[serde(default)]
    pub required_tools: Vec<String>,
    #[serde(default)]
    pub cpus: Option<u32>,
    #[serde(default)]
    pub mem_gb: Option<u32>,
    #[serde(default)]
    pub disk_gb: Option<u32>,
}

pub struct ShellTool {
    tool_id: String,
    required: Vec<DataKey>,
    outputs: IndexMap<DataKey, String>,
    command: String,
    required_tools: HashSet<String>,
    resources: ResourceRequest,
}

impl ShellTool {
    pub fn from_params(tool_id: &str, params: &serde_json::Value) -> Result<Self, ModuleError> {
        let parsed: ShellToolParams =
            serde_json::from_value(params.clone()).map_err(|e| ModuleError::CommandBuildFailed(e.to_string()))?;

        let outputs: IndexMap<DataKey, String> = parsed
            .outputs
            .into_iter()
            .map(|(key, template)| (DataKey::from(key), template.replace("{tool_id}", tool_id)))
            .collect();

        let mut resources = ResourceRequest::default();
        if let Some(cpus) = parsed.cpus {
            resources.cpus = cpus;
        }
        if let Some(mem_gb) = parsed.mem_gb {
            resources.mem_gb = mem_gb;
        }
        if let Some(disk_gb) = parsed.disk_gb {
            resources.disk_gb = disk_gb;
        }

        Ok(Self {
            tool_id: tool_id.to_string(),
            required: parsed.requires.into_iter().map(DataKey::from).collect(),
            outputs,
            command: parsed.command,
            required_tools: parsed.required_tools.into_iter().collect(),
            resources,
        })
    }
}

impl ModuleContract for ShellTool {
    fn required_input_keys(&self) -> HashSet<DataKey> {
        self.required.iter().cloned().collect()
    }

    fn declared_output_keys(&self) -> HashSet<DataKey> {
        self.outputs.keys().cloned().collect()
    }

    fn required_tools(&self) -> HashSet<String> {
        self.required_tools.clone()
    }

    fn resource_request(&self) -> ResourceRequest {
        self.resources
    }

    fn build_command(&self, input: &InputBundle) -> Result<String, ModuleError> {
        let mut command = self.command.clone();
        for key in &self.required {
            let path = single_path(&self.tool_id, key, &values_for(input, key))?;
            command = command.replace(&format!("{{{key}}}"), &path);
        }
        for (key, path) in &self.outputs {
            command = command.replace(&format!("{{out.{key}}}"), path);
        }
        Ok(command)
    }

    fn collect_output(&self, _input: &InputBundle, _stdout: &str, _stderr: &str) -> Result<OutputBundle, ModuleError> {
        let mut map = IndexMap::new();
        for (key, path) in &self.outputs {
            let file_id = format!("{}.{}", self.tool_id, key);
            map.insert(key.clone(), OutputValue::File(FileRef::new(file_id, key.as_str(), path.clone())));
        }
        Ok(OutputBundle::Keyed(map))
    }
}

#[cfg(test)]
#[path = "shell_tool_tests.rs"]
mod tests;
