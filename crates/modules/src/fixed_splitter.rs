// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `FixedSplitter` (spec.md §4.2 "Built-in modules"): fans the files bound to
//! one input key out into a fixed number of evenly-sized splits, carrying a
//! fixed set of passthrough keys into every split unchanged. Grounded in the
//! original's `Splitter.make_split`/`add_output` pair via
//! `conflux_core::SplitBuilder` — this module never runs a remote command,
//! it only partitions already-resolved file handles.

use crate::input::{file_refs_for, values_for};
use conflux_core::{DataKey, InputBundle, ModuleContract, ModuleError, OutputBundle, OutputValue, SplitBuilder};
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Deserialize)]
pub struct FixedSplitterParams {
    /// Input key whose files are partitioned across the generated splits.
    pub split_key: String,
    pub num_splits: usize,
    /// Keys carried into every split unchanged (e.g. a shared reference file).
    #[serde(default)]
    pub passthrough: Vec<String>,
}

pub struct FixedSplitter {
    tool_id: String,
    split_key: DataKey,
    num_splits: usize,
    passthrough: Vec<DataKey>,
}

impl FixedSplitter {
    pub fn from_params(tool_id: &str, params: &serde_json::Value) -> Result<Self, ModuleError> {
        let parsed: FixedSplitterParams =
            serde_json::from_value(params.clone()).map_err(|e| ModuleError::CommandBuildFailed(e.to_string()))?;
        if parsed.num_splits == 0 {
            return Err(ModuleError::CommandBuildFailed(format!(
                "tool '{tool_id}' configured fixed_splitter with num_splits = 0"
            )));
        }
        Ok(Self {
            tool_id: tool_id.to_string(),
            split_key: DataKey::from(parsed.split_key),
            num_splits: parsed.num_splits,
            passthrough: parsed.passthrough.into_iter().map(DataKey::from).collect(),
        })
    }
}

impl ModuleContract for FixedSplitter {
    fn required_input_keys(&self) -> HashSet<DataKey> {
        let mut keys: HashSet<DataKey> = self.passthrough.iter().cloned().collect();
        keys.insert(self.split_key.clone());
        keys
    }

    fn declared_output_keys(&self) -> HashSet<DataKey> {
        self.required_input_keys()
    }

    fn build_command(&self, _input: &InputBundle) -> Result<String, ModuleError> {
        Ok("true".to_string())
    }

    fn collect_output(&self, input: &InputBundle, _stdout: &str, _stderr: &str) -> Result<OutputBundle, ModuleError> {
        let files = file_refs_for(input, &self.split_key);
        if files.is_empty() {
            return Err(ModuleError::CommandBuildFailed(format!(
                "tool '{}' has no files bound to split key '{}'",
                self.tool_id, self.split_key
            )));
        }

        let chunk_size = (files.len() + self.num_splits - 1) / self.num_splits;
        let mut builder = SplitBuilder::new(self.tool_id.clone());

        for (idx, chunk) in files.chunks(chunk_size.max(1)).enumerate() {
            let split_id = format!("split{idx}");
            builder.make_split(split_id.clone(), None)?;
            builder.add_output(
                &split_id,
                self.split_key.clone(),
                OutputValue::List(chunk.iter().cloned().map(OutputValue::File).collect()),
                false,
            )?;
            for key in &self.passthrough {
                if let Some(value) = values_for(input, key).into_iter().next() {
                    builder.add_output(&split_id, key.clone(), value, false)?;
                }
            }
        }

        Ok(OutputBundle::Split(builder.build()))
    }
}

#[cfg(test)]
#[path = "fixed_splitter_tests.rs"]
mod tests;
