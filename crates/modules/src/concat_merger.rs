// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ConcatMerger` (spec.md §4.2 "Built-in modules"): the inverse of a
//! Splitter, gathering a fixed set of keys back across every split an
//! upstream Splitter produced into a single `List` per key. Like
//! `FixedSplitter`, this never runs a remote command — it only reshapes
//! already-resolved split output.

use crate::input::split_values_for;
use conflux_core::{DataKey, InputBundle, ModuleContract, ModuleError, OutputBundle, OutputValue};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Deserialize)]
pub struct ConcatMergerParams {
    pub keys: Vec<String>,
}

pub struct ConcatMerger {
    tool_id: String,
    keys: Vec<DataKey>,
}

impl ConcatMerger {
    pub fn from_params(tool_id: &str, params: &serde_json::Value) -> Result<Self, ModuleError> {
        let parsed: ConcatMergerParams =
            serde_json::from_value(params.clone()).map_err(|e| ModuleError::CommandBuildFailed(e.to_string()))?;
        if parsed.keys.is_empty() {
            return Err(ModuleError::CommandBuildFailed(format!(
                "tool '{tool_id}' configured concat_merger with no keys to merge"
            )));
        }
        Ok(Self { tool_id: tool_id.to_string(), keys: parsed.keys.into_iter().map(DataKey::from).collect() })
    }
}

impl ModuleContract for ConcatMerger {
    fn required_input_keys(&self) -> HashSet<DataKey> {
        self.keys.iter().cloned().collect()
    }

    fn declared_output_keys(&self) -> HashSet<DataKey> {
        self.keys.iter().cloned().collect()
    }

    fn build_command(&self, _input: &InputBundle) -> Result<String, ModuleError> {
        Ok("true".to_string())
    }

    fn collect_output(&self, input: &InputBundle, _stdout: &str, _stderr: &str) -> Result<OutputBundle, ModuleError> {
        let mut map = IndexMap::new();
        for key in &self.keys {
            let values = split_values_for(input, key);
            if values.is_empty() {
                return Err(ModuleError::OutputContractViolation(format!(
                    "tool '{}' found no split values to merge for key '{}'",
                    self.tool_id, key
                )));
            }
            map.insert(key.clone(), OutputValue::List(values));
        }
        Ok(OutputBundle::Keyed(map))
    }
}

#[cfg(test)]
#[path = "concat_merger_tests.rs"]
mod tests;
