// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The module capability contract (spec.md §4.2) and the split/output
//! bundle shapes a module's execution produces.

use crate::error::ModuleError;
use crate::file::{FileRef, OutputValue};
use crate::ids::DataKey;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;

pub type SplitId = String;

/// One upstream's resolved contribution to a node's input, in `input_from` declaration order.
#[derive(Debug, Clone)]
pub enum InputEntry {
    /// Resolved `main_input` contribution: the pipeline's initial file list.
    MainInput(Vec<FileRef>),
    /// A single upstream `Tool`/`Merger`'s keyed output.
    Keyed(IndexMap<DataKey, OutputValue>),
    /// A single upstream `Splitter`'s output, grouped by split id.
    Split(SplitMap),
}

/// Ordered bundle of resolved upstream inputs handed to `Node::set_input`.
#[derive(Debug, Clone, Default)]
pub struct InputBundle(pub Vec<InputEntry>);

impl InputBundle {
    pub fn new(entries: Vec<InputEntry>) -> Self {
        Self(entries)
    }

    /// Flattened union of every `FileRef` visible across all input entries,
    /// regardless of which upstream or split produced it.
    pub fn all_file_refs(&self) -> Vec<&FileRef> {
        self.0
            .iter()
            .flat_map(|entry| match entry {
                InputEntry::MainInput(files) => files.iter().collect::<Vec<_>>(),
                InputEntry::Keyed(map) => map.values().flat_map(OutputValue::file_refs).collect(),
                InputEntry::Split(splits) => {
                    splits.values().flat_map(|s| s.values.values()).flat_map(OutputValue::file_refs).collect()
                }
            })
            .collect()
    }
}

/// A single named split produced by a Splitter (spec.md §3 "Split").
#[derive(Debug, Clone, Default, Serialize)]
pub struct SplitRecord {
    /// `None` means "all samples visible".
    pub visible_samples: Option<Vec<String>>,
    pub values: IndexMap<DataKey, OutputValue>,
}

pub type SplitMap = IndexMap<SplitId, SplitRecord>;

/// What a node's worker produces once its command has run and the module
/// has parsed the result (spec.md §4.3 `get_output`).
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutputBundle {
    Keyed(IndexMap<DataKey, OutputValue>),
    Split(SplitMap),
}

impl OutputBundle {
    pub fn declared_keys(&self) -> HashSet<DataKey> {
        match self {
            OutputBundle::Keyed(map) => map.keys().cloned().collect(),
            OutputBundle::Split(splits) => {
                splits.values().flat_map(|s| s.values.keys()).cloned().collect()
            }
        }
    }
}

/// Builder used by Splitter-kind modules to accumulate their output
/// (spec.md §4.2 "Splitter specialization"). Mirrors the original's
/// `make_split`/`add_output` pair, including the `DuplicateSplit` /
/// `UnknownSplit` / `DuplicateOutputKey` invariants and the
/// `"{module_id}.{split_id}.{key}"` file-id convention.
#[derive(Debug, Clone)]
pub struct SplitBuilder {
    module_id: String,
    splits: SplitMap,
}

impl SplitBuilder {
    pub fn new(module_id: impl Into<String>) -> Self {
        Self { module_id: module_id.into(), splits: IndexMap::new() }
    }

    pub fn make_split(
        &mut self,
        split_id: impl Into<String>,
        visible_samples: Option<Vec<String>>,
    ) -> Result<(), ModuleError> {
        let split_id = split_id.into();
        if self.splits.contains_key(&split_id) {
            return Err(ModuleError::DuplicateSplit(split_id));
        }
        self.splits.insert(split_id, SplitRecord { visible_samples, values: IndexMap::new() });
        Ok(())
    }

    /// Add one output to a previously-declared split. When `is_path` is set,
    /// `value` is wrapped (recursively, for lists) into a `FileRef` using
    /// `file_id = "{module_id}.{split_id}.{key}"`.
    pub fn add_output(
        &mut self,
        split_id: &str,
        key: DataKey,
        value: OutputValue,
        is_path: bool,
    ) -> Result<(), ModuleError> {
        let module_id = self.module_id.clone();
        let record = self.splits.get_mut(split_id).ok_or_else(|| ModuleError::UnknownSplit(split_id.to_string()))?;
        if record.values.contains_key(&key) {
            return Err(ModuleError::DuplicateOutputKey { split_id: split_id.to_string(), key: key.to_string() });
        }
        let wrapped = if is_path {
            wrap_as_file_ref(&module_id, split_id, key.as_str(), value)
        } else {
            value
        };
        record.values.insert(key, wrapped);
        Ok(())
    }

    pub fn build(self) -> SplitMap {
        self.splits
    }
}

fn wrap_as_file_ref(module_id: &str, split_id: &str, key: &str, value: OutputValue) -> OutputValue {
    match value {
        OutputValue::List(items) => {
            OutputValue::List(items.into_iter().map(|v| wrap_as_file_ref(module_id, split_id, key, v)).collect())
        }
        OutputValue::Raw(serde_json::Value::String(path)) => {
            OutputValue::File(FileRef::new(format!("{module_id}.{split_id}.{key}"), key, path))
        }
        already_wrapped => already_wrapped,
    }
}

/// The capability every module must provide (spec.md §4.2).
///
/// The core interacts with modules strictly through these operations.
pub trait ModuleContract: Send + Sync {
    /// Inputs this module reads.
    fn required_input_keys(&self) -> HashSet<DataKey>;

    /// Outputs this module produces.
    fn declared_output_keys(&self) -> HashSet<DataKey>;

    /// Environmental tool dependencies, validated against the global config catalog.
    fn required_tools(&self) -> HashSet<String> {
        HashSet::new()
    }

    /// Environmental resource dependencies, validated against the global config catalog.
    fn required_resources(&self) -> HashSet<String> {
        HashSet::new()
    }

    /// The shell command to execute on the processor for the given resolved input.
    fn build_command(&self, input: &InputBundle) -> Result<String, ModuleError>;

    /// Parse the remote command's result into this module's output bundle.
    fn collect_output(
        &self,
        input: &InputBundle,
        stdout: &str,
        stderr: &str,
    ) -> Result<OutputBundle, ModuleError>;

    /// Resource requirements this module asks of its processor (cpu/mem/disk).
    fn resource_request(&self) -> ResourceRequest {
        ResourceRequest::default()
    }
}

/// Resource requirements a module declares for the processor it runs on.
#[derive(Debug, Clone, Copy)]
pub struct ResourceRequest {
    pub cpus: u32,
    pub mem_gb: u32,
    pub disk_gb: u32,
}

impl Default for ResourceRequest {
    fn default() -> Self {
        Self { cpus: 1, mem_gb: 4, disk_gb: 20 }
    }
}

/// The three module variants (spec.md §2 component B). The core never
/// matches deeply on this beyond dispatching `ModuleContract` — the
/// variant only exists so the registry and CLI can report what kind of
/// module a config entry selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    Tool,
    Splitter,
    Merger,
}

/// A constructed module instance paired with its declared kind.
pub struct ModuleInstance {
    pub kind: ModuleKind,
    pub contract: Box<dyn ModuleContract>,
}

#[cfg(test)]
#[path = "module_tests.rs"]
mod tests;