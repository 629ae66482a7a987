// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for pulling a `DataKey`'s resolved value(s) out of an
//! `InputBundle`, used by every built-in module.

use conflux_core::{DataKey, FileRef, InputBundle, InputEntry, ModuleError, OutputValue};

/// Every `OutputValue` bound to `key` across a bundle's `MainInput`/`Keyed`
/// entries, in entry order. `Split` entries are skipped — a module wanting
/// split-aware input reads `split_values_for` instead.
pub fn values_for(input: &InputBundle, key: &DataKey) -> Vec<OutputValue> {
    let mut values = Vec::new();
    for entry in &input.0 {
        match entry {
            InputEntry::MainInput(files) => {
                values.extend(
                    files
                        .iter()
                        .filter(|f| f.file_type == key.as_str())
                        .cloned()
                        .map(OutputValue::File),
                );
            }
            InputEntry::Keyed(map) => {
                if let Some(value) = map.get(key) {
                    values.push(value.clone());
                }
            }
            InputEntry::Split(_) => {}
        }
    }
    values
}

/// Every split's value bound to `key`, in split-declaration order, across
/// any `Split` entries in the bundle. Empty if no upstream produced a split.
pub fn split_values_for(input: &InputBundle, key: &DataKey) -> Vec<OutputValue> {
    let mut values = Vec::new();
    for entry in &input.0 {
        if let InputEntry::Split(splits) = entry {
            for record in splits.values() {
                if let Some(value) = record.values.get(key) {
                    values.push(value.clone());
                }
            }
        }
    }
    values
}

/// Resolves a single scalar value to a filesystem path, for command
/// templating. Errs on anything that isn't exactly one `File` (or a
/// single-element `List` of one).
pub fn single_path(tool_id: &str, key: &DataKey, values: &[OutputValue]) -> Result<String, ModuleError> {
    match values {
        [OutputValue::File(f)] => Ok(f.path.clone()),
        [OutputValue::List(items)] if items.len() == 1 => single_path(tool_id, key, items),
        [] => Err(ModuleError::CommandBuildFailed(format!(
            "tool '{tool_id}' has no resolved value for required key '{key}'"
        ))),
        _ => Err(ModuleError::CommandBuildFailed(format!(
            "tool '{tool_id}' key '{key}' resolves to more than one file; use a Splitter/Merger upstream instead"
        ))),
    }
}

/// All `FileRef`s bound to `key`, flattening any `List`/`File` shape. Used by
/// modules (like a fixed-count splitter) that fan out over every file a key
/// carries rather than expecting exactly one.
pub fn file_refs_for(input: &InputBundle, key: &DataKey) -> Vec<FileRef> {
    values_for(input, key).iter().flat_map(OutputValue::file_refs).cloned().collect()
}
