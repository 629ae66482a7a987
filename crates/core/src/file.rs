// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-datastore handles (spec.md §3 "FileRef", §6 "File-datastore collaborator").
//!
//! The real file-datastore abstraction (path resolution, staging, remote
//! copy) is an external collaborator; the core only needs the handle shape
//! it hands around.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Immutable handle to a file artifact produced by a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub file_id: String,
    pub file_type: String,
    pub path: String,
    /// Auxiliary attributes (e.g. sample name, read group) opaque to the core.
    #[serde(default)]
    pub aux: BTreeMap<String, String>,
}

impl FileRef {
    pub fn new(file_id: impl Into<String>, file_type: impl Into<String>, path: impl Into<String>) -> Self {
        Self { file_id: file_id.into(), file_type: file_type.into(), path: path.into(), aux: BTreeMap::new() }
    }

    pub fn with_aux(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.aux.insert(key.into(), value.into());
        self
    }
}

/// A value attached to an output key: a file handle, a recursively-nested
/// list of the same (Splitter outputs may be lists of paths), or an opaque
/// non-path value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputValue {
    File(FileRef),
    List(Vec<OutputValue>),
    Raw(serde_json::Value),
}

impl OutputValue {
    /// Flatten into the list of `FileRef`s this value contains, recursing through lists.
    pub fn file_refs(&self) -> Vec<&FileRef> {
        match self {
            OutputValue::File(f) => vec![f],
            OutputValue::List(items) => items.iter().flat_map(OutputValue::file_refs).collect(),
            OutputValue::Raw(_) => Vec::new(),
        }
    }
}