// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pipeline-data collaborator (spec.md §6): resolves the `main_input`
//! sentinel to the pipeline's initial keys and files. Invoked only by the
//! graph engine.

use crate::file::FileRef;
use crate::ids::DataKey;
use std::collections::HashSet;

pub trait PipelineData: Send + Sync {
    fn main_input_keys(&self) -> HashSet<DataKey>;
    fn main_input_files(&self) -> Vec<FileRef>;
}

/// Simple in-memory implementation sufficient for a single pipeline run;
/// the spec treats the datastore behind this as an external collaborator.
#[derive(Debug, Clone, Default)]
pub struct StaticPipelineData {
    keys: HashSet<DataKey>,
    files: Vec<FileRef>,
}

impl StaticPipelineData {
    pub fn new(files: Vec<FileRef>) -> Self {
        let keys = files.iter().map(|f| DataKey::from(f.file_type.as_str())).collect();
        Self { keys, files }
    }
}

impl PipelineData for StaticPipelineData {
    fn main_input_keys(&self) -> HashSet<DataKey> {
        self.keys.clone()
    }

    fn main_input_files(&self) -> Vec<FileRef> {
        self.files.clone()
    }
}

#[cfg(test)]
#[path = "pipeline_data_tests.rs"]
mod tests;