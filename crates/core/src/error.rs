// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds shared across the graph engine (spec.md §7).

use thiserror::Error;

/// A malformed or structurally invalid pipeline config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tool '{0}' references unknown module '{1}'")]
    UnknownModule(String, String),

    #[error("config contains a dependency cycle among tools: {0:?}")]
    Cycle(Vec<String>),

    #[error("tool '{0}' has input_from entry '{1}' that is not a configured tool or main_input")]
    UnknownUpstream(String, String),

    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Errors raised by a `ModuleContract` implementation (spec.md §4.2, §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModuleError {
    #[error("split '{0}' declared more than once")]
    DuplicateSplit(String),

    #[error("output added to undeclared split '{0}'")]
    UnknownSplit(String),

    #[error("output key '{key}' defined more than once in split '{split_id}'")]
    DuplicateOutputKey { split_id: String, key: String },

    #[error("module cannot build command: {0}")]
    CommandBuildFailed(String),

    #[error("module output does not satisfy contract: {0}")]
    OutputContractViolation(String),
}

/// Aggregated validation failure from `GraphEngine::check_nodes` (spec.md §4.4).
///
/// Carries every error collected across both the I/O-compatibility pass and the
/// tools/resources pass; nothing short-circuits before this is raised.
#[derive(Debug, Error)]
#[error("one or more modules failed validation:\n{}", .0.join("\n"))]
pub struct ValidationError(pub Vec<String>);

/// A captured failure from inside a `Node`'s worker, re-raised at `finalize()` (spec.md §4.5, §7).
#[derive(Debug, Error, Clone)]
#[error("{message}")]
pub struct WorkerFailure {
    pub tool_id: String,
    pub module: String,
    pub message: String,
    pub stdout: String,
    pub stderr: String,
}

impl WorkerFailure {
    pub fn new(tool_id: impl Into<String>, module: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_id: tool_id.into(),
            module: module.into(),
            message: message.into(),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn with_output(mut self, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self.stderr = stderr.into();
        self
    }
}