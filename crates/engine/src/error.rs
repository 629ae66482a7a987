// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds for the processor state machine and graph engine (spec.md §7).

use conflux_core::{ModuleError, ValidationError, WorkerFailure};
use thiserror::Error;

/// Failures surfaced by `Processor` (spec.md §4.1, §7 *Locked*/*ProviderFatal*).
#[derive(Debug, Error, Clone)]
pub enum ProcessorError {
    #[error("processor is locked")]
    Locked,

    #[error("processor job '{job_name}' failed: {message}")]
    Fatal { job_name: String, message: String },

    #[error("processor recreate budget exhausted after {0} attempts")]
    RecreateExhausted(u32),

    #[error("readiness probe timed out after {0} cycles")]
    ReadinessTimeout(u32),

    #[error("provider reported an unknown status: {0}")]
    UnknownStatus(String),

    #[error("no job named '{0}' is tracked by this processor")]
    UnknownJob(String),
}

/// Top-level engine errors (spec.md §7).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] conflux_core::ConfigError),

    #[error("validation failed:\n{0}")]
    ValidationFailed(ValidationError),

    #[error(transparent)]
    Module(#[from] ModuleError),

    #[error(transparent)]
    Processor(#[from] ProcessorError),

    #[error("worker failure in tool '{}': {}", .0.tool_id, .0.message)]
    Worker(#[from] WorkerFailure),
}