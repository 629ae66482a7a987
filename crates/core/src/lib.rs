// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! conflux-core: data model, config, and module contract for the conflux
//! pipeline orchestrator.
//!
//! This crate has no knowledge of processors, remote shells, or the graph
//! scheduler — it only defines the shapes those layers operate on: tool
//! and data-key identifiers, the pipeline config, file handles, and the
//! `ModuleContract` capability set a user-supplied module must satisfy.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod clock;
pub mod config;
pub mod error;
pub mod file;
pub mod ids;
pub mod module;
pub mod pipeline_data;
pub mod registry;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{Config, ToolConfig};
pub use error::{ConfigError, ModuleError, ValidationError, WorkerFailure};
pub use file::{FileRef, OutputValue};
pub use ids::{DataKey, ToolId, MAIN_INPUT};
pub use module::{
    InputBundle, InputEntry, ModuleContract, ModuleInstance, ModuleKind, OutputBundle,
    ResourceRequest, SplitBuilder, SplitId, SplitMap, SplitRecord,
};
pub use pipeline_data::{PipelineData, StaticPipelineData};
pub use registry::{ModuleConstructor, ModuleRegistry};