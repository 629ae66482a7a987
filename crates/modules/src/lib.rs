// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! conflux-modules: the built-in `ModuleContract` implementations
//! (spec.md §4.2 "Built-in modules") a pipeline config can select via the
//! `module` identifier — `shell_tool`, `fixed_splitter`, `concat_merger` —
//! registered into a `conflux_core::ModuleRegistry`.
//!
//! These are reference implementations of the module base classes the
//! original system's `Modules` package defines (`Tool`, `Splitter`,
//! `Merger`); a real deployment can register additional bioinformatics
//! wrappers the same way (`registry.register("bwa_mem", ..., ...)`).

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod concat_merger;
mod fixed_splitter;
mod input;
mod shell_tool;

pub use concat_merger::ConcatMerger;
pub use fixed_splitter::FixedSplitter;
pub use shell_tool::ShellTool;

use conflux_core::{ModuleKind, ModuleRegistry};

/// Registers every built-in module under its config-facing name:
/// `shell_tool` (Tool), `fixed_splitter` (Splitter), `concat_merger` (Merger).
pub fn register_builtins(registry: &mut ModuleRegistry) {
    registry.register("shell_tool", ModuleKind::Tool, |tool_id, params| {
        Ok(Box::new(ShellTool::from_params(tool_id, params)?) as Box<dyn conflux_core::ModuleContract>)
    });
    registry.register("fixed_splitter", ModuleKind::Splitter, |tool_id, params| {
        Ok(Box::new(FixedSplitter::from_params(tool_id, params)?) as Box<dyn conflux_core::ModuleContract>)
    });
    registry.register("concat_merger", ModuleKind::Merger, |tool_id, params| {
        Ok(Box::new(ConcatMerger::from_params(tool_id, params)?) as Box<dyn conflux_core::ModuleContract>)
    });
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
