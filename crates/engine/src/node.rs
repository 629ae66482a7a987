// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node (spec.md §4.3): a schedulable unit pairing one `ModuleContract`
//! with one `Processor`.

use crate::processor::Processor;
use crate::worker::WorkerHandle;
use conflux_core::clock::{Clock, SystemClock};
use conflux_core::{
    DataKey, InputBundle, ModuleError, ModuleInstance, OutputBundle, ToolId, WorkerFailure,
};
use conflux_provider::ComputeProvider;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Explicit lifecycle states from spec.md §3. `Ready` names the moment every
/// non-`main_input` predecessor has finalized; the run loop treats it as a
/// derived condition over `Pending` rather than a state this field is ever
/// set to (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Pending,
    Ready,
    Running,
    Finished,
    Failed,
}

/// What a node's worker needs from its engine: the missing-requirement
/// report for `check_requirements()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingRequirements {
    pub tools: Vec<String>,
    pub resources: Vec<String>,
}

impl MissingRequirements {
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty() && self.resources.is_empty()
    }
}

pub struct Node<P: ComputeProvider, C: Clock = SystemClock> {
    tool_id: ToolId,
    module: ModuleInstance,
    processor: Arc<Processor<P, C>>,
    state: Mutex<NodeState>,
    worker: Arc<WorkerHandle>,
    input: Mutex<Option<InputBundle>>,
    output: Mutex<Option<OutputBundle>>,
    run_num_retries: u32,
    run_quiet_failure: bool,
}

impl<P: ComputeProvider + 'static, C: Clock> Node<P, C> {
    pub fn new(
        tool_id: impl Into<ToolId>,
        module: ModuleInstance,
        processor: Processor<P, C>,
        run_num_retries: u32,
        run_quiet_failure: bool,
    ) -> Self {
        Self {
            tool_id: tool_id.into(),
            module,
            processor: Arc::new(processor),
            state: Mutex::new(NodeState::Pending),
            worker: WorkerHandle::new(),
            input: Mutex::new(None),
            output: Mutex::new(None),
            run_num_retries,
            run_quiet_failure,
        }
    }

    pub fn tool_id(&self) -> &ToolId {
        &self.tool_id
    }

    pub fn state(&self) -> NodeState {
        *self.state.lock()
    }

    /// Forwards the module's declared outputs (spec.md §4.3 `define_output`).
    pub fn define_output(&self) -> HashSet<DataKey> {
        self.module.contract.declared_output_keys()
    }

    /// Error naming any required input key missing from `available_keys`.
    pub fn check_input(&self, available_keys: &HashSet<DataKey>) -> Result<(), String> {
        let missing: Vec<&str> = self
            .module
            .contract
            .required_input_keys()
            .iter()
            .filter(|k| !available_keys.contains(*k))
            .map(|k| k.as_str())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!("tool '{}' requires input key(s) {:?} not produced by any upstream", self.tool_id, missing))
        }
    }

    /// Error naming any declared final output not among the module's produced keys.
    pub fn check_output(&self, final_output_keys: &HashSet<DataKey>) -> Result<(), String> {
        let declared = self.module.contract.declared_output_keys();
        let missing: Vec<&str> =
            final_output_keys.iter().filter(|k| !declared.contains(*k)).map(|k| k.as_str()).collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!("tool '{}' declares final_output key(s) {:?} it does not produce", self.tool_id, missing))
        }
    }

    /// Names missing from the global catalog for this module's tool/resource needs.
    pub fn check_requirements(
        &self,
        available_tools: &HashSet<String>,
        available_resources: &HashSet<String>,
    ) -> MissingRequirements {
        let mut tools: Vec<String> =
            self.module.contract.required_tools().into_iter().filter(|t| !available_tools.contains(t)).collect();
        let mut resources: Vec<String> = self
            .module
            .contract
            .required_resources()
            .into_iter()
            .filter(|r| !available_resources.contains(r))
            .collect();
        tools.sort();
        resources.sort();
        MissingRequirements { tools, resources }
    }

    /// Bind the resolved input bundle, one entry per upstream in declaration order.
    pub fn set_input(&self, input: InputBundle) {
        *self.input.lock() = Some(input);
        *self.state.lock() = NodeState::Pending;
    }

    pub fn is_alive(&self) -> bool {
        self.worker.is_alive()
    }

    pub fn finished(&self) -> bool {
        self.worker.finished()
    }

    /// Joins the worker, re-raising any captured failure at this call site
    /// (spec.md §4.3 `finalize`, §8 properties 5 and 6).
    pub async fn finalize(&self) -> Result<(), WorkerFailure> {
        let result = self.worker.finalize().await;
        *self.state.lock() = if result.is_ok() { NodeState::Finished } else { NodeState::Failed };
        result
    }

    /// Valid only after a successful `finalize()`.
    pub fn get_output(&self) -> Option<OutputBundle> {
        self.output.lock().clone()
    }

    /// Begin background execution: `create()` → `build_command` → `run` +
    /// `wait_process` → parse outputs → `destroy()` (spec.md §4.3 "Execution
    /// body").
    pub fn start(self: &Arc<Self>) {
        *self.state.lock() = NodeState::Running;
        let node = Arc::clone(self);
        self.worker.start(move || async move { node.execute().await });
    }

    async fn execute(self: Arc<Self>) -> Result<(), WorkerFailure> {
        let tool_id = self.tool_id.to_string();
        let module_name = format!("{:?}", self.module.kind);

        let input = self
            .input
            .lock()
            .clone()
            .ok_or_else(|| WorkerFailure::new(&tool_id, &module_name, "start() called before set_input()"))?;

        self.processor.create().await.map_err(|e| WorkerFailure::new(&tool_id, &module_name, e.to_string()))?;

        let mut stdout = String::new();
        let mut stderr = String::new();

        // Every return from here on must still destroy the processor created
        // above, success or failure, so a failing module never leaves a
        // billed instance running (spec.md §3 ordering guarantees).
        let body: Result<OutputBundle, WorkerFailure> = async {
            let command = self
                .module
                .contract
                .build_command(&input)
                .map_err(|e: ModuleError| WorkerFailure::new(&tool_id, &module_name, e.to_string()))?;

            self.processor
                .run("work", &command, self.run_num_retries, self.run_quiet_failure)
                .await
                .map_err(|e| WorkerFailure::new(&tool_id, &module_name, e.to_string()))?;
            let (out, err) = self
                .processor
                .wait_process("work")
                .await
                .map_err(|e| WorkerFailure::new(&tool_id, &module_name, e.to_string()))?;
            stdout = out;
            stderr = err;

            self.module
                .contract
                .collect_output(&input, &stdout, &stderr)
                .map_err(|e| WorkerFailure::new(&tool_id, &module_name, e.to_string()).with_output(&stdout, &stderr))
        }
        .await;

        if let Err(destroy_err) = self.processor.destroy(true).await {
            tracing::error!(
                tool_id = %tool_id,
                module_name = %module_name,
                error = %destroy_err,
                "processor destroy failed"
            );
            if body.is_ok() {
                return Err(WorkerFailure::new(&tool_id, &module_name, destroy_err.to_string())
                    .with_output(&stdout, &stderr));
            }
        }

        match body {
            Ok(output_bundle) => {
                *self.output.lock() = Some(output_bundle);
                Ok(())
            }
            Err(failure) => Err(failure),
        }
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;