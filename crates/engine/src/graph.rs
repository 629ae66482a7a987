// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GraphEngine (spec.md §4.4), ported from `GAP_system/NodeManager.py`:
//! builds the dependency graph from config, validates I/O key compatibility
//! and tool/resource requirements across every node before any work starts,
//! then runs the ready-queue poll loop until every node has finalized.

use crate::error::EngineError;
use crate::node::Node;
use crate::processor::{Processor, ProcessorSpec};
use crate::remote_shell::RemoteShell;
use conflux_core::clock::{Clock, SystemClock};
use conflux_core::ids::MAIN_INPUT;
use conflux_core::{
    Config, DataKey, InputBundle, InputEntry, ModuleRegistry, OutputBundle, PipelineData, ToolId,
    ValidationError,
};
use conflux_provider::ComputeProvider;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Orchestrator-wide processor settings every node's `Processor` is built
/// from, combined with that module's own `ResourceRequest` (spec.md §3
/// "Processor"). These are not part of a `ToolConfig` — they describe the
/// compute environment, not a tool's data-flow wiring.
#[derive(Debug, Clone)]
pub struct ProcessorDefaults {
    pub zone: String,
    pub image: String,
    pub service_account: String,
    pub preemptible: bool,
    pub boot_disk_ssd: bool,
    pub local_ssd_count: u32,
    pub ssh_user: String,
    pub ssh_key_path: String,
    pub ssh_port: u16,
    pub default_num_cmd_retries: u32,
    /// Passed through to every `Node::start`'s `run("work", ...)` call.
    pub run_num_retries: u32,
    pub run_quiet_failure: bool,
}

/// Builds the dependency graph from config, validates it, and runs the
/// ready-queue scheduler loop (spec.md §4.4).
pub struct GraphEngine<P: ComputeProvider, C: Clock = SystemClock> {
    nodes: IndexMap<ToolId, Arc<Node<P, C>>>,
    requires: IndexMap<ToolId, Vec<String>>,
    final_output: IndexMap<ToolId, HashSet<DataKey>>,
    available_tools: HashSet<String>,
    available_resources: HashSet<String>,
    pipeline_data: Arc<dyn PipelineData>,
}

impl<P: ComputeProvider + Clone + 'static, C: Clock> GraphEngine<P, C> {
    /// Walk `config`, construct each tool's `Node` (module selected by the
    /// registered `module` identifier) and its `Processor` (spec.md §4.4
    /// "Build"). Performs the DAG topological sort (spec.md §9 "DAG cycle
    /// detection" REDESIGN FLAG) before a single node is constructed, so a
    /// cyclic config never allocates a processor.
    pub fn build(
        config: &Config,
        registry: &ModuleRegistry,
        provider: P,
        defaults: &ProcessorDefaults,
        clock: C,
        pipeline_data: Arc<dyn PipelineData>,
    ) -> Result<Self, EngineError> {
        Self::build_with_shell(
            config,
            registry,
            provider,
            defaults,
            clock,
            pipeline_data,
            Arc::new(crate::remote_shell::SshRemoteShell),
        )
    }

    /// Same as [`Self::build`] but with the remote-shell transport injectable,
    /// so graph-level tests can drive the scheduler loop against a scripted
    /// shell instead of shelling out to a real `ssh` binary.
    #[cfg_attr(not(any(test, feature = "test-support")), allow(dead_code))]
    pub fn build_with_shell(
        config: &Config,
        registry: &ModuleRegistry,
        provider: P,
        defaults: &ProcessorDefaults,
        clock: C,
        pipeline_data: Arc<dyn PipelineData>,
        remote_shell: Arc<dyn RemoteShell>,
    ) -> Result<Self, EngineError> {
        let order = config.validate_structure()?;

        let mut nodes = IndexMap::with_capacity(order.len());
        let mut requires = IndexMap::with_capacity(order.len());
        let mut final_output = IndexMap::with_capacity(order.len());

        for tool_id in order {
            // topo_sort only ever returns tool_ids drawn from config.tools itself.
            #[allow(clippy::expect_used)]
            let tool_cfg = config
                .tools
                .get(tool_id.as_str())
                .expect("topo_sort only returns configured tool_ids");

            if !registry.contains(&tool_cfg.module) {
                return Err(EngineError::Config(conflux_core::ConfigError::UnknownModule(
                    tool_id.to_string(),
                    tool_cfg.module.clone(),
                )));
            }
            let module = registry.construct(&tool_cfg.module, tool_id.as_str(), &tool_cfg.params)?;

            let resources = module.contract.resource_request();
            let processor_name = format!("conflux-{}-{}", tool_id, short_suffix());
            let processor_spec = ProcessorSpec {
                cpus: resources.cpus,
                mem_gb: resources.mem_gb,
                disk_gb: resources.disk_gb,
                zone: defaults.zone.clone(),
                image: defaults.image.clone(),
                service_account: defaults.service_account.clone(),
                preemptible: defaults.preemptible,
                boot_disk_ssd: defaults.boot_disk_ssd,
                local_ssd_count: defaults.local_ssd_count,
                ssh_user: defaults.ssh_user.clone(),
                ssh_key_path: defaults.ssh_key_path.clone(),
                ssh_port: defaults.ssh_port,
                default_num_cmd_retries: defaults.default_num_cmd_retries,
            };
            let processor = Processor::with_clock_and_shell(
                processor_name,
                processor_spec,
                provider.clone(),
                clock.clone(),
                remote_shell.clone(),
            );

            let node = Node::new(
                tool_id.clone(),
                module,
                processor,
                defaults.run_num_retries,
                defaults.run_quiet_failure,
            );

            requires.insert(tool_id.clone(), tool_cfg.input_from.clone());
            final_output.insert(tool_id.clone(), tool_cfg.final_output.clone());
            nodes.insert(tool_id, Arc::new(node));
        }

        Ok(Self {
            nodes,
            requires,
            final_output,
            available_tools: config.catalog.tools.clone(),
            available_resources: config.catalog.resources.clone(),
            pipeline_data,
        })
    }

    /// Two-pass validation (spec.md §4.4 "Validate"): I/O key compatibility
    /// across every edge, then tool/resource requirements. Every error from
    /// both passes is collected and logged before raising once, matching
    /// `NodeManager.check_nodes`'s "collect all, log each, then raise" shape.
    pub fn check_nodes(&self) -> Result<(), EngineError> {
        let mut errors = Vec::new();

        for (tool_id, node) in &self.nodes {
            let mut available_keys: HashSet<DataKey> = HashSet::new();
            for upstream in &self.requires[tool_id] {
                if upstream == MAIN_INPUT {
                    available_keys.extend(self.pipeline_data.main_input_keys());
                } else if let Some(upstream_node) = self.nodes.get(upstream.as_str()) {
                    available_keys.extend(upstream_node.define_output());
                }
            }

            tracing::info!(tool_id = %tool_id, "checking I/O for module");

            if let Err(e) = node.check_input(&available_keys) {
                tracing::error!(tool_id = %tool_id, error = %e, "I/O error");
                errors.push(e);
            }
            if let Err(e) = node.check_output(&self.final_output[tool_id]) {
                tracing::error!(tool_id = %tool_id, error = %e, "I/O error");
                errors.push(e);
            }
        }

        for (tool_id, node) in &self.nodes {
            let missing = node.check_requirements(&self.available_tools, &self.available_resources);
            if !missing.tools.is_empty() {
                let msg = format!(
                    "tool '{tool_id}' requires tool(s) {:?} not present in the config catalog",
                    missing.tools
                );
                tracing::error!(tool_id = %tool_id, "{msg}");
                errors.push(msg);
            }
            if !missing.resources.is_empty() {
                let msg = format!(
                    "tool '{tool_id}' requires resource(s) {:?} not present in the config catalog",
                    missing.resources
                );
                tracing::error!(tool_id = %tool_id, "{msg}");
                errors.push(msg);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(EngineError::ValidationFailed(ValidationError(errors)))
        }
    }

    /// Ready-queue poll loop (spec.md §4.4 "Run loop"). Returns the final
    /// output bundle for every node once every node has finalized
    /// successfully; the first node to finalize with a failure aborts the
    /// loop and propagates its `WorkerFailure` (spec.md §8 S5) — nodes
    /// already started independently via `tokio::spawn` keep running until
    /// this async runtime itself is torn down, mirroring the original's
    /// unsynchronized background threads (see DESIGN.md).
    pub async fn run(&self) -> Result<IndexMap<ToolId, OutputBundle>, EngineError> {
        let mut completed: HashSet<ToolId> = HashSet::new();

        loop {
            let mut done = true;

            for (tool_id, node) in &self.nodes {
                if completed.contains(tool_id) {
                    continue;
                }

                if node.finished() {
                    node.finalize().await?;
                    tracing::info!(tool_id = %tool_id, "module has finished");
                    completed.insert(tool_id.clone());
                    continue;
                }

                done = false;

                if node.is_alive() {
                    continue;
                }

                let ready = self.requires[tool_id]
                    .iter()
                    .all(|upstream| upstream == MAIN_INPUT || completed.contains(upstream.as_str()));
                if !ready {
                    continue;
                }

                let mut entries = Vec::with_capacity(self.requires[tool_id].len());
                for upstream in &self.requires[tool_id] {
                    if upstream == MAIN_INPUT {
                        entries.push(InputEntry::MainInput(self.pipeline_data.main_input_files()));
                    } else {
                        // `ready` above only admits upstreams already in `completed`.
                        #[allow(clippy::expect_used)]
                        let output = self.nodes[upstream.as_str()]
                            .get_output()
                            .expect("finalized predecessor always has an output bundle");
                        entries.push(match output {
                            OutputBundle::Keyed(map) => InputEntry::Keyed(map),
                            OutputBundle::Split(splits) => InputEntry::Split(splits),
                        });
                    }
                }

                node.set_input(InputBundle::new(entries));
                node.start();
            }

            if done {
                break;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        let mut outputs = IndexMap::with_capacity(self.nodes.len());
        for (tool_id, node) in &self.nodes {
            if let Some(output) = node.get_output() {
                outputs.insert(tool_id.clone(), output);
            }
        }
        Ok(outputs)
    }

    pub fn tool_ids(&self) -> impl Iterator<Item = &ToolId> {
        self.nodes.keys()
    }
}

/// Short random suffix for processor names (spec.md §9 "Processor name
/// collisions": the source embeds one and never checks provider-side
/// uniqueness; a collision instead surfaces via `create`'s "already exists"
/// path in `Processor::handle_failure`).
fn short_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
