// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `conflux validate`: load a config and run `GraphEngine::check_nodes`
//! without provisioning anything (spec.md §4.4 "Validate").

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use conflux_core::{Config, ModuleRegistry, StaticPipelineData};
use conflux_engine::GraphEngine;
use conflux_engine::graph::ProcessorDefaults;
use conflux_provider::CliComputeProvider;

use crate::exit_error::ExitError;

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the pipeline config (YAML or JSON).
    #[arg(long)]
    pub config: PathBuf,
}

pub fn validate(args: ValidateArgs) -> Result<(), ExitError> {
    let config = Config::load(&args.config)
        .map_err(|e| ExitError::new(2, format!("failed to load config '{}': {e}", args.config.display())))?;

    let mut registry = ModuleRegistry::new();
    conflux_modules::register_builtins(&mut registry);

    // No instances are provisioned during validation; the processor defaults
    // only matter once a node is actually scheduled.
    let defaults = ProcessorDefaults {
        zone: String::new(),
        image: String::new(),
        service_account: String::new(),
        preemptible: false,
        boot_disk_ssd: false,
        local_ssd_count: 0,
        ssh_user: String::new(),
        ssh_key_path: String::new(),
        ssh_port: 22,
        default_num_cmd_retries: 0,
        run_num_retries: 0,
        run_quiet_failure: false,
    };

    let engine = GraphEngine::build(
        &config,
        &registry,
        CliComputeProvider::new(),
        &defaults,
        conflux_core::SystemClock,
        Arc::new(StaticPipelineData::default()),
    )
    .map_err(|e| ExitError::new(2, e.to_string()))?;

    engine.check_nodes().map_err(|e| ExitError::new(3, e.to_string()))?;

    println!("config is valid: {} tool(s)", engine.tool_ids().count());
    Ok(())
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
