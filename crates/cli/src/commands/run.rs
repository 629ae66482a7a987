// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `conflux run`: load a config, build the dependency graph, validate it,
//! and drive it to completion (spec.md §2 "Data flow").

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use conflux_core::{Config, FileRef, ModuleRegistry, StaticPipelineData};
use conflux_engine::{EngineError, GraphEngine, ProcessorError};
use conflux_engine::graph::ProcessorDefaults;
use conflux_provider::CliComputeProvider;

use crate::exit_error::ExitError;

#[derive(Args)]
pub struct RunArgs {
    /// Path to the pipeline config (YAML or JSON).
    #[arg(long)]
    pub config: PathBuf,

    /// Path to a JSON file holding the pipeline's main-input file list
    /// (an array of `{file_id, file_type, path}` objects). Omit for a
    /// config whose tools only depend on one another.
    #[arg(long)]
    pub main_input: Option<PathBuf>,

    /// Cloud-provider CLI binary to shell out to (spec.md §6 reference provider).
    #[arg(long, default_value = "gcloud")]
    pub provider_binary: String,

    /// Zone every provisioned processor is created in.
    #[arg(long, default_value = "us-central1-a")]
    pub zone: String,

    /// Boot image every processor is created from.
    #[arg(long, default_value = "conflux-worker-image")]
    pub image: String,

    /// Service account attached to every provisioned processor.
    #[arg(long, default_value = "")]
    pub service_account: String,

    /// Request preemptible instances.
    #[arg(long)]
    pub preemptible: bool,

    /// Use an SSD boot disk instead of standard persistent disk.
    #[arg(long)]
    pub boot_disk_ssd: bool,

    /// Number of local SSDs to attach to each processor.
    #[arg(long, default_value_t = 0)]
    pub local_ssd_count: u32,

    /// Local user used for the remote-shell transport (spec.md §6).
    #[arg(long, default_value = "conflux")]
    pub ssh_user: String,

    /// Private key path for the remote-shell transport.
    #[arg(long, default_value = "~/.ssh/id_rsa")]
    pub ssh_key_path: String,

    /// SSH port on the provisioned processor.
    #[arg(long, default_value_t = 22)]
    pub ssh_port: u16,

    /// Per-lifetime recreate budget for a stuck processor (spec.md §4.1 "Recreate").
    #[arg(long, default_value_t = 3)]
    pub default_num_cmd_retries: u32,

    /// Retries handed to every node's `run("work", ...)` call.
    #[arg(long, default_value_t = 3)]
    pub run_num_retries: u32,

    /// Suppress stderr/stdout from a failed `run` in the final error message.
    #[arg(long)]
    pub run_quiet_failure: bool,
}

pub async fn run(args: RunArgs) -> Result<(), ExitError> {
    let config = Config::load(&args.config)
        .map_err(|e| ExitError::new(2, format!("failed to load config '{}': {e}", args.config.display())))?;

    let mut registry = ModuleRegistry::new();
    conflux_modules::register_builtins(&mut registry);

    let main_input_files: Vec<FileRef> = match &args.main_input {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| ExitError::new(2, format!("failed to read main-input file '{}': {e}", path.display())))?;
            serde_json::from_str(&text)
                .map_err(|e| ExitError::new(2, format!("malformed main-input file '{}': {e}", path.display())))?
        }
        None => Vec::new(),
    };
    let pipeline_data = Arc::new(StaticPipelineData::new(main_input_files));

    let defaults = ProcessorDefaults {
        zone: args.zone,
        image: args.image,
        service_account: args.service_account,
        preemptible: args.preemptible,
        boot_disk_ssd: args.boot_disk_ssd,
        local_ssd_count: args.local_ssd_count,
        ssh_user: args.ssh_user,
        ssh_key_path: args.ssh_key_path,
        ssh_port: args.ssh_port,
        default_num_cmd_retries: args.default_num_cmd_retries,
        run_num_retries: args.run_num_retries,
        run_quiet_failure: args.run_quiet_failure,
    };

    let provider = CliComputeProvider::with_binary(args.provider_binary);
    let engine = GraphEngine::build(
        &config,
        &registry,
        provider,
        &defaults,
        conflux_core::SystemClock,
        pipeline_data,
    )
    .map_err(engine_error_to_exit)?;

    tracing::info!(tools = engine.tool_ids().count(), "built dependency graph");

    engine.check_nodes().map_err(engine_error_to_exit)?;
    tracing::info!("config validation passed");

    let outputs = engine.run().await.map_err(engine_error_to_exit)?;

    let rendered = serde_json::to_string_pretty(
        &outputs.into_iter().map(|(id, bundle)| (id.to_string(), bundle)).collect::<std::collections::BTreeMap<_, _>>(),
    )
    .map_err(|e| ExitError::new(1, format!("failed to render pipeline outputs: {e}")))?;
    println!("{rendered}");

    Ok(())
}

/// Map an `EngineError` to a process exit code and user-visible message
/// (spec.md §6 "Exit behavior"): validation failures and unrecoverable
/// worker failures both exit non-zero, naming the offending tool_id.
fn engine_error_to_exit(err: EngineError) -> ExitError {
    match err {
        EngineError::ValidationFailed(_) => ExitError::new(3, err.to_string()),
        EngineError::Worker(failure) => ExitError::new(
            4,
            format!(
                "tool '{}' (module '{}') failed: {}\nstdout:\n{}\nstderr:\n{}",
                failure.tool_id, failure.module, failure.message, failure.stdout, failure.stderr
            ),
        ),
        EngineError::Processor(ProcessorError::Locked) => ExitError::new(4, err.to_string()),
        other => ExitError::new(1, other.to_string()),
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
