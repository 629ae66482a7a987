// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `conflux`: builds a dependency graph of tool/splitter/merger modules
//! from a config, provisions ephemeral compute to run each one, and drains
//! the graph to completion (spec.md §1).

mod commands;
mod exit_error;

use clap::{Parser, Subcommand};
use exit_error::ExitError;

#[derive(Parser)]
#[command(name = "conflux", version, about = "pipeline orchestrator for bioinformatics-style analysis workflows")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a config's I/O key compatibility and tool/resource requirements.
    Validate(commands::validate::ValidateArgs),
    /// Run a pipeline to completion.
    Run(commands::run::RunArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Validate(args) => commands::validate::validate(args),
        Command::Run(args) => commands::run::run(args).await,
    };

    if let Err(err) = result {
        report_and_exit(err);
    }
}

fn report_and_exit(err: ExitError) -> ! {
    tracing::error!("{}", err.message);
    eprintln!("error: {}", err.message);
    std::process::exit(err.code);
}
