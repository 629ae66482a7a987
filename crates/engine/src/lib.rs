// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! conflux-engine: the processor state machine, node worker, and graph
//! scheduler that drive a conflux pipeline to completion.
//!
//! This crate has no knowledge of *which* modules a config selects or how
//! they build their commands (that's `conflux-core::module` plus whatever
//! registers into a `ModuleRegistry`) — it only knows how to take a built
//! graph of `Node`s and run it to completion against a `ComputeProvider`.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod error;
pub mod graph;
pub mod node;
pub mod processor;
pub mod remote_shell;
pub mod worker;

pub use error::{EngineError, ProcessorError};
pub use graph::GraphEngine;
pub use node::{MissingRequirements, Node, NodeState};
pub use processor::{Processor, ProcessorSpec, ProcessorStatus};
pub use remote_shell::{RemoteHandle, RemoteOutput, RemoteShell, SshRemoteShell};
pub use worker::WorkerHandle;
