// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! conflux-provider: the cloud-provider collaborator abstraction (spec.md
//! §6), plus a reference CLI-backed implementation and a scriptable test
//! double for exercising the processor state machine without touching a
//! real cloud API.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod cli;
pub mod provider;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use cli::CliComputeProvider;
pub use provider::{
    ComputeProvider, CreateRequest, InstanceDescription, InstanceStatus, InstanceType, PriceQuery,
    ProviderError,
};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeComputeProvider, ScriptedInstance};