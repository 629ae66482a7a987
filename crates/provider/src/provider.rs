// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The cloud-provider collaborator (spec.md §6): the core only depends on
//! this trait's three operation families — describe, price, and
//! optimal-instance-type selection — plus create/destroy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw status as reported by the provider (spec.md §6 `describe`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceStatus {
    Terminated,
    Stopping,
    Provisioning,
    Staging,
    Running,
}

/// Result of `describe()`.
#[derive(Debug, Clone)]
pub struct InstanceDescription {
    pub status: InstanceStatus,
    /// First interface's first access config's nat-IP, if any.
    pub nat_ip: Option<String>,
}

/// Inputs to a price lookup (spec.md §6 `price`).
#[derive(Debug, Clone)]
pub struct PriceQuery {
    pub cpus: u32,
    pub mem_gb: u32,
    pub disk_gb: u32,
    pub instance_class: String,
    pub zone: String,
    pub preemptible: bool,
    pub boot_disk_ssd: bool,
    pub local_ssd_count: u32,
}

/// Result of `optimal_instance_type()`: the provider may round cpu/mem up
/// to the nearest machine shape it actually offers.
#[derive(Debug, Clone)]
pub struct InstanceType {
    pub adjusted_cpus: u32,
    pub adjusted_mem_gb: u32,
    pub instance_type: String,
}

/// What the processor needs to hand the provider to provision an instance.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub name: String,
    pub zone: String,
    pub image: String,
    pub service_account: String,
    pub cpus: u32,
    pub mem_gb: u32,
    pub disk_gb: u32,
    pub instance_type: String,
    pub preemptible: bool,
    pub boot_disk_ssd: bool,
    pub local_ssd_count: u32,
}

#[derive(Debug, Error, Clone)]
pub enum ProviderError {
    #[error("resource not found")]
    NotFound,
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("provider error: {0}")]
    Fatal(String),
    #[error("transient provider error: {0}")]
    Transient(String),
}

impl ProviderError {
    /// True when the error text signals the provider's rate-limit condition
    /// (spec.md §4.1 handle_failure step 2).
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited(_))
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

#[async_trait]
pub trait ComputeProvider: Send + Sync {
    async fn describe(&self, name: &str, zone: &str) -> Result<InstanceDescription, ProviderError>;

    async fn price(&self, query: PriceQuery) -> Result<u64, ProviderError>;

    async fn optimal_instance_type(
        &self,
        cpus: u32,
        mem_gb: u32,
        zone: &str,
        preemptible: bool,
    ) -> Result<InstanceType, ProviderError>;

    async fn create(&self, request: &CreateRequest) -> Result<(), ProviderError>;

    async fn destroy(&self, name: &str, zone: &str) -> Result<(), ProviderError>;
}

/// Every node in a graph gets its own `Processor<P>`, so `GraphEngine::build`
/// needs to hand out many cheap handles to one underlying provider. Blanket
/// `Arc` passthrough lets callers share a single `FakeComputeProvider` (whose
/// internal state is otherwise unclonable) or a real provider across every
/// node without the provider itself needing to implement `Clone`.
#[async_trait]
impl<T: ComputeProvider + ?Sized> ComputeProvider for std::sync::Arc<T> {
    async fn describe(&self, name: &str, zone: &str) -> Result<InstanceDescription, ProviderError> {
        (**self).describe(name, zone).await
    }

    async fn price(&self, query: PriceQuery) -> Result<u64, ProviderError> {
        (**self).price(query).await
    }

    async fn optimal_instance_type(
        &self,
        cpus: u32,
        mem_gb: u32,
        zone: &str,
        preemptible: bool,
    ) -> Result<InstanceType, ProviderError> {
        (**self).optimal_instance_type(cpus, mem_gb, zone, preemptible).await
    }

    async fn create(&self, request: &CreateRequest) -> Result<(), ProviderError> {
        (**self).create(request).await
    }

    async fn destroy(&self, name: &str, zone: &str) -> Result<(), ProviderError> {
        (**self).destroy(name, zone).await
    }
}