// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable `ComputeProvider` test double, gated behind `test-support`.
//! Lets processor/graph tests drive specific status sequences and inject
//! rate-limit or transient failures without touching a real cloud API.

use crate::provider::{
    ComputeProvider, CreateRequest, InstanceDescription, InstanceStatus, InstanceType, PriceQuery,
    ProviderError,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// One scripted response per `describe()` call; the last entry repeats once
/// exhausted so tests don't need to pad a queue to an exact call count.
#[derive(Clone)]
pub struct ScriptedInstance {
    statuses: Vec<Result<InstanceStatus, ProviderError>>,
    nat_ip: Option<String>,
}

impl ScriptedInstance {
    pub fn new(statuses: Vec<Result<InstanceStatus, ProviderError>>) -> Self {
        Self { statuses, nat_ip: Some("10.0.0.1".to_string()) }
    }

    pub fn with_nat_ip(mut self, ip: impl Into<String>) -> Self {
        self.nat_ip = Some(ip.into());
        self
    }
}

struct State {
    scripts: HashMap<String, ScriptedInstance>,
    default_script: Option<ScriptedInstance>,
    calls: HashMap<String, usize>,
    created: Vec<String>,
    destroyed: Vec<String>,
    create_errors: HashMap<String, ProviderError>,
    destroy_errors: HashMap<String, ProviderError>,
}

pub struct FakeComputeProvider {
    state: Mutex<State>,
}

impl FakeComputeProvider {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                scripts: HashMap::new(),
                default_script: None,
                calls: HashMap::new(),
                created: Vec::new(),
                destroyed: Vec::new(),
                create_errors: HashMap::new(),
                destroy_errors: HashMap::new(),
            }),
        }
    }

    pub fn script(&self, name: impl Into<String>, instance: ScriptedInstance) {
        self.state.lock().scripts.insert(name.into(), instance);
    }

    /// Fallback applied to any name not individually `script()`-ed, latched
    /// in on first `describe()` so a given name's call count still advances
    /// consistently. Graph-level tests need this because `GraphEngine::build`
    /// names each node's processor with a random suffix (spec.md §9
    /// "Processor name collisions") that the test can't predict up front.
    pub fn set_default(&self, instance: ScriptedInstance) {
        self.state.lock().default_script = Some(instance);
    }

    pub fn fail_create(&self, name: impl Into<String>, err: ProviderError) {
        self.state.lock().create_errors.insert(name.into(), err);
    }

    pub fn fail_destroy(&self, name: impl Into<String>, err: ProviderError) {
        self.state.lock().destroy_errors.insert(name.into(), err);
    }

    pub fn created_names(&self) -> Vec<String> {
        self.state.lock().created.clone()
    }

    pub fn destroyed_names(&self) -> Vec<String> {
        self.state.lock().destroyed.clone()
    }

    pub fn describe_call_count(&self, name: &str) -> usize {
        self.state.lock().calls.get(name).copied().unwrap_or(0)
    }
}

impl Default for FakeComputeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComputeProvider for FakeComputeProvider {
    async fn describe(&self, name: &str, _zone: &str) -> Result<InstanceDescription, ProviderError> {
        let mut state = self.state.lock();
        if !state.scripts.contains_key(name) {
            if let Some(default) = state.default_script.clone() {
                state.scripts.insert(name.to_string(), default);
            }
        }
        let idx = {
            let count = state.calls.entry(name.to_string()).or_insert(0);
            let idx = *count;
            *count += 1;
            idx
        };
        let script = state
            .scripts
            .get(name)
            .ok_or(ProviderError::NotFound)?
            .clone();
        let step = idx.min(script.statuses.len().saturating_sub(1));
        let status = script.statuses[step].clone()?;
        Ok(InstanceDescription { status, nat_ip: script.nat_ip.clone() })
    }

    async fn price(&self, query: PriceQuery) -> Result<u64, ProviderError> {
        Ok((query.cpus as u64) * 100 + (query.mem_gb as u64) * 10)
    }

    async fn optimal_instance_type(
        &self,
        cpus: u32,
        mem_gb: u32,
        _zone: &str,
        _preemptible: bool,
    ) -> Result<InstanceType, ProviderError> {
        Ok(InstanceType { adjusted_cpus: cpus, adjusted_mem_gb: mem_gb, instance_type: "fake-type".to_string() })
    }

    async fn create(&self, request: &CreateRequest) -> Result<(), ProviderError> {
        let mut state = self.state.lock();
        if let Some(err) = state.create_errors.get(&request.name) {
            return Err(err.clone());
        }
        state.created.push(request.name.clone());
        Ok(())
    }

    async fn destroy(&self, name: &str, _zone: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock();
        if let Some(err) = state.destroy_errors.get(name) {
            return Err(err.clone());
        }
        state.destroyed.push(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;