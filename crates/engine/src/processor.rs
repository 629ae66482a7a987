// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ProcessorStateMachine (spec.md §4.1): owns one remote compute resource
//! and provides a reliable command channel over it regardless of transient
//! provider failures. Ported from `System/Platform/Google/Instance.py`'s
//! `update_status`/`create`/`recreate`/`wait_process`/`handle_failure`/
//! `wait_until_ready`/`throttle_api_rate` methods.

use crate::error::ProcessorError;
use crate::remote_shell::{RemoteHandle, RemoteShell, SshRemoteShell};
use conflux_core::clock::{Clock, SystemClock};
use conflux_provider::{ComputeProvider, CreateRequest, InstanceStatus, PriceQuery};
use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

const READINESS_CYCLES: u32 = 40;
const READINESS_CYCLE_INTERVAL: Duration = Duration::from_secs(15);
const INTER_RETRY_PAUSE: Duration = Duration::from_secs(3);
const LOCK_POLL_TICK: Duration = Duration::from_secs(1);
const RATE_LIMIT_BASE_SECS: f64 = 180.0;
const RATE_LIMIT_JITTER_MAX_SECS: u64 = 600;
const UPDATE_STATUS_RETRIES: u32 = 3;

/// States from spec.md §4.1: `OFF → CREATING → AVAILABLE → DESTROYING → OFF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorStatus {
    Off,
    Creating,
    Available,
    Destroying,
}

impl From<InstanceStatus> for ProcessorStatus {
    fn from(value: InstanceStatus) -> Self {
        match value {
            InstanceStatus::Terminated => ProcessorStatus::Off,
            InstanceStatus::Stopping => ProcessorStatus::Destroying,
            InstanceStatus::Provisioning | InstanceStatus::Staging => ProcessorStatus::Creating,
            InstanceStatus::Running => ProcessorStatus::Available,
        }
    }
}

/// What the processor should ask the provider for (spec.md §3 "Processor").
#[derive(Debug, Clone)]
pub struct ProcessorSpec {
    pub cpus: u32,
    pub mem_gb: u32,
    pub disk_gb: u32,
    pub zone: String,
    pub image: String,
    pub service_account: String,
    pub preemptible: bool,
    pub boot_disk_ssd: bool,
    pub local_ssd_count: u32,
    pub ssh_user: String,
    pub ssh_key_path: String,
    /// TCP port the readiness probe and remote-shell transport target.
    /// Always 22 in production; overridable so tests can probe a local
    /// listener instead of reaching out over the network.
    pub ssh_port: u16,
    /// `default_num_cmd_retries` (spec.md §4.1): caps both per-command
    /// retries (when callers pass it as `num_retries`) and recreate attempts.
    pub default_num_cmd_retries: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobKind {
    Create,
    Destroy,
    SshConfigure,
    Run,
}

struct TrackedJob {
    command: String,
    kind: JobKind,
    quiet_failure: bool,
    retries_left: u32,
    handle: Option<Box<dyn RemoteHandle>>,
}

struct ProcessorState {
    status: ProcessorStatus,
    endpoint: Option<String>,
    locked: bool,
    rate_limit_k: u32,
    recreate_count: u32,
    started_at: Option<SystemTime>,
    stopped_at: Option<SystemTime>,
    cumulative_cost_cents: f64,
    price_cents_per_hour: f64,
    ssh_ready: bool,
}

impl Default for ProcessorState {
    fn default() -> Self {
        Self {
            status: ProcessorStatus::Off,
            endpoint: None,
            locked: false,
            rate_limit_k: 0,
            recreate_count: 0,
            started_at: None,
            stopped_at: None,
            cumulative_cost_cents: 0.0,
            price_cents_per_hour: 0.0,
            ssh_ready: false,
        }
    }
}

enum HandleOutcome {
    Retry,
    TreatAsSuccess,
}

/// Owns one remote compute resource of a single provider-backed type.
pub struct Processor<P: ComputeProvider, C: Clock = SystemClock> {
    name: String,
    spec: ProcessorSpec,
    provider: P,
    clock: C,
    remote_shell: Arc<dyn RemoteShell>,
    state: Mutex<ProcessorState>,
    jobs: Mutex<HashMap<String, TrackedJob>>,
}

impl<P: ComputeProvider> Processor<P, SystemClock> {
    pub fn new(name: impl Into<String>, spec: ProcessorSpec, provider: P) -> Self {
        Self::with_clock_and_shell(name, spec, provider, SystemClock, Arc::new(SshRemoteShell))
    }
}

impl<P: ComputeProvider, C: Clock> Processor<P, C> {
    pub fn with_clock(name: impl Into<String>, spec: ProcessorSpec, provider: P, clock: C) -> Self {
        Self::with_clock_and_shell(name, spec, provider, clock, Arc::new(SshRemoteShell))
    }

    pub fn with_clock_and_shell(
        name: impl Into<String>,
        spec: ProcessorSpec,
        provider: P,
        clock: C,
        remote_shell: Arc<dyn RemoteShell>,
    ) -> Self {
        Self {
            name: name.into(),
            spec,
            provider,
            clock,
            remote_shell,
            state: Mutex::new(ProcessorState::default()),
            jobs: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> ProcessorStatus {
        self.state.lock().status
    }

    pub fn endpoint(&self) -> Option<String> {
        self.state.lock().endpoint.clone()
    }

    pub fn is_locked(&self) -> bool {
        self.state.lock().locked
    }

    /// Set the lock flag (spec.md §5 "Cancellation"). Causes any in-progress
    /// non-destroy command to fail fast, and cuts interruptible sleeps short.
    pub fn lock(&self) {
        self.state.lock().locked = true;
    }

    pub fn cumulative_cost_cents(&self) -> f64 {
        self.state.lock().cumulative_cost_cents
    }

    pub fn recreate_count(&self) -> u32 {
        self.state.lock().recreate_count
    }

    /// Refresh `status`/`endpoint` from the provider. Bounded internal
    /// retries on transient errors; resource-absent forces `OFF`.
    pub async fn update_status(&self) -> Result<(), ProcessorError> {
        use conflux_provider::ProviderError;

        let mut attempt = 0;
        loop {
            match self.provider.describe(&self.name, &self.spec.zone).await {
                Ok(desc) => {
                    let mut state = self.state.lock();
                    state.status = desc.status.into();
                    state.endpoint = desc.nat_ip;
                    return Ok(());
                }
                Err(ProviderError::NotFound) => {
                    let mut state = self.state.lock();
                    state.status = ProcessorStatus::Off;
                    state.endpoint = None;
                    return Ok(());
                }
                Err(e @ ProviderError::Transient(_)) if attempt < UPDATE_STATUS_RETRIES => {
                    attempt += 1;
                    tracing::debug!(processor = %self.name, attempt, error = %e, "transient describe error, retrying");
                    tokio::time::sleep(Duration::from_millis(200)).await;
                }
                Err(e) => {
                    return Err(ProcessorError::Fatal {
                        job_name: "update_status".to_string(),
                        message: e.message(),
                    });
                }
            }
        }
    }

    /// Provision the resource and block until reachable over the remote
    /// shell channel.
    pub async fn create(&self) -> Result<(), ProcessorError> {
        if self.is_locked() {
            return Err(ProcessorError::Locked);
        }

        let instance_type = self
            .provider
            .optimal_instance_type(self.spec.cpus, self.spec.mem_gb, &self.spec.zone, self.spec.preemptible)
            .await
            .map_err(|e| ProcessorError::Fatal { job_name: "create".to_string(), message: e.message() })?;

        let price = self
            .provider
            .price(PriceQuery {
                cpus: instance_type.adjusted_cpus,
                mem_gb: instance_type.adjusted_mem_gb,
                disk_gb: self.spec.disk_gb,
                instance_class: instance_type.instance_type.clone(),
                zone: self.spec.zone.clone(),
                preemptible: self.spec.preemptible,
                boot_disk_ssd: self.spec.boot_disk_ssd,
                local_ssd_count: self.spec.local_ssd_count,
            })
            .await
            .map_err(|e| ProcessorError::Fatal { job_name: "create".to_string(), message: e.message() })?;

        {
            let mut state = self.state.lock();
            state.price_cents_per_hour = price as f64;
            state.started_at = Some(self.clock.now());
            state.status = ProcessorStatus::Creating;
        }

        let request = CreateRequest {
            name: self.name.clone(),
            zone: self.spec.zone.clone(),
            image: self.spec.image.clone(),
            service_account: self.spec.service_account.clone(),
            cpus: instance_type.adjusted_cpus,
            mem_gb: instance_type.adjusted_mem_gb,
            disk_gb: self.spec.disk_gb,
            instance_type: instance_type.instance_type,
            preemptible: self.spec.preemptible,
            boot_disk_ssd: self.spec.boot_disk_ssd,
            local_ssd_count: self.spec.local_ssd_count,
        };

        let mut retries_left = self.spec.default_num_cmd_retries;
        loop {
            match self.provider.create(&request).await {
                Ok(()) => break,
                Err(e) => match self.handle_failure("create", JobKind::Create, &e.message(), &mut retries_left).await {
                    Ok(HandleOutcome::TreatAsSuccess) => break,
                    Ok(HandleOutcome::Retry) => continue,
                    Err(pe) => return Err(pe),
                },
            }
        }

        self.wait_until_ready().await
    }

    /// Readiness probe: up to 40 cycles x 15s (spec.md §4.1 "Readiness probe").
    async fn wait_until_ready(&self) -> Result<(), ProcessorError> {
        for _cycle in 0..READINESS_CYCLES {
            if self.is_locked() {
                return Err(ProcessorError::Locked);
            }
            self.update_status().await?;
            let status = self.status();
            if !matches!(status, ProcessorStatus::Creating | ProcessorStatus::Available) {
                return self.recreate().await;
            }
            if let Some(endpoint) = self.endpoint() {
                if self.probe_ssh_port(&endpoint).await {
                    let already_ready = self.state.lock().ssh_ready;
                    if !already_ready {
                        self.configure_ssh(&endpoint).await?;
                        self.state.lock().ssh_ready = true;
                    }
                    return Ok(());
                }
            }
            tokio::time::sleep(READINESS_CYCLE_INTERVAL).await;
        }
        self.recreate().await
    }

    async fn probe_ssh_port(&self, endpoint: &str) -> bool {
        tokio::time::timeout(
            Duration::from_secs(1),
            tokio::net::TcpStream::connect((endpoint, self.spec.ssh_port)),
        )
        .await
        .map(|r| r.is_ok())
        .unwrap_or(false)
    }

    /// One-time SSH tuning performed on first successful probe: raise the
    /// concurrent-connection limit and restart the daemon.
    async fn configure_ssh(&self, endpoint: &str) -> Result<(), ProcessorError> {
        let command = "sudo sed -i 's/^#\\?MaxStartups.*/MaxStartups 100/' /etc/ssh/sshd_config && sudo systemctl restart sshd";
        self.run_kind("__configure_ssh", command, self.spec.default_num_cmd_retries, true, JobKind::SshConfigure)
            .await?;
        let _ = endpoint;
        let (stdout, stderr) = self.wait_process("__configure_ssh").await?;
        tracing::debug!(processor = %self.name, %stdout, %stderr, "ssh tuning complete");
        Ok(())
    }

    /// Destroy + create, at most `default_num_cmd_retries` times.
    async fn recreate(&self) -> Result<(), ProcessorError> {
        let count = {
            let mut state = self.state.lock();
            state.recreate_count += 1;
            state.recreate_count
        };
        if count > self.spec.default_num_cmd_retries {
            return Err(ProcessorError::RecreateExhausted(count));
        }
        tracing::warn!(processor = %self.name, attempt = count, "recreating processor");
        self.destroy(true).await?;
        // reset endpoint/ssh_ready so the new instance re-probes from scratch
        {
            let mut state = self.state.lock();
            state.ssh_ready = false;
            state.endpoint = None;
        }
        Box::pin(self.create()).await
    }

    /// Request deprovisioning; block until terminal when `wait` is set.
    pub async fn destroy(&self, wait: bool) -> Result<(), ProcessorError> {
        let mut retries_left = self.spec.default_num_cmd_retries;
        loop {
            match self.provider.destroy(&self.name, &self.spec.zone).await {
                Ok(()) => break,
                Err(e) => match self.handle_failure("destroy", JobKind::Destroy, &e.message(), &mut retries_left).await {
                    Ok(HandleOutcome::TreatAsSuccess) => break,
                    Ok(HandleOutcome::Retry) => continue,
                    Err(pe) => return Err(pe),
                },
            }
        }

        {
            let mut state = self.state.lock();
            state.status = ProcessorStatus::Destroying;
        }

        if wait {
            for _ in 0..READINESS_CYCLES {
                self.update_status().await?;
                if self.status() == ProcessorStatus::Off {
                    break;
                }
                tokio::time::sleep(READINESS_CYCLE_INTERVAL).await;
            }
        }

        let mut state = self.state.lock();
        let stopped_at = self.clock.now();
        state.stopped_at = Some(stopped_at);
        if let Some(started_at) = state.started_at {
            let elapsed_hours = stopped_at
                .duration_since(started_at)
                .unwrap_or_default()
                .as_secs_f64()
                / 3600.0;
            state.cumulative_cost_cents += state.price_cents_per_hour * elapsed_hours;
        }
        Ok(())
    }

    /// Start a remote command under a symbolic `job_name`, unique among
    /// currently-tracked processes for this processor.
    pub async fn run(
        &self,
        job_name: &str,
        command: &str,
        num_retries: u32,
        quiet_failure: bool,
    ) -> Result<(), ProcessorError> {
        self.run_kind(job_name, command, num_retries, quiet_failure, JobKind::Run).await
    }

    async fn run_kind(
        &self,
        job_name: &str,
        command: &str,
        num_retries: u32,
        quiet_failure: bool,
        kind: JobKind,
    ) -> Result<(), ProcessorError> {
        if self.jobs.lock().contains_key(job_name) {
            return Err(ProcessorError::Fatal {
                job_name: job_name.to_string(),
                message: "job_name already tracked by this processor".to_string(),
            });
        }
        if self.endpoint().is_none() {
            self.update_status().await?;
        }
        let handle = self.spawn_remote(command).await?;
        self.jobs.lock().insert(
            job_name.to_string(),
            TrackedJob { command: command.to_string(), kind, quiet_failure, retries_left: num_retries, handle: Some(handle) },
        );
        Ok(())
    }

    async fn spawn_remote(&self, command: &str) -> Result<Box<dyn RemoteHandle>, ProcessorError> {
        let endpoint = self.endpoint().ok_or_else(|| ProcessorError::Fatal {
            job_name: "spawn".to_string(),
            message: "no endpoint known for processor".to_string(),
        })?;
        self.remote_shell
            .spawn(&endpoint, &self.spec.ssh_user, &self.spec.ssh_key_path, command)
            .await
            .map_err(|e| ProcessorError::Fatal { job_name: "spawn".to_string(), message: e.to_string() })
    }

    /// Join and collect output for a previously-`run` job, applying the
    /// unified failure handling and retry policy (spec.md §4.1).
    pub async fn wait_process(&self, job_name: &str) -> Result<(String, String), ProcessorError> {
        loop {
            let (command, kind, quiet_failure, mut retries_left, handle) = {
                let mut jobs = self.jobs.lock();
                let job = jobs
                    .get_mut(job_name)
                    .ok_or_else(|| ProcessorError::UnknownJob(job_name.to_string()))?;
                let handle = job.handle.take().ok_or_else(|| ProcessorError::Fatal {
                    job_name: job_name.to_string(),
                    message: "job already being awaited".to_string(),
                })?;
                (job.command.clone(), job.kind, job.quiet_failure, job.retries_left, handle)
            };

            let output = handle
                .wait()
                .await
                .map_err(|e| ProcessorError::Fatal { job_name: job_name.to_string(), message: e.to_string() })?;

            if output.success {
                self.jobs.lock().remove(job_name);
                return Ok((output.stdout, output.stderr));
            }

            if !quiet_failure {
                tracing::error!(processor = %self.name, job = job_name, stderr = %output.stderr, "remote command failed");
            }

            match self.handle_failure(job_name, kind, &output.stderr, &mut retries_left).await {
                Ok(HandleOutcome::TreatAsSuccess) => {
                    self.jobs.lock().remove(job_name);
                    return Ok((output.stdout, output.stderr));
                }
                Ok(HandleOutcome::Retry) => {
                    let handle = self.spawn_remote(&command).await?;
                    self.jobs.lock().insert(
                        job_name.to_string(),
                        TrackedJob { command, kind, quiet_failure, retries_left, handle: Some(handle) },
                    );
                    continue;
                }
                Err(e) => {
                    self.jobs.lock().remove(job_name);
                    return Err(e);
                }
            }
        }
    }

    /// Unified retry/failure decision (spec.md §4.1 "Retry & failure policy").
    async fn handle_failure(
        &self,
        job_name: &str,
        kind: JobKind,
        stderr: &str,
        retries_left: &mut u32,
    ) -> Result<HandleOutcome, ProcessorError> {
        if self.is_locked() && kind != JobKind::Destroy {
            return Err(ProcessorError::Locked);
        }

        if stderr.contains("Rate Limit Exceeded") {
            let k = {
                let mut state = self.state.lock();
                let k = state.rate_limit_k;
                state.rate_limit_k += 1;
                k
            };
            tracing::warn!(processor = %self.name, job = job_name, k, "rate limited, backing off");
            self.throttle_api_rate(k).await?;
            return Ok(HandleOutcome::Retry);
        }

        if kind == JobKind::SshConfigure && stderr.contains("Permission denied (publickey)") {
            self.recreate().await?;
            return Ok(HandleOutcome::TreatAsSuccess);
        }

        self.update_status().await?;
        let status = self.status();

        let outcome = match status {
            ProcessorStatus::Off => {
                if kind == JobKind::Create && *retries_left > 0 {
                    *retries_left -= 1;
                    Some(HandleOutcome::Retry)
                } else if kind == JobKind::Destroy {
                    Some(HandleOutcome::TreatAsSuccess)
                } else {
                    None
                }
            }
            ProcessorStatus::Creating => {
                if kind == JobKind::Destroy && *retries_left > 0 {
                    *retries_left -= 1;
                    Some(HandleOutcome::Retry)
                } else {
                    None
                }
            }
            ProcessorStatus::Available => {
                if kind == JobKind::Create && !stderr.contains("already exists") {
                    Some(HandleOutcome::TreatAsSuccess)
                } else if kind != JobKind::Create && *retries_left > 0 {
                    *retries_left -= 1;
                    Some(HandleOutcome::Retry)
                } else {
                    None
                }
            }
            ProcessorStatus::Destroying => {
                if *retries_left > 0 {
                    *retries_left -= 1;
                    Some(HandleOutcome::Retry)
                } else {
                    None
                }
            }
        };

        match outcome {
            Some(HandleOutcome::Retry) => {
                tokio::time::sleep(INTER_RETRY_PAUSE).await;
                Ok(HandleOutcome::Retry)
            }
            Some(other) => Ok(other),
            None => Err(ProcessorError::Fatal { job_name: job_name.to_string(), message: stderr.to_string() }),
        }
    }

    /// `180*2^k + random(0..600)` seconds, slept in 1s ticks so an external
    /// lock can interrupt (spec.md §4.1 step 2, §5 "Suspension points").
    async fn throttle_api_rate(&self, k: u32) -> Result<(), ProcessorError> {
        let jitter = rand::thread_rng().gen_range(0..=RATE_LIMIT_JITTER_MAX_SECS);
        let total_secs = (RATE_LIMIT_BASE_SECS * 2f64.powi(k as i32)) as u64 + jitter;
        let mut remaining = total_secs;
        while remaining > 0 {
            if self.is_locked() {
                return Err(ProcessorError::Locked);
            }
            let tick = LOCK_POLL_TICK.min(Duration::from_secs(remaining));
            tokio::time::sleep(tick).await;
            remaining = remaining.saturating_sub(tick.as_secs().max(1));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;