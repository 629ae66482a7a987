// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference `ComputeProvider` implementation: shells out to a provider CLI
//! (`gcloud` by default) using the flag grammar documented in spec.md §6.

use crate::provider::{
    ComputeProvider, CreateRequest, InstanceDescription, InstanceStatus, InstanceType, PriceQuery,
    ProviderError,
};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

/// Shells out to a gcloud-compatible CLI binary for instance lifecycle and
/// introspection. Price lookup and the optimal-instance-type table are
/// reference heuristics; a real deployment would replace
/// `optimal_instance_type`/`price` with calls into the provider's pricing
/// API (spec.md §1 "price lookup tables" is explicitly out of scope).
#[derive(Clone)]
pub struct CliComputeProvider {
    binary: String,
}

impl CliComputeProvider {
    pub fn new() -> Self {
        Self { binary: "gcloud".to_string() }
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }

    fn boot_disk_size_flag(disk_gb: u32) -> String {
        if disk_gb >= 10240 {
            format!("{}TB", (disk_gb as f64 / 1024.0).ceil() as u64)
        } else {
            format!("{disk_gb}GB")
        }
    }

    fn create_args(req: &CreateRequest) -> Vec<String> {
        let mut args = vec![
            "compute".to_string(),
            "instances".to_string(),
            "create".to_string(),
            req.name.clone(),
            "--zone".to_string(),
            req.zone.clone(),
        ];
        if req.preemptible {
            args.push("--preemptible".to_string());
        }
        args.push("--image".to_string());
        args.push(req.image.clone());
        args.push("--boot-disk-size".to_string());
        args.push(Self::boot_disk_size_flag(req.disk_gb));
        args.push("--boot-disk-type".to_string());
        args.push(if req.boot_disk_ssd { "pd-ssd".to_string() } else { "pd-standard".to_string() });
        for _ in 0..req.local_ssd_count {
            args.push("--local-ssd".to_string());
            args.push("interface=scsi".to_string());
        }
        args.push("--scopes".to_string());
        args.push("cloud-platform".to_string());
        args.push("--service-account".to_string());
        args.push(req.service_account.clone());
        if req.instance_type.contains("custom") {
            args.push("--custom-cpu".to_string());
            args.push(req.cpus.to_string());
            args.push("--custom-memory".to_string());
            args.push(format!("{}GB", req.mem_gb));
        } else {
            args.push("--machine-type".to_string());
            args.push(req.instance_type.clone());
        }
        args
    }
}

impl Default for CliComputeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct DescribeAccessConfig {
    #[serde(rename = "natIP")]
    nat_ip: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DescribeNetworkInterface {
    #[serde(rename = "accessConfigs", default)]
    access_configs: Vec<DescribeAccessConfig>,
}

#[derive(Debug, Deserialize)]
struct DescribeResponse {
    status: String,
    #[serde(rename = "networkInterfaces", default)]
    network_interfaces: Vec<DescribeNetworkInterface>,
}

#[async_trait]
impl ComputeProvider for CliComputeProvider {
    async fn describe(&self, name: &str, zone: &str) -> Result<InstanceDescription, ProviderError> {
        let output = Command::new(&self.binary)
            .args(["compute", "instances", "describe", name, "--zone", zone, "--format=json"])
            .output()
            .await
            .map_err(|e| ProviderError::Transient(e.to_string()))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            if stderr.contains("Rate Limit Exceeded") {
                return Err(ProviderError::RateLimited(stderr.to_string()));
            }
            if stderr.contains("not found") || stderr.contains("was not found") {
                return Err(ProviderError::NotFound);
            }
            return Err(ProviderError::Transient(stderr.to_string()));
        }

        let parsed: DescribeResponse = serde_json::from_slice(&output.stdout)
            .map_err(|e| ProviderError::Fatal(format!("malformed describe response: {e}")))?;

        let nat_ip = parsed
            .network_interfaces
            .first()
            .and_then(|iface| iface.access_configs.first())
            .and_then(|cfg| cfg.nat_ip.clone());

        let status = match parsed.status.as_str() {
            "TERMINATED" | "STOPPING" => InstanceStatus::Stopping,
            "PROVISIONING" | "STAGING" => InstanceStatus::Provisioning,
            "RUNNING" => InstanceStatus::Running,
            other => return Err(ProviderError::Fatal(format!("unknown instance status: {other}"))),
        };

        Ok(InstanceDescription { status, nat_ip })
    }

    async fn price(&self, query: PriceQuery) -> Result<u64, ProviderError> {
        // Reference heuristic: ~2.5 cents/cpu-hour, ~0.5 cents/GB-mem-hour,
        // ~0.02 cents/GB-disk-hour, halved when preemptible, +30% for local SSD.
        let mut cents = (query.cpus as f64 * 2.5) + (query.mem_gb as f64 * 0.5) + (query.disk_gb as f64 * 0.02);
        if query.boot_disk_ssd {
            cents *= 1.1;
        }
        if query.preemptible {
            cents *= 0.5;
        }
        cents *= 1.0 + (query.local_ssd_count as f64 * 0.3);
        Ok(cents.round() as u64)
    }

    async fn optimal_instance_type(
        &self,
        cpus: u32,
        mem_gb: u32,
        _zone: &str,
        preemptible: bool,
    ) -> Result<InstanceType, ProviderError> {
        // Round up to the nearest even cpu count (standard n1 shapes are
        // n1-standard-{1,2,4,8,...}); below 8 cpus, prefer a custom shape.
        let adjusted_cpus = cpus.max(1).next_power_of_two().max(1);
        let adjusted_mem_gb = mem_gb.max(adjusted_cpus * 2);
        let instance_type = if adjusted_cpus <= 8 {
            format!("custom-{adjusted_cpus}-{}", adjusted_mem_gb * 1024)
        } else {
            format!("n1-standard-{adjusted_cpus}")
        };
        let _ = preemptible;
        Ok(InstanceType { adjusted_cpus, adjusted_mem_gb, instance_type })
    }

    async fn create(&self, request: &CreateRequest) -> Result<(), ProviderError> {
        let args = Self::create_args(request);
        tracing::debug!(name = %request.name, "creating instance via {} {}", self.binary, args.join(" "));
        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .await
            .map_err(|e| ProviderError::Transient(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            if stderr.contains("Rate Limit Exceeded") {
                return Err(ProviderError::RateLimited(stderr));
            }
            return Err(ProviderError::Transient(stderr));
        }
        Ok(())
    }

    async fn destroy(&self, name: &str, zone: &str) -> Result<(), ProviderError> {
        // `yes | gcloud ... delete ... 2>/dev/null` in the reference shell
        // form; here we pass --quiet to the CLI directly instead of piping
        // a literal `yes`, which is equivalent for a CLI invoked via exec
        // rather than through a shell.
        let output = Command::new(&self.binary)
            .args(["compute", "instances", "delete", name, "--zone", zone, "--quiet"])
            .output()
            .await
            .map_err(|e| ProviderError::Transient(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            if stderr.contains("Rate Limit Exceeded") {
                return Err(ProviderError::RateLimited(stderr));
            }
            if stderr.contains("was not found") {
                return Err(ProviderError::NotFound);
            }
            return Err(ProviderError::Transient(stderr));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;