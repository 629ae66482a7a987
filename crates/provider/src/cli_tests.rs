// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use conflux_core::MAIN_INPUT;

fn base_request() -> CreateRequest {
    CreateRequest {
        name: "node-1".into(),
        zone: "us-central1-a".into(),
        image: "projects/debian-cloud/global/images/family/debian-12".into(),
        service_account: "pipeline@project.iam.gserviceaccount.com".into(),
        cpus: 4,
        mem_gb: 16,
        disk_gb: 100,
        instance_type: "n1-standard-4".into(),
        preemptible: true,
        boot_disk_ssd: true,
        local_ssd_count: 0,
    }
}

#[test]
fn boot_disk_size_under_10tb_uses_gb() {
    assert_eq!(CliComputeProvider::boot_disk_size_flag(100), "100GB");
    assert_eq!(CliComputeProvider::boot_disk_size_flag(10239), "10239GB");
}

#[test]
fn boot_disk_size_at_or_above_10240_uses_tb() {
    assert_eq!(CliComputeProvider::boot_disk_size_flag(10240), "10TB");
    assert_eq!(CliComputeProvider::boot_disk_size_flag(20481), "20TB");
}

#[test]
fn create_args_include_preemptible_and_scopes() {
    let req = base_request();
    let args = CliComputeProvider::create_args(&req);
    assert!(args.contains(&"--preemptible".to_string()));
    assert!(args.contains(&"--scopes".to_string()));
    assert!(args.contains(&"cloud-platform".to_string()));
    assert!(args.contains(&"--machine-type".to_string()));
    assert!(args.contains(&"n1-standard-4".to_string()));
}

#[test]
fn create_args_omit_preemptible_flag_when_not_requested() {
    let mut req = base_request();
    req.preemptible = false;
    let args = CliComputeProvider::create_args(&req);
    assert!(!args.contains(&"--preemptible".to_string()));
}

#[test]
fn create_args_use_custom_cpu_memory_for_custom_shapes() {
    let mut req = base_request();
    req.instance_type = "custom-4-16384".into();
    let args = CliComputeProvider::create_args(&req);
    assert!(args.contains(&"--custom-cpu".to_string()));
    assert!(args.contains(&"--custom-memory".to_string()));
    assert!(!args.contains(&"--machine-type".to_string()));
}

#[test]
fn create_args_repeat_local_ssd_flag_per_disk() {
    let mut req = base_request();
    req.local_ssd_count = 2;
    let args = CliComputeProvider::create_args(&req);
    let count = args.iter().filter(|a| *a == "--local-ssd").count();
    assert_eq!(count, 2);
}

#[test]
fn boot_disk_type_reflects_ssd_flag() {
    let mut req = base_request();
    req.boot_disk_ssd = false;
    let args = CliComputeProvider::create_args(&req);
    let idx = args.iter().position(|a| a == "--boot-disk-type").unwrap();
    assert_eq!(args[idx + 1], "pd-standard");
}

#[test]
fn main_input_sentinel_is_unaffected_by_cli_request_shape() {
    // sanity: conflux-core's sentinel constant is independent of provider wiring
    assert_eq!(MAIN_INPUT, "main_input");
}