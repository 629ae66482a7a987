// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::processor::ProcessorSpec;
use crate::remote_shell::fake::FakeRemoteShell;
use crate::remote_shell::RemoteOutput;
use conflux_core::clock::FakeClock;
use conflux_core::{InputEntry, ModuleContract, ModuleError, ModuleInstance, ModuleKind, OutputBundle};
use conflux_provider::fake::{FakeComputeProvider, ScriptedInstance};
use conflux_provider::InstanceStatus;
use indexmap::IndexMap;
use std::collections::HashSet;
use tokio::net::TcpListener;

/// A module whose `build_command`/`collect_output` are scripted, so node
/// tests exercise the lifecycle without a real bioinformatics tool.
struct ScriptedModule {
    required_inputs: HashSet<DataKey>,
    outputs: HashSet<DataKey>,
    fail_command: bool,
}

impl ModuleContract for ScriptedModule {
    fn required_input_keys(&self) -> HashSet<DataKey> {
        self.required_inputs.clone()
    }

    fn declared_output_keys(&self) -> HashSet<DataKey> {
        self.outputs.clone()
    }

    fn build_command(&self, _input: &InputBundle) -> Result<String, ModuleError> {
        if self.fail_command {
            return Err(ModuleError::CommandBuildFailed("scripted failure".to_string()));
        }
        Ok("echo hi".to_string())
    }

    fn collect_output(&self, _input: &InputBundle, _stdout: &str, _stderr: &str) -> Result<OutputBundle, ModuleError> {
        let mut map = IndexMap::new();
        for key in &self.outputs {
            map.insert(key.clone(), conflux_core::OutputValue::Raw(serde_json::Value::String("ok".to_string())));
        }
        Ok(OutputBundle::Keyed(map))
    }
}

fn spec(ssh_port: u16) -> ProcessorSpec {
    ProcessorSpec {
        cpus: 1,
        mem_gb: 4,
        disk_gb: 20,
        zone: "us-central1-a".to_string(),
        image: "projects/example/global/images/family/conflux-base".to_string(),
        service_account: "conflux@example.iam.gserviceaccount.com".to_string(),
        preemptible: false,
        boot_disk_ssd: false,
        local_ssd_count: 0,
        ssh_user: "conflux".to_string(),
        ssh_key_path: "/etc/conflux/id_rsa".to_string(),
        ssh_port,
        default_num_cmd_retries: 2,
    }
}

async fn listening_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        loop {
            if listener.accept().await.is_err() {
                break;
            }
        }
    });
    port
}

fn module(outputs: &[&str], fail_command: bool) -> ModuleInstance {
    ModuleInstance {
        kind: ModuleKind::Tool,
        contract: Box::new(ScriptedModule {
            required_inputs: HashSet::new(),
            outputs: outputs.iter().map(|k| DataKey::from(*k)).collect(),
            fail_command,
        }),
    }
}

#[tokio::test(start_paused = true)]
async fn successful_execution_produces_output_and_finishes() {
    let port = listening_port().await;
    let provider = FakeComputeProvider::new();
    provider.script("n1", ScriptedInstance::new(vec![Ok(InstanceStatus::Running)]).with_nat_ip("127.0.0.1"));
    let shell = Arc::new(FakeRemoteShell::new(vec![RemoteOutput {
        success: true,
        stdout: "done".to_string(),
        stderr: String::new(),
    }]));
    let processor = Processor::with_clock_and_shell("n1", spec(port), provider, FakeClock::new(), shell);

    let node = Arc::new(Node::new("t1", module(&["x"], false), processor, 1, false));
    node.set_input(InputBundle::new(vec![InputEntry::MainInput(vec![])]));

    assert_eq!(node.state(), NodeState::Pending);
    node.start();
    assert_eq!(node.state(), NodeState::Running);
    node.finalize().await.unwrap();

    assert!(node.finished());
    assert!(!node.is_alive());
    assert_eq!(node.state(), NodeState::Finished);
    let output = node.get_output().expect("output present after successful finalize");
    assert_eq!(output.declared_keys(), HashSet::from([DataKey::from("x")]));
}

#[tokio::test(start_paused = true)]
async fn command_build_failure_surfaces_as_worker_failure() {
    let port = listening_port().await;
    let provider = Arc::new(FakeComputeProvider::new());
    provider.script("n2", ScriptedInstance::new(vec![Ok(InstanceStatus::Running)]).with_nat_ip("127.0.0.1"));
    let shell = Arc::new(FakeRemoteShell::new(vec![]));
    let processor = Processor::with_clock_and_shell("n2", spec(port), provider.clone(), FakeClock::new(), shell);

    let node = Arc::new(Node::new("t2", module(&["x"], true), processor, 1, false));
    node.set_input(InputBundle::new(vec![InputEntry::MainInput(vec![])]));
    node.start();

    let err = node.finalize().await.unwrap_err();
    assert_eq!(err.tool_id, "t2");
    assert_eq!(node.state(), NodeState::Failed);
    assert!(node.get_output().is_none());
    assert!(
        provider.destroyed_names().contains(&"n2".to_string()),
        "processor must be destroyed even when build_command fails"
    );
}

#[tokio::test]
async fn finalize_before_start_set_input_reports_failure_not_panic() {
    let provider = FakeComputeProvider::new();
    let processor = Processor::with_clock_and_shell(
        "n3",
        spec(22),
        provider,
        FakeClock::new(),
        Arc::new(FakeRemoteShell::new(vec![])),
    );
    let node = Arc::new(Node::new("t3", module(&["x"], false), processor, 1, false));
    node.start();
    let err = node.finalize().await.unwrap_err();
    assert!(err.message.contains("set_input"));
}

#[test]
fn check_input_reports_missing_keys() {
    let provider = FakeComputeProvider::new();
    let processor = Processor::with_clock_and_shell(
        "n4",
        spec(22),
        provider,
        FakeClock::new(),
        Arc::new(FakeRemoteShell::new(vec![])),
    );
    let contract = ScriptedModule {
        required_inputs: HashSet::from([DataKey::from("bam")]),
        outputs: HashSet::new(),
        fail_command: false,
    };
    let node = Node::new(
        "t4",
        ModuleInstance { kind: ModuleKind::Tool, contract: Box::new(contract) },
        processor,
        1,
        false,
    );
    let err = node.check_input(&HashSet::new()).unwrap_err();
    assert!(err.contains("t4"));
    assert!(err.contains("bam"));
}

#[test]
fn check_output_reports_undeclared_final_output() {
    let provider = FakeComputeProvider::new();
    let processor = Processor::with_clock_and_shell(
        "n5",
        spec(22),
        provider,
        FakeClock::new(),
        Arc::new(FakeRemoteShell::new(vec![])),
    );
    let node = Node::new("t5", module(&["x"], false), processor, 1, false);
    let err = node.check_output(&HashSet::from([DataKey::from("y")])).unwrap_err();
    assert!(err.contains("y"));
}
