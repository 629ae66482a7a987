// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::fake::FakeRemoteShell;
use super::*;

#[test]
fn escape_wraps_command_in_single_quotes() {
    assert_eq!(escape_remote_command("echo hi"), "'echo hi'");
}

#[test]
fn escape_handles_embedded_single_quotes() {
    assert_eq!(escape_remote_command("echo 'hi'"), "'echo '\"'\"'hi'\"'\"''");
}

#[test]
fn escape_is_idempotent_on_commands_without_quotes() {
    let cmd = "samtools sort -o out.bam in.bam";
    assert_eq!(escape_remote_command(cmd), format!("'{cmd}'"));
}

#[tokio::test]
async fn fake_shell_records_endpoint_and_command_per_call() {
    let shell = FakeRemoteShell::new(vec![RemoteOutput { success: true, stdout: "ok".into(), stderr: String::new() }]);
    let handle = shell.spawn("10.0.0.1", "ubuntu", "/key", "echo hi").await.unwrap();
    let out = handle.wait().await.unwrap();
    assert!(out.success);
    assert_eq!(out.stdout, "ok");
    assert_eq!(shell.call_count(), 1);
    assert_eq!(shell.calls(), vec![("10.0.0.1".to_string(), "echo hi".to_string())]);
}

#[tokio::test]
async fn fake_shell_replays_queue_in_order_then_holds_last() {
    let shell = FakeRemoteShell::new(vec![
        RemoteOutput { success: false, stdout: String::new(), stderr: "first".into() },
        RemoteOutput { success: true, stdout: "second".into(), stderr: String::new() },
    ]);

    let first = shell.spawn("h", "u", "k", "cmd1").await.unwrap().wait().await.unwrap();
    assert!(!first.success);
    assert_eq!(first.stderr, "first");

    let second = shell.spawn("h", "u", "k", "cmd2").await.unwrap().wait().await.unwrap();
    assert!(second.success);
    assert_eq!(second.stdout, "second");

    // queue exhausted: the last entry repeats rather than panicking.
    let third = shell.spawn("h", "u", "k", "cmd3").await.unwrap().wait().await.unwrap();
    assert!(third.success);
    assert_eq!(third.stdout, "second");
    assert_eq!(shell.call_count(), 3);
}

#[tokio::test]
async fn fake_shell_with_empty_queue_defaults_to_success() {
    let shell = FakeRemoteShell::new(vec![]);
    let out = shell.spawn("h", "u", "k", "cmd").await.unwrap().wait().await.unwrap();
    assert!(out.success);
    assert_eq!(out.stdout, "");
}