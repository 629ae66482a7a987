// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote command transport abstraction (spec.md §6 "Remote-shell
//! transport"), split out behind a trait so the processor state machine can
//! be exercised without spawning a real `ssh` binary — mirroring how the
//! provider crate separates `ComputeProvider` from its CLI-backed
//! implementation.

use async_trait::async_trait;
use std::io;
use std::process::Stdio;

/// One remote command invocation's outcome.
#[derive(Debug, Clone)]
pub struct RemoteOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait RemoteHandle: Send {
    async fn wait(self: Box<Self>) -> io::Result<RemoteOutput>;
}

#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Spawn `command` against `user@endpoint` using the given private key,
    /// returning a handle the caller awaits independently of the spawn.
    async fn spawn(
        &self,
        endpoint: &str,
        user: &str,
        key_path: &str,
        command: &str,
    ) -> io::Result<Box<dyn RemoteHandle>>;
}

/// Escapes single quotes Python-`adapt_cmd`-style: `'` becomes `'"'"'`, and
/// the whole command is wrapped in single quotes for the remote shell.
pub fn escape_remote_command(command: &str) -> String {
    format!("'{}'", command.replace('\'', "'\"'\"'"))
}

struct ChildHandle(tokio::process::Child);

#[async_trait]
impl RemoteHandle for ChildHandle {
    async fn wait(self: Box<Self>) -> io::Result<RemoteOutput> {
        let output = self.0.wait_with_output().await?;
        Ok(RemoteOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Shells out to the real `ssh` binary (spec.md §6's exact flag grammar).
pub struct SshRemoteShell;

#[async_trait]
impl RemoteShell for SshRemoteShell {
    async fn spawn(
        &self,
        endpoint: &str,
        user: &str,
        key_path: &str,
        command: &str,
    ) -> io::Result<Box<dyn RemoteHandle>> {
        let target = format!("{user}@{endpoint}");
        let remote_cmd = escape_remote_command(command);
        let child = tokio::process::Command::new("ssh")
            .args([
                "-i",
                key_path,
                "-o",
                "CheckHostIP=no",
                "-o",
                "StrictHostKeyChecking=no",
                &target,
                "--",
                &remote_cmd,
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        Ok(Box::new(ChildHandle(child)))
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    struct FakeHandle(RemoteOutput);

    #[async_trait]
    impl RemoteHandle for FakeHandle {
        async fn wait(self: Box<Self>) -> io::Result<RemoteOutput> {
            Ok(self.0)
        }
    }

    /// Scripted remote shell: each `spawn()` call pops the next queued
    /// output (or repeats the last one once the queue is exhausted), and
    /// records every `(endpoint, command)` pair it was asked to run.
    pub struct FakeRemoteShell {
        queue: Mutex<VecDeque<RemoteOutput>>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl FakeRemoteShell {
        pub fn new(outputs: Vec<RemoteOutput>) -> Self {
            Self { queue: Mutex::new(outputs.into()), calls: Mutex::new(Vec::new()) }
        }

        pub fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl RemoteShell for FakeRemoteShell {
        async fn spawn(
            &self,
            endpoint: &str,
            _user: &str,
            _key_path: &str,
            command: &str,
        ) -> io::Result<Box<dyn RemoteHandle>> {
            self.calls.lock().push((endpoint.to_string(), command.to_string()));
            let mut queue = self.queue.lock();
            let output = if queue.len() > 1 {
                #[allow(clippy::expect_used)]
                let next = queue.pop_front().expect("len() > 1 checked above");
                next
            } else {
                queue.front().cloned().unwrap_or(RemoteOutput {
                    success: true,
                    stdout: String::new(),
                    stderr: String::new(),
                })
            };
            Ok(Box::new(FakeHandle(output)))
        }
    }
}

#[cfg(test)]
#[path = "remote_shell_tests.rs"]
mod tests;