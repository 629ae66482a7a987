// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::AtomicUsize;

#[tokio::test]
async fn finalize_returns_ok_on_success() {
    let worker = WorkerHandle::new();
    worker.start(|| async { Ok(()) });
    worker.finalize().await.unwrap();
}

#[tokio::test]
async fn finalize_reraises_captured_failure() {
    let worker = WorkerHandle::new();
    worker.start(|| async { Err(WorkerFailure::new("t1", "shell_tool", "boom")) });
    let err = worker.finalize().await.unwrap_err();
    assert_eq!(err.tool_id, "t1");
    assert_eq!(err.message, "boom");
}

#[tokio::test]
async fn second_finalize_after_success_is_a_no_op() {
    let worker = WorkerHandle::new();
    worker.start(|| async { Ok(()) });
    worker.finalize().await.unwrap();
    worker.finalize().await.unwrap();
}

#[tokio::test]
async fn second_finalize_after_failure_does_not_reraise_again() {
    let worker = WorkerHandle::new();
    worker.start(|| async { Err(WorkerFailure::new("t1", "shell_tool", "boom")) });
    assert!(worker.finalize().await.is_err());
    assert!(worker.finalize().await.is_ok());
}

#[tokio::test]
async fn finished_is_monotonic() {
    let worker = WorkerHandle::new();
    assert!(!worker.finished());
    worker.start(|| async { Ok(()) });
    worker.finalize().await.unwrap();
    assert!(worker.finished());
}

#[tokio::test]
async fn is_alive_false_before_start_and_after_finish() {
    let worker = WorkerHandle::new();
    assert!(!worker.is_alive());
    worker.start(|| async { Ok(()) });
    worker.finalize().await.unwrap();
    assert!(!worker.is_alive());
}

#[tokio::test]
async fn start_called_twice_runs_work_only_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let worker = WorkerHandle::new();
    let c1 = Arc::clone(&calls);
    worker.start(move || async move {
        c1.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let c2 = Arc::clone(&calls);
    worker.start(move || async move {
        c2.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    worker.finalize().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}