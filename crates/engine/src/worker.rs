// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative one-shot worker primitive (spec.md §4.5), ported from a
//! `threading.Thread` subclass with a capacity-1 exception queue to a
//! `tokio::spawn`'d task with a single-slot failure channel.

use conflux_core::WorkerFailure;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const FINALIZE_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Single-slot, single-producer/single-consumer failure channel. `None`
/// means "nothing posted yet"; after `finalize` drains it once, it reverts
/// to a state that reads as success so a second `finalize` is a no-op.
struct FailureSlot {
    posted: Mutex<Option<Result<(), WorkerFailure>>>,
}

/// Runs one async unit of work exactly once on a background task, capturing
/// success or failure onto a single-slot channel that `finalize` drains.
pub struct WorkerHandle {
    started: AtomicBool,
    finished: Arc<AtomicBool>,
    slot: Arc<FailureSlot>,
}

impl WorkerHandle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: AtomicBool::new(false),
            finished: Arc::new(AtomicBool::new(false)),
            slot: Arc::new(FailureSlot { posted: Mutex::new(None) }),
        })
    }

    /// Launch `work` on a background task. Any call after the first is
    /// ignored — `start()` is one-shot, matching the original thread's
    /// `start()` contract.
    pub fn start<F, Fut>(self: &Arc<Self>, work: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), WorkerFailure>> + Send + 'static,
    {
        if self.started.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            tracing::warn!("WorkerHandle::start called more than once; ignoring");
            return;
        }

        let finished = Arc::clone(&self.finished);
        let slot = Arc::clone(&self.slot);

        tokio::spawn(async move {
            let result = work().await;
            *slot.posted.lock() = Some(result);
            finished.store(true, Ordering::Release);
        });
    }

    /// True once the worker has exited, success or failure. Monotonic: once
    /// true it never becomes false (property 4).
    pub fn finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// True while started but not yet finished.
    pub fn is_alive(&self) -> bool {
        self.started.load(Ordering::Acquire) && !self.finished()
    }

    /// Block (via polling) until the worker has finished, then re-raise any
    /// captured failure. A second call, after the slot has already been
    /// drained, is a no-op (property 5).
    pub async fn finalize(&self) -> Result<(), WorkerFailure> {
        while !self.finished() {
            tokio::time::sleep(FINALIZE_POLL_INTERVAL).await;
        }
        match self.slot.posted.lock().take() {
            Some(result) => result,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;