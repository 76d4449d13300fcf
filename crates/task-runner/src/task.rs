// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A unit of desired background work.
///
/// Tasks are immutable descriptions; the [`Runner`](crate::Runner) decides
/// whether a task is already running by comparing it against the tasks of
/// live workers.
///
/// # Invariant
///
/// Two tasks for which [`Task::equals`] returns `true` must return the same
/// value from [`Task::hash`]. The converse does not hold: hash collisions
/// are legal and the runner tolerates them.
pub trait Task: Send + Sync + 'static {
    /// Returns a fast, deterministic fingerprint of the task's defining
    /// fields. Not required to be collision-free.
    fn hash(&self) -> u64;

    /// Returns `true` iff `other` represents the same logical unit of work,
    /// in which case a running worker for `other` is kept as-is instead of
    /// being restarted.
    fn equals(&self, other: &Self) -> bool;
}

/// A running execution bound to exactly one task.
///
/// The run loop must suspend only on its own work or on `shutdown`, and
/// must return promptly once `shutdown` fires: cancellation is cooperative,
/// and a worker that ignores it blocks reconciliation indefinitely.
#[async_trait]
pub trait Worker: Send + 'static {
    /// Runs the worker until it terminates on its own or `shutdown` is
    /// cancelled. Internal errors are the worker's own concern; the runner
    /// only observes the run loop returning.
    async fn run(&mut self, shutdown: CancellationToken);
}
