// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Converges a set of live workers to a desired set of tasks.
//!
//! Reconciliation is synchronous from the caller's point of view: when
//! [`Runner::apply_tasks`] returns, workers for removed tasks have fully
//! drained and workers for added tasks have been spawned. Retained tasks
//! are never touched, so steady-state reconciliations are free.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::RunnerError;
use crate::task::{Task, Worker};

/// Builds a worker for an accepted task. Injected once at construction.
///
/// Returning an error aborts the start of that worker only; workers that
/// already started during the same reconciliation remain tracked.
type WorkerFactory<T> =
    Box<dyn Fn(&Arc<T>) -> Result<Box<dyn Worker>, RunnerError> + Send + Sync>;

/// A live worker tracked by the registry.
struct ScheduledWorker<T> {
    task: Arc<T>,
    cancel: CancellationToken,
    done: JoinHandle<()>,
}

/// Registry state guarded by the reconciliation lock.
///
/// Workers are keyed by task hash; each bucket is scanned linearly with
/// [`Task::equals`], so hash collisions cost a comparison, never
/// correctness.
struct Registry<T> {
    stopped: bool,
    workers: HashMap<u64, Vec<ScheduledWorker<T>>>,
}

/// Reconciliation engine for a dynamic set of background workers.
///
/// At most one live worker exists per distinct task identity. All state is
/// owned by the runner; callers only ever observe it through
/// [`Runner::tasks`].
pub struct Runner<T: Task> {
    factory: WorkerFactory<T>,
    /// Root token; every worker gets a child of it, so cancelling this
    /// token (directly or via an external parent) cancels all workers.
    shutdown: CancellationToken,
    /// Held for the full duration of one `apply_tasks`/`stop` call,
    /// serializing reconciliations against this runner.
    registry: Mutex<Registry<T>>,
}

impl<T: Task> Runner<T> {
    /// Creates a runner that builds workers with `factory`.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&Arc<T>) -> Result<Box<dyn Worker>, RunnerError> + Send + Sync + 'static,
    {
        Self::with_shutdown(&CancellationToken::new(), factory)
    }

    /// Creates a runner whose workers are additionally cancelled when
    /// `parent` is cancelled, without requiring a call to [`Runner::stop`].
    pub fn with_shutdown<F>(parent: &CancellationToken, factory: F) -> Self
    where
        F: Fn(&Arc<T>) -> Result<Box<dyn Worker>, RunnerError> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            shutdown: parent.child_token(),
            registry: Mutex::new(Registry {
                stopped: false,
                workers: HashMap::new(),
            }),
        }
    }

    /// Converges the running worker set to exactly `tasks`.
    ///
    /// Tasks equal to one already running are retained unchanged. Running
    /// workers with no match in `tasks` are cancelled and drained before
    /// any new worker starts, so a replacement never overlaps the worker
    /// it replaces. Duplicate tasks collapse to a single worker. An empty
    /// slice drains every worker without terminating the runner.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Stopped`] after [`Runner::stop`], or the
    /// first [`RunnerError::WorkerStart`] reported by the factory. Workers
    /// that did start remain tracked.
    pub async fn apply_tasks(&self, tasks: &[Arc<T>]) -> Result<(), RunnerError> {
        let mut registry = self.registry.lock().await;
        if registry.stopped {
            return Err(RunnerError::Stopped);
        }

        // Group the desired tasks into hash buckets, collapsing duplicate
        // identities within this call.
        let mut desired: HashMap<u64, Vec<Arc<T>>> = HashMap::with_capacity(tasks.len());
        for task in tasks {
            let bucket = desired.entry(task.hash()).or_default();
            if !bucket.iter().any(|existing| existing.equals(task)) {
                bucket.push(Arc::clone(task));
            }
        }

        // Split the running set: entries matching a desired task are
        // retained untouched (and consume their candidate), the rest are
        // scheduled for cancellation.
        let mut retained: HashMap<u64, Vec<ScheduledWorker<T>>> = HashMap::new();
        let mut stopping: Vec<ScheduledWorker<T>> = Vec::new();

        for (hash, entries) in registry.workers.drain() {
            for entry in entries {
                let keep = desired.get_mut(&hash).is_some_and(|bucket| {
                    match bucket.iter().position(|task| task.equals(&entry.task)) {
                        Some(idx) => {
                            bucket.swap_remove(idx);
                            true
                        }
                        None => false,
                    }
                });

                if keep {
                    retained.entry(hash).or_default().push(entry);
                } else {
                    stopping.push(entry);
                }
            }
        }

        // Cancel removed workers and wait for their run loops to return
        // before starting anything new. A replacement for the same logical
        // resource must never overlap the worker it replaces.
        drain_workers(stopping).await;

        // Start workers for the remaining candidates. On a factory error,
        // keep going so the registry ends up tracking everything that did
        // start, and surface the first error to the caller.
        let mut result = Ok(());
        for (hash, bucket) in desired {
            for task in bucket {
                match self.start_worker(&task) {
                    Ok(entry) => retained.entry(hash).or_default().push(entry),
                    Err(err) => {
                        warn!(%err, "failed to start worker for task");
                        if result.is_ok() {
                            result = Err(err);
                        }
                    }
                }
            }
        }

        registry.workers = retained;
        result
    }

    /// Spawns a worker for `task` on its own tokio task with a child
    /// cancellation token.
    fn start_worker(&self, task: &Arc<T>) -> Result<ScheduledWorker<T>, RunnerError> {
        let mut worker = (self.factory)(task)?;
        let cancel = self.shutdown.child_token();
        let worker_cancel = cancel.clone();

        let done = tokio::spawn(async move {
            worker.run(worker_cancel).await;
        });

        Ok(ScheduledWorker {
            task: Arc::clone(task),
            cancel,
            done,
        })
    }

    /// Returns a snapshot of the tasks with a live worker.
    ///
    /// Tasks whose workers were scheduled for cancellation are removed from
    /// the registry while the reconciliation lock is held, so they never
    /// appear here mid-drain.
    pub async fn tasks(&self) -> Vec<Arc<T>> {
        let registry = self.registry.lock().await;
        registry
            .workers
            .values()
            .flatten()
            .map(|entry| Arc::clone(&entry.task))
            .collect()
    }

    /// Returns the number of live workers.
    pub async fn workers(&self) -> usize {
        let registry = self.registry.lock().await;
        registry.workers.values().map(Vec::len).sum()
    }

    /// Cancels every running worker and blocks until all have drained.
    ///
    /// The runner is terminal afterwards: further [`Runner::apply_tasks`]
    /// calls return [`RunnerError::Stopped`]. Calling `stop` again is a
    /// no-op.
    pub async fn stop(&self) {
        let mut registry = self.registry.lock().await;
        if registry.stopped {
            return;
        }
        registry.stopped = true;

        debug!("stopping runner and draining all workers");

        // Cancelling the root token reaches every child token at once.
        self.shutdown.cancel();

        let stopping: Vec<ScheduledWorker<T>> =
            registry.workers.drain().flat_map(|(_, entries)| entries).collect();
        drain_workers(stopping).await;
    }
}

/// Cancels `stopping` and waits for every run loop to return.
async fn drain_workers<T: Task>(stopping: Vec<ScheduledWorker<T>>) {
    for entry in &stopping {
        entry.cancel.cancel();
    }
    for entry in stopping {
        let task_hash = entry.task.hash();
        if entry.done.await.is_err() {
            // A panicked worker still counts as drained; it cannot touch
            // its resource anymore.
            warn!(task_hash, "worker panicked while draining");
        }
    }
}
