// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Bridges externally discovered container targets to runner tasks and
//! keeps the position store consistent with the settled task set.
//!
//! The one ordering rule that matters here: a target's position entry may
//! be deleted only after its tailer has fully stopped. The runner gives us
//! that for free, because `apply_tasks` does not return until removed
//! workers have drained.

use std::collections::HashSet;
use std::sync::Arc;

use task_runner::{Runner, RunnerError, Worker};
use tokio::sync::Mutex;
use tracing::info;

use crate::positions::{cursor_key, Entry};
use crate::tailer::{Options, Tailer, TailerTask};
use crate::target::StreamTarget;

/// Manages a set of running tailers.
///
/// If a manager is created with `None` options, no targets are scheduled
/// for running until [`Manager::update_options`] supplies a snapshot.
/// Options must not be modified after being passed in.
pub struct Manager {
    runner: Runner<TailerTask>,
    /// Held across the whole runner round-trip of `sync_targets` and
    /// `update_options`; safe because `apply_tasks` never re-enters the
    /// manager.
    inner: Mutex<ManagerState>,
}

struct ManagerState {
    opts: Option<Arc<Options>>,
    /// Targets from the last successful sync, kept so that
    /// `update_options` can rebuild the task list and `sync_targets` can
    /// prune positions for targets that went away.
    targets: Vec<Arc<dyn StreamTarget>>,
}

impl Manager {
    /// Returns a new manager which tails with the given shared options.
    pub fn new(opts: Option<Arc<Options>>) -> Self {
        Self {
            runner: Runner::new(|task: &Arc<TailerTask>| {
                Ok(Box::new(Tailer::new(task)) as Box<dyn Worker>)
            }),
            inner: Mutex::new(ManagerState {
                opts,
                targets: Vec::new(),
            }),
        }
    }

    /// Synchronizes the set of running tailers to `targets`.
    ///
    /// Position entries implied by the previous target list but absent
    /// from the new one are removed, strictly after the runner has settled.
    ///
    /// # Errors
    ///
    /// Propagates the runner's reconciliation error; local state is left
    /// unchanged in that case.
    pub async fn sync_targets(
        &self,
        targets: Vec<Arc<dyn StreamTarget>>,
    ) -> Result<(), RunnerError> {
        let mut state = self.inner.lock().await;

        // Convert targets into tasks for the runner. Without options
        // there is nothing to run: the runner is cleared of tasks until
        // update_options supplies a snapshot.
        let tasks = build_tasks(state.opts.as_ref(), &targets);
        self.runner.apply_tasks(&tasks).await?;

        // Delete positions for targets which have gone away. This runs
        // only after apply_tasks has returned, so the old tailers have
        // shut down; a tailer that is still draining might write its
        // position again after we removed it.
        if let Some(opts) = &state.opts {
            let new_entries: HashSet<Entry> = targets
                .iter()
                .map(|target| entry_for_target(target.as_ref()))
                .collect();

            for old in &state.targets {
                let ent = entry_for_target(old.as_ref());
                if !new_entries.contains(&ent) {
                    info!(path = %ent.path, labels = %ent.labels, "removing entry from positions store");
                    opts.positions.remove(&ent.path, &ent.labels);
                }
            }
        }

        state.targets = targets;
        Ok(())
    }

    /// Updates the options shared with all tailers.
    ///
    /// Options identity is part of task identity, so every running tailer
    /// is stopped and restarted under the new snapshot; none keeps running
    /// with stale configuration. `None` clears all tasks until options are
    /// supplied again.
    ///
    /// # Errors
    ///
    /// Propagates the runner's reconciliation error; the previous options
    /// stay in effect in that case.
    pub async fn update_options(
        &self,
        new_options: Option<Arc<Options>>,
    ) -> Result<(), RunnerError> {
        let mut state = self.inner.lock().await;

        let tasks = build_tasks(new_options.as_ref(), &state.targets);
        self.runner.apply_tasks(&tasks).await?;

        state.opts = new_options;
        Ok(())
    }

    /// Returns the targets which are actively being tailed. Targets whose
    /// tailers have been removed or are mid-drain are not included.
    pub async fn targets(&self) -> Vec<Arc<dyn StreamTarget>> {
        self.runner
            .tasks()
            .await
            .iter()
            .map(|task| Arc::clone(&task.target))
            .collect()
    }

    /// Stops the manager and all running tailers. Blocks until every
    /// tailer has exited.
    pub async fn stop(&self) {
        self.runner.stop().await;
    }
}

fn build_tasks(
    opts: Option<&Arc<Options>>,
    targets: &[Arc<dyn StreamTarget>],
) -> Vec<Arc<TailerTask>> {
    let Some(opts) = opts else {
        return Vec::new();
    };

    targets
        .iter()
        .map(|target| {
            Arc::new(TailerTask {
                options: Arc::clone(opts),
                target: Arc::clone(target),
            })
        })
        .collect()
}

/// Position-store key for a target. The container ID goes through
/// [`cursor_key`] so a file-backed store treats it as an opaque cursor
/// instead of a path to stat.
fn entry_for_target(target: &dyn StreamTarget) -> Entry {
    Entry {
        path: cursor_key(target.name()),
        labels: target.labels_str().to_string(),
    }
}
