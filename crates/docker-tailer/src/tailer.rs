// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The tailer worker: keeps one container's log stream running for as long
//! as the container warrants it.
//!
//! A tailer does no log reading itself. On a fixed interval it inspects
//! the container and starts the underlying [`StreamTarget`] when the
//! container is running, or has finished at-or-after the stream's last
//! checkpoint (logs produced since the last read are still owed). All
//! inspection failures are transient: logged and retried on the next tick.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use task_runner::{Task, Worker};
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::positions::Positions;
use crate::target::{ContainerInspector, EntrySink, StreamTarget};

/// Options shared by all tailers of one manager.
///
/// An `Options` value is an immutable configuration snapshot: it must not
/// be mutated after being handed to a manager. Configuration changes go
/// through [`Manager::update_options`](crate::Manager::update_options),
/// which replaces the snapshot wholesale and restarts every worker.
pub struct Options {
    /// Client used to inspect containers.
    pub inspector: Arc<dyn ContainerInspector>,
    /// Sink that discovered log entries are sent to.
    pub sink: Arc<dyn EntrySink>,
    /// Store of stream resume offsets, pruned by the manager.
    pub positions: Arc<dyn Positions>,
    /// How often each tailer re-checks its container's liveness.
    pub target_restart_interval: Duration,
}

/// The payload used to create tailers. Implements [`Task`].
pub struct TailerTask {
    /// Shared configuration snapshot, compared by reference: a new
    /// snapshot means every task is a new identity and every worker
    /// restarts, so no tailer ever runs with stale configuration.
    pub options: Arc<Options>,
    /// The stream target this task is responsible for.
    pub target: Arc<dyn StreamTarget>,
}

impl Task for TailerTask {
    fn hash(&self) -> u64 {
        self.target.hash()
    }

    fn equals(&self, other: &Self) -> bool {
        // Quick path: same allocation.
        if std::ptr::eq(self, other) {
            return true;
        }

        Arc::ptr_eq(&self.options, &other.options)
            && self.target.labels_str() == other.target.labels_str()
    }
}

/// A tailer keeps the log stream of one container alive. Created by a
/// [`Manager`](crate::Manager) through the runner's worker factory.
pub struct Tailer {
    opts: Arc<Options>,
    target: Arc<dyn StreamTarget>,
}

impl Tailer {
    /// Returns a new tailer for the target carried by `task`.
    pub fn new(task: &TailerTask) -> Self {
        Self {
            opts: Arc::clone(&task.options),
            target: Arc::clone(&task.target),
        }
    }

    /// One liveness check: inspect the container and start the stream if
    /// it should be running.
    async fn check_target(&self) {
        let id = self.target.name();

        let state = match self.opts.inspector.inspect(id).await {
            Ok(state) => state,
            Err(err) => {
                error!(id, %err, "error inspecting container");
                return;
            }
        };

        let finished = match DateTime::parse_from_rfc3339(&state.finished_at) {
            Ok(ts) => ts.timestamp(),
            Err(err) => {
                error!(id, %err, "error parsing finished time for container");
                // Degrade to the epoch rather than aborting the tailer.
                0
            }
        };

        // A container that finished at-or-after our checkpoint may still
        // owe us logs; one that finished strictly before it is already
        // caught up and will be reconciled away.
        if state.running || finished >= self.target.last() {
            self.target.start_if_not_running();
        }
    }
}

#[async_trait]
impl Worker for Tailer {
    async fn run(&mut self, shutdown: CancellationToken) {
        let mut ticker = interval(self.opts.target_restart_interval);
        // The first tick completes immediately; the first liveness check
        // should wait a full interval.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // Bound the inspection with the shutdown signal so a
                    // hung container API cannot stall draining.
                    tokio::select! {
                        () = self.check_target() => {}
                        () = shutdown.cancelled() => break,
                    }
                }
                () = shutdown.cancelled() => break,
            }
        }

        debug!(id = self.target.name(), "tailer stopping");
        self.target.stop();
    }
}
