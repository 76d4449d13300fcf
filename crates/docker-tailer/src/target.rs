// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Collaborator contracts at the crate boundary.
//!
//! Everything here is an interface onto a component this crate does not
//! own: the container inspection API, the log-streaming target, and the
//! sink that receives log entries. Production implementations wrap the
//! real container client and ingestion pipeline; tests supply mocks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Runtime state of an inspected container.
///
/// `finished_at` is the raw RFC 3339 timestamp as reported by the
/// container API; parsing it (and tolerating garbage in it) is the
/// tailer's concern.
#[derive(Debug, Clone)]
pub struct ContainerState {
    /// Whether the container is currently running.
    pub running: bool,
    /// When the container last finished, RFC 3339. May be empty or a
    /// zero-value timestamp for containers that never ran to completion.
    pub finished_at: String,
}

/// Error returned by a failed container inspection.
///
/// Always treated as transient by callers: logged and retried on the next
/// liveness tick.
#[derive(Debug, thiserror::Error)]
#[error("container inspect failed: {0}")]
pub struct InspectError(pub String);

/// Client for inspecting the current state of a container.
#[async_trait]
pub trait ContainerInspector: Send + Sync {
    /// Inspects the container identified by `id`.
    async fn inspect(&self, id: &str) -> Result<ContainerState, InspectError>;
}

/// A log-streaming target for one container.
///
/// The target owns the actual log reading; the tailer only decides *when*
/// it should be running. `start_if_not_running` and `stop` must both be
/// idempotent.
pub trait StreamTarget: Send + Sync {
    /// Stable identifier of the container backing this target.
    fn name(&self) -> &str;

    /// Fast fingerprint of the target's identity, used as the task hash.
    fn hash(&self) -> u64;

    /// The target's label set in canonical string form. Part of the task
    /// identity and of the position-store key.
    fn labels_str(&self) -> &str;

    /// Unix timestamp (seconds) of the last stream checkpoint, i.e. how
    /// far this target has read.
    fn last(&self) -> i64;

    /// Starts streaming logs if the target is not already streaming.
    fn start_if_not_running(&self);

    /// Stops streaming. Safe to call on a stopped target.
    fn stop(&self);
}

/// A single log line read from a container.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// When the line was produced.
    pub timestamp: DateTime<Utc>,
    /// Label set of the originating target, canonical string form.
    pub labels: String,
    /// The log line itself.
    pub line: String,
}

/// Receives log entries read by stream targets.
pub trait EntrySink: Send + Sync {
    /// Hands one entry to the ingestion pipeline. Must not block the
    /// caller indefinitely.
    fn handle(&self, entry: LogEntry);
}
