// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Test doubles for the crate's collaborator contracts.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::positions::Positions;
use crate::target::{
    ContainerInspector, ContainerState, EntrySink, InspectError, LogEntry, StreamTarget,
};

/// Shared, append-only record of mock lifecycle events, used to assert
/// ordering across collaborators.
pub(crate) type EventLog = Arc<Mutex<Vec<String>>>;

/// Stream target double tracking start/stop activity.
pub(crate) struct MockTarget {
    name: String,
    labels: String,
    hash: u64,
    pub(crate) last: AtomicI64,
    streaming: AtomicBool,
    /// Actual Idle -> Streaming transitions (idempotent restarts excluded).
    pub(crate) starts: AtomicUsize,
    /// Every `stop` invocation, idempotent or not.
    pub(crate) stop_calls: AtomicUsize,
    events: EventLog,
}

impl MockTarget {
    pub(crate) fn new(name: &str, labels: &str, hash: u64, events: &EventLog) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            labels: labels.to_string(),
            hash,
            last: AtomicI64::new(0),
            streaming: AtomicBool::new(false),
            starts: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            events: Arc::clone(events),
        })
    }

    pub(crate) fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }
}

impl StreamTarget for MockTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn hash(&self) -> u64 {
        self.hash
    }

    fn labels_str(&self) -> &str {
        &self.labels
    }

    fn last(&self) -> i64 {
        self.last.load(Ordering::SeqCst)
    }

    fn start_if_not_running(&self) {
        if !self.streaming.swap(true, Ordering::SeqCst) {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.events
                .lock()
                .unwrap()
                .push(format!("start:{}", self.name));
        }
    }

    fn stop(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.streaming.store(false, Ordering::SeqCst);
        self.events
            .lock()
            .unwrap()
            .push(format!("stop:{}", self.name));
    }
}

/// Container inspector double with controllable state and failure mode.
pub(crate) struct MockInspector {
    pub(crate) running: AtomicBool,
    pub(crate) finished_at: Mutex<String>,
    pub(crate) fail: AtomicBool,
    pub(crate) inspect_calls: AtomicUsize,
}

impl MockInspector {
    /// A container that is up; `finished_at` is the API's zero value.
    pub(crate) fn running() -> Self {
        Self {
            running: AtomicBool::new(true),
            finished_at: Mutex::new("0001-01-01T00:00:00Z".to_string()),
            fail: AtomicBool::new(false),
            inspect_calls: AtomicUsize::new(0),
        }
    }

    /// A container that exited at the given RFC 3339 time.
    pub(crate) fn finished_at(ts: &str) -> Self {
        Self {
            running: AtomicBool::new(false),
            finished_at: Mutex::new(ts.to_string()),
            fail: AtomicBool::new(false),
            inspect_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ContainerInspector for MockInspector {
    async fn inspect(&self, _id: &str) -> Result<ContainerState, InspectError> {
        self.inspect_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(InspectError("mock inspection failure".to_string()));
        }
        Ok(ContainerState {
            running: self.running.load(Ordering::SeqCst),
            finished_at: self.finished_at.lock().unwrap().clone(),
        })
    }
}

/// Position store double recording every removal.
pub(crate) struct RecordingPositions {
    pub(crate) removed: Mutex<Vec<(String, String)>>,
    events: EventLog,
}

impl RecordingPositions {
    pub(crate) fn new(events: &EventLog) -> Self {
        Self {
            removed: Mutex::new(Vec::new()),
            events: Arc::clone(events),
        }
    }
}

impl Positions for RecordingPositions {
    fn remove(&self, path: &str, labels: &str) {
        self.removed
            .lock()
            .unwrap()
            .push((path.to_string(), labels.to_string()));
        self.events.lock().unwrap().push(format!("remove:{path}"));
    }
}

/// Entry sink double that drops everything.
pub(crate) struct NullSink;

impl EntrySink for NullSink {
    fn handle(&self, _entry: LogEntry) {}
}
