// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Container log tailing built on the [`task_runner`] reconciliation engine.
//!
//! A [`Manager`](manager::Manager) receives externally discovered container
//! targets, turns each into a task, and lets a
//! [`Runner`](task_runner::Runner) converge the set of running
//! [`Tailer`](tailer::Tailer) workers to match. After every reconciliation
//! the manager prunes the external position store so no entry outlives its
//! target.
//!
//! ```text
//!   discovery ──> Manager::sync_targets ──> Runner::apply_tasks
//!                        │                        │
//!                        v                        v
//!                  positions pruning        Tailer workers
//! ```
//!
//! The container API, position-store persistence, and log transport are
//! collaborator contracts only; this crate defines no wire format.

#![deny(clippy::all)]
#![deny(unused_extern_crates)]
#![deny(unreachable_pub)]

/// Target-to-task translation and position-store synchronization.
pub mod manager;

#[cfg(test)]
pub(crate) mod mock;

/// Position-store contract and entry keying.
pub mod positions;

/// Liveness loop keeping one container's log stream active.
pub mod tailer;

/// Collaborator contracts for the container API and log targets.
pub mod target;

pub use manager::Manager;
pub use tailer::{Options, Tailer, TailerTask};
