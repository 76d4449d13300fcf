// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Generic reconciliation engine for sets of long-running background tasks.
//!
//! A [`Runner`] owns a set of live workers and converges it to match a
//! caller-supplied desired set of tasks on every call to
//! [`Runner::apply_tasks`]. Tasks are compared by a fast hash plus
//! structural equality, so unchanged tasks keep their workers across
//! reconciliations while removed tasks are cancelled and drained before
//! their replacements start.
//!
//! ```text
//!   desired tasks ──> apply_tasks ──> retain / cancel+drain / start
//!                                          │
//!                                          v
//!                            registry: hash -> [task, cancel, done]
//! ```
//!
//! The engine knows nothing about what a task does; consumers supply a
//! worker factory at construction time and implement [`Task`] and
//! [`Worker`] for their own payloads.

#![deny(clippy::all)]
#![deny(unused_extern_crates)]
#![deny(unreachable_pub)]

/// Error types surfaced by reconciliation.
pub mod error;

/// The reconciliation engine and its registry.
pub mod runner;

/// Task and worker contracts implemented by consumers.
pub mod task;

pub use error::RunnerError;
pub use runner::Runner;
pub use task::{Task, Worker};
