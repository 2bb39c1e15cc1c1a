/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error type for the cyclic scheduler.
//!
//! Every variant except [`SchedulerError::ConstructionFailed`] is non-fatal:
//! it is returned synchronously from the operation that detected it and the
//! table and lifecycle state are left exactly as they were.
//!
//! | Variant | Raised by |
//! |---|---|
//! | `CapacityExceeded` | `add_task` |
//! | `DuplicateIdentifier` | `add_task` |
//! | `InvalidPeriod` / `EmptyIdentifier` | `add_task` |
//! | `Hyperperiod` | `add_task`, `start` |
//! | `NotFound` | `remove_task`, `describe` |
//! | `AlreadyRunning` | `start` |
//! | `NotRunning` | `stop` |
//! | `ConstructionFailed` | `Scheduler::new` |

use thiserror::Error;

use crate::hyperperiod::HyperperiodError;

/// Top-level error type returned by [`Scheduler`](super::Scheduler) and
/// [`TaskTable`](super::table::TaskTable) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Every slot of the table is occupied.
    #[error("task table is full ({capacity} slot(s))")]
    CapacityExceeded { capacity: usize },

    /// A task with the same identifier is already registered.
    #[error("task '{0}' is already registered")]
    DuplicateIdentifier(String),

    /// No registered task carries this identifier.
    #[error("task '{0}' not found")]
    NotFound(String),

    /// `start()` was called while the tick loop is running.
    #[error("scheduler is already running")]
    AlreadyRunning,

    /// `stop()` was called while the scheduler is stopped.
    #[error("scheduler is not running")]
    NotRunning,

    /// A task was submitted with `period_ms == 0`.
    #[error("task '{task}' has a zero period")]
    InvalidPeriod { task: String },

    /// A task was submitted with an empty identifier.
    #[error("task identifier must not be empty")]
    EmptyIdentifier,

    /// Tick / macrocycle derivation failed for the resulting period set.
    #[error("hyperperiod calculation failed: {0}")]
    Hyperperiod(#[from] HyperperiodError),

    /// The scheduler could not be built (slot reservation failed or invalid
    /// construction parameters).  Fatal: no scheduler exists afterwards.
    #[error("scheduler construction failed: {reason}")]
    ConstructionFailed { reason: String },
}
