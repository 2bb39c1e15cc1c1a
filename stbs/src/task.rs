/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Periodic task descriptor.
//!
//! A [`Task`] carries two kinds of fields:
//!
//! ```text
//! requested by the caller          derived by the scheduler
//! ────────────────────────         ─────────────────────────────
//! id, period_ms, priority          period_ticks, activation_count
//! ```
//!
//! The derived fields are private: `period_ticks` is rewritten on every
//! hyperperiod recomputation and `activation_count` only ever grows while the
//! task sits in the table.  Callers read them through accessors on the clones
//! returned by `Scheduler::describe`.

use std::fmt;

use crate::hyperperiod::Timing;

/// One periodic unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Identifier, unique among registered tasks.
    pub id: String,

    /// Requested activation period in milliseconds.  Must be `> 0`.
    pub period_ms: u64,

    /// Informational priority.  Carried and reported, never used to order
    /// activations.
    pub priority: u8,

    /// `period_ms / tick_ms` for the current table timing.
    period_ticks: u64,

    /// Number of activations since the task was registered.
    activation_count: u64,
}

impl Task {
    /// Create a task descriptor.  Derived fields start at zero and are filled
    /// in once the task is registered.
    pub fn new(id: impl Into<String>, period_ms: u64, priority: u8) -> Self {
        Self {
            id: id.into(),
            period_ms,
            priority,
            period_ticks: 0,
            activation_count: 0,
        }
    }

    /// Ticks between two activations; `0` until the task has been registered.
    pub fn period_ticks(&self) -> u64 {
        self.period_ticks
    }

    /// Activations delivered since the task was registered.
    pub fn activation_count(&self) -> u64 {
        self.activation_count
    }

    /// Whether the task activates on tick `elapsed_ticks`.
    ///
    /// A task without a valid `period_ticks` never activates.
    pub fn is_due(&self, elapsed_ticks: u64) -> bool {
        self.period_ticks != 0 && elapsed_ticks % self.period_ticks == 0
    }

    pub(crate) fn apply_timing(&mut self, timing: &Timing) {
        self.period_ticks = timing.period_ticks(self.period_ms);
    }

    pub(crate) fn record_activation(&mut self) -> u64 {
        self.activation_count += 1;
        self.activation_count
    }

    /// Clear derived state so a descriptor handed back by the scheduler can be
    /// registered again from scratch.
    pub(crate) fn reset(&mut self) {
        self.period_ticks = 0;
        self.activation_count = 0;
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] period={}ms ({} ticks) priority={} activations={}",
            self.id, self.period_ms, self.period_ticks, self.priority, self.activation_count
        )
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_has_zeroed_derived_fields() {
        let t = Task::new("blink", 100, 3);
        assert_eq!(t.id, "blink");
        assert_eq!(t.period_ticks(), 0);
        assert_eq!(t.activation_count(), 0);
    }

    #[test]
    fn unregistered_task_is_never_due() {
        let t = Task::new("blink", 100, 0);
        assert!(!t.is_due(0));
        assert!(!t.is_due(7));
    }

    #[test]
    fn due_on_multiples_of_period_ticks() {
        let mut t = Task::new("a", 100, 0);
        t.apply_timing(&Timing {
            tick_ms: 50,
            macrocycle_ticks: 10,
        });
        assert_eq!(t.period_ticks(), 2);
        let due: Vec<u64> = (0..10).filter(|&k| t.is_due(k)).collect();
        assert_eq!(due, vec![0, 2, 4, 6, 8]);
    }

    #[test]
    fn activation_count_increments_and_resets() {
        let mut t = Task::new("a", 10, 0);
        assert_eq!(t.record_activation(), 1);
        assert_eq!(t.record_activation(), 2);
        t.reset();
        assert_eq!(t.activation_count(), 0);
    }

    #[test]
    fn display_lists_all_fields() {
        let t = Task::new("btn", 250, 2);
        let s = t.to_string();
        assert!(s.contains("[btn]"));
        assert!(s.contains("period=250ms"));
        assert!(s.contains("priority=2"));
    }
}
