/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Fixed-capacity task table.
//!
//! An arena of `capacity` slots, each empty or holding one [`Task`].  Slots
//! are never compacted: removing a task leaves a hole that the next insert
//! reuses, and the remaining tasks keep their positions.  Slot order is the
//! tie-break order for simultaneous activations and for every listing.

use crate::hyperperiod::Timing;
use crate::task::Task;

use super::error::SchedulerError;

#[derive(Debug)]
pub struct TaskTable {
    slots: Vec<Option<Task>>,
}

impl TaskTable {
    /// Reserve `capacity` empty slots.
    ///
    /// # Errors
    /// [`SchedulerError::ConstructionFailed`] if `capacity` is zero or the
    /// slots cannot be allocated.
    pub fn new(capacity: usize) -> Result<Self, SchedulerError> {
        if capacity == 0 {
            return Err(SchedulerError::ConstructionFailed {
                reason: "capacity must be at least one slot".into(),
            });
        }

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|e| SchedulerError::ConstructionFailed {
                reason: format!("cannot reserve {capacity} slot(s): {e}"),
            })?;
        slots.resize_with(capacity, || None);

        Ok(Self { slots })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Check whether `task` would be accepted by [`insert`](Self::insert)
    /// without touching the table.
    pub fn check_insert(&self, task: &Task) -> Result<(), SchedulerError> {
        if task.id.is_empty() {
            return Err(SchedulerError::EmptyIdentifier);
        }
        if task.period_ms == 0 {
            return Err(SchedulerError::InvalidPeriod {
                task: task.id.clone(),
            });
        }
        if self.position(&task.id).is_some() {
            return Err(SchedulerError::DuplicateIdentifier(task.id.clone()));
        }
        if self.slots.iter().all(Option::is_some) {
            return Err(SchedulerError::CapacityExceeded {
                capacity: self.capacity(),
            });
        }
        Ok(())
    }

    /// Store `task` in the first free slot.  Returns the slot index.
    pub fn insert(&mut self, mut task: Task) -> Result<usize, SchedulerError> {
        self.check_insert(&task)?;
        task.reset();

        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(SchedulerError::CapacityExceeded {
                capacity: self.capacity(),
            })?;
        self.slots[index] = Some(task);
        Ok(index)
    }

    /// Free the slot holding `id` and hand the task back.
    pub fn remove(&mut self, id: &str) -> Result<Task, SchedulerError> {
        let index = self
            .position(id)
            .ok_or_else(|| SchedulerError::NotFound(id.to_string()))?;
        self.slots[index]
            .take()
            .ok_or_else(|| SchedulerError::NotFound(id.to_string()))
    }

    pub fn lookup(&self, id: &str) -> Result<&Task, SchedulerError> {
        self.iter()
            .find(|t| t.id == id)
            .ok_or_else(|| SchedulerError::NotFound(id.to_string()))
    }

    /// Occupied tasks in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> + '_ {
        self.slots.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Task> + '_ {
        self.slots.iter_mut().flatten()
    }

    /// Periods of all occupied slots, in slot order.
    pub fn periods(&self) -> Vec<u64> {
        self.iter().map(|t| t.period_ms).collect()
    }

    /// Rewrite `period_ticks` of every occupied slot for `timing`.
    pub fn apply_timing(&mut self, timing: &Timing) {
        for task in self.iter_mut() {
            task.apply_timing(timing);
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|t| t.id == id))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
