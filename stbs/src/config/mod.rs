/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Scheduler and task table configuration.
//!
//! The expected YAML structure is:
//! ```yaml
//! scheduler:
//!   default_tick_ms: 10
//!   capacity: 8
//! notify:
//!   device_id: 1
//!   command: 65
//! tasks:
//!   - id: blink
//!     period_ms: 100
//!     priority: 1
//!   - id: button
//!     period_ms: 250
//! ```
//!
//! Every section and every field except a task's `id` and `period_ms` is
//! optional.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::frame::{validate_header, FrameError};
use crate::task::Task;

// ── Defaults ──────────────────────────────────────────────────────────────────

pub const DEFAULT_TICK_MS: u64 = 10;
pub const DEFAULT_CAPACITY: usize = 8;
pub const DEFAULT_DEVICE_ID: u8 = 1;
pub const DEFAULT_COMMAND: u8 = b'A';

fn default_tick_ms() -> u64 {
    DEFAULT_TICK_MS
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_device_id() -> u8 {
    DEFAULT_DEVICE_ID
}

fn default_command() -> u8 {
    DEFAULT_COMMAND
}

// ── Sections ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchedulerSection {
    /// Tick length used while no task is registered.
    #[serde(default = "default_tick_ms")]
    pub default_tick_ms: u64,
    /// Number of task slots.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            default_tick_ms: DEFAULT_TICK_MS,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Header bytes of the activation notification frames.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NotifySection {
    #[serde(default = "default_device_id")]
    pub device_id: u8,
    #[serde(default = "default_command")]
    pub command: u8,
}

impl NotifySection {
    /// Reject header bytes the frame transport cannot carry.
    pub fn validate(&self) -> Result<(), FrameError> {
        validate_header(self.device_id, self.command)
    }
}

impl Default for NotifySection {
    fn default() -> Self {
        Self {
            device_id: DEFAULT_DEVICE_ID,
            command: DEFAULT_COMMAND,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskEntry {
    pub id: String,
    pub period_ms: u64,
    #[serde(default)]
    pub priority: u8,
}

impl TaskEntry {
    pub fn to_task(&self) -> Task {
        Task::new(self.id.clone(), self.period_ms, self.priority)
    }
}

// ── StbsConfig ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StbsConfig {
    #[serde(default)]
    pub scheduler: SchedulerSection,
    #[serde(default)]
    pub notify: NotifySection,
    #[serde(default)]
    pub tasks: Vec<TaskEntry>,
}

impl StbsConfig {
    /// Parse `path`.
    ///
    /// Task entries are not validated here; the scheduler rejects invalid
    /// ones when they are added.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or if the YAML is
    /// structurally invalid.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading scheduler configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        if config.tasks.is_empty() {
            warn!("No tasks found in configuration file");
        }
        for t in &config.tasks {
            debug!(task = %t.id, period_ms = t.period_ms, priority = t.priority, "  task entry");
        }
        info!(
            default_tick_ms = config.scheduler.default_tick_ms,
            capacity = config.scheduler.capacity,
            task_count = config.tasks.len(),
            "Configuration loaded"
        );

        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty document deserialises to unit, not to an empty mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config
            .notify
            .validate()
            .context("Invalid notify section")?;
        Ok(config)
    }

    /// Task descriptors in file order.
    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.iter().map(TaskEntry::to_task).collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
