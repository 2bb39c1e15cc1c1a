/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! STBS – simple time-based scheduler
//!
//! A time-triggered cyclic executive: a fixed table of periodic tasks driven
//! by one tick whose length is the GCD of the task periods.
//!
//! ```text
//! lib.rs
//! ├── task          – periodic task descriptor
//! ├── hyperperiod/  – GCD / LCM, tick and macrocycle derivation
//! ├── scheduler/    – task table, lifecycle, tick loop
//! ├── dispatch      – activation sinks (log, channel, wake-up, frame)
//! ├── frame/        – notification frame codec and stream transport
//! ├── io            – I/O snapshot and digital input/output traits
//! └── config/       – YAML scheduler / task configuration
//! ```

pub mod config;
pub mod dispatch;
pub mod frame;
pub mod hyperperiod;
pub mod io;
pub mod scheduler;
pub mod task;

pub use dispatch::DispatchSink;
pub use scheduler::{Scheduler, SchedulerError, SchedulerState, SchedulerStatus};
pub use task::Task;
