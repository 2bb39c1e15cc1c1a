/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Time-triggered cyclic scheduler.
//!
//! [`Scheduler`] owns a fixed-capacity [`TaskTable`] and, while running, one
//! tokio task that wakes every `tick_ms`, evaluates every slot in table order
//! and reports due tasks to a [`DispatchSink`].
//!
//! ```text
//!          add_task / remove_task (implicit stop)
//!        ┌──────────────────────────────────────┐
//!        ▼                                      │
//!   ┌─────────┐  start()  ┌─────────┐           │
//!   │ Stopped │ ────────► │ Running │ ──────────┘
//!   └─────────┘ ◄──────── └─────────┘
//!                 stop()
//! ```
//!
//! # Activation rule
//! On tick `n` (counted from the last start) a task activates iff
//! `n % period_ticks == 0`.  All tasks activate together on tick 0 and every
//! `macrocycle_ticks` ticks thereafter.
//!
//! # Concurrency
//! Lifecycle and mutation operations take `&mut self`, so the
//! `Stopped → Running` check-and-flip cannot race.  The table only changes
//! while the tick loop is joined; the loop and the query operations share it
//! behind a mutex that is held for one tick evaluation at a time.
//!
//! # Example
//! ```rust,ignore
//! let mut sched = Scheduler::new(10, 8, LogSink)?;
//! sched.add_task(Task::new("blink", 100, 1)).await?;
//! sched.add_task(Task::new("button", 250, 2)).await?;
//! sched.start()?;          // tick = 50 ms, macrocycle = 10 ticks
//! // ...
//! sched.stop().await?;
//! ```

pub mod error;
pub mod table;

pub use error::SchedulerError;
pub use table::TaskTable;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::dispatch::DispatchSink;
use crate::hyperperiod::{self, Timing};
use crate::task::Task;

// ── Lifecycle state ───────────────────────────────────────────────────────────

/// Lifecycle state of a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No tick loop; the table may be changed.
    Stopped,
    /// A tick loop is alive and evaluating the table every tick.
    Running,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerState::Stopped => f.write_str("stopped"),
            SchedulerState::Running => f.write_str("running"),
        }
    }
}

/// Point-in-time summary of the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub tick_ms: u64,
    pub macrocycle_ticks: u64,
    pub elapsed_ticks: u64,
    pub capacity: usize,
    pub task_count: usize,
}

impl SchedulerStatus {
    /// Macrocycle length in milliseconds.
    pub fn hyperperiod_ms(&self) -> u64 {
        Timing {
            tick_ms: self.tick_ms,
            macrocycle_ticks: self.macrocycle_ticks,
        }
        .hyperperiod_ms()
    }
}

impl fmt::Display for SchedulerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scheduler {}: tick={}ms macrocycle={} ticks ({}ms) elapsed={} tasks={}/{}",
            self.state,
            self.tick_ms,
            self.macrocycle_ticks,
            self.hyperperiod_ms(),
            self.elapsed_ticks,
            self.task_count,
            self.capacity,
        )
    }
}

// ── Shared core ───────────────────────────────────────────────────────────────

/// State touched by the tick loop.
struct Core {
    table: TaskTable,
    sink: Box<dyn DispatchSink>,
    /// Index of the next tick to evaluate; equals the number of ticks
    /// evaluated since the last start.  Zeroed by every table change.
    elapsed_ticks: u64,
}

impl Core {
    /// Evaluate the current tick and advance.  Returns the number of
    /// activations delivered.
    fn run_tick(&mut self) -> usize {
        let tick = self.elapsed_ticks;
        let Core { table, sink, .. } = &mut *self;

        let mut activated = 0;
        for task in table.iter_mut().filter(|t| t.is_due(tick)) {
            let count = task.record_activation();
            sink.on_activation(&task.id, count);
            activated += 1;
        }

        self.elapsed_ticks += 1;
        activated
    }
}

fn lock(core: &Mutex<Core>) -> MutexGuard<'_, Core> {
    // A sink that panicked mid-tick leaves the table itself consistent.
    core.lock().unwrap_or_else(PoisonError::into_inner)
}

struct TickLoop {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// Time-triggered cyclic executive over a fixed-capacity task table.
///
/// Created stopped with an empty table running on the default tick.  Tasks
/// are added and removed with [`add_task`](Self::add_task) and
/// [`remove_task`](Self::remove_task); both leave the scheduler stopped, so
/// [`start`](Self::start) must be called again afterwards.
///
/// Dropping a running scheduler ends its tick loop at the next wake-up.
pub struct Scheduler {
    core: Arc<Mutex<Core>>,
    default_tick_ms: u64,
    timing: Timing,
    tick_loop: Option<TickLoop>,
}

impl Scheduler {
    /// Create a stopped scheduler with `capacity` empty slots.
    ///
    /// `default_tick_ms` is the tick length used while the table is empty.
    ///
    /// # Errors
    /// [`SchedulerError::ConstructionFailed`] if `capacity` or
    /// `default_tick_ms` is zero, or the slots cannot be reserved.
    pub fn new<S>(default_tick_ms: u64, capacity: usize, sink: S) -> Result<Self, SchedulerError>
    where
        S: DispatchSink + 'static,
    {
        if default_tick_ms == 0 {
            return Err(SchedulerError::ConstructionFailed {
                reason: "default tick must be at least 1 ms".into(),
            });
        }
        let table = TaskTable::new(capacity)?;

        info!(default_tick_ms, capacity, "Scheduler created");

        Ok(Self {
            core: Arc::new(Mutex::new(Core {
                table,
                sink: Box::new(sink),
                elapsed_ticks: 0,
            })),
            default_tick_ms,
            timing: Timing::idle(default_tick_ms),
            tick_loop: None,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Recompute the timing, reset `elapsed_ticks` and spawn the tick loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        match &self.tick_loop {
            Some(tl) if !tl.handle.is_finished() => return Err(SchedulerError::AlreadyRunning),
            Some(_) => {
                // The loop only ends on its own when a sink panicked.
                error!("Tick loop ended unexpectedly, restarting");
                self.tick_loop = None;
            }
            None => {}
        }

        {
            let mut core = lock(&self.core);
            let timing = hyperperiod::calculate(&core.table.periods(), self.default_tick_ms)?;
            core.table.apply_timing(&timing);
            core.elapsed_ticks = 0;
            self.timing = timing;
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let tick = Duration::from_millis(self.timing.tick_ms);
        let handle = tokio::spawn(tick_loop(Arc::clone(&self.core), tick, stop_rx));
        self.tick_loop = Some(TickLoop { stop_tx, handle });

        info!(
            tick_ms = self.timing.tick_ms,
            macrocycle_ticks = self.timing.macrocycle_ticks,
            "Scheduler started"
        );
        Ok(())
    }

    /// Signal the tick loop and wait until it has exited.
    ///
    /// The loop exits at its next suspension point, at the latest one tick
    /// after the call.  A loop that already died is reaped and reported as
    /// [`SchedulerError::NotRunning`].
    pub async fn stop(&mut self) -> Result<(), SchedulerError> {
        let TickLoop { stop_tx, handle } =
            self.tick_loop.take().ok_or(SchedulerError::NotRunning)?;
        let already_dead = handle.is_finished();

        // Err only if the loop already ended on its own.
        let _ = stop_tx.send(());
        if let Err(e) = handle.await {
            error!(error = %e, "Tick loop terminated abnormally");
        }
        if already_dead {
            return Err(SchedulerError::NotRunning);
        }

        info!(elapsed_ticks = self.elapsed_ticks(), "Scheduler stopped");
        Ok(())
    }

    /// `Running` while the tick loop is alive.
    pub fn state(&self) -> SchedulerState {
        if self
            .tick_loop
            .as_ref()
            .is_some_and(|tl| !tl.handle.is_finished())
        {
            SchedulerState::Running
        } else {
            SchedulerState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    // ── Table mutation ────────────────────────────────────────────────────────

    /// Register `task`.
    ///
    /// Every rejection is detected before anything changes; on success a
    /// running scheduler is stopped, the task stored and the timing
    /// recomputed.  The scheduler is left stopped.
    pub async fn add_task(&mut self, task: Task) -> Result<(), SchedulerError> {
        let timing = {
            let core = lock(&self.core);
            core.table.check_insert(&task)?;
            let mut periods = core.table.periods();
            periods.push(task.period_ms);
            hyperperiod::calculate(&periods, self.default_tick_ms)?
        };

        self.stop_for_mutation().await;

        let id = task.id.clone();
        let period_ms = task.period_ms;
        let slot = {
            let mut core = lock(&self.core);
            let slot = core.table.insert(task)?;
            core.table.apply_timing(&timing);
            core.elapsed_ticks = 0;
            slot
        };
        self.timing = timing;

        info!(
            task = %id,
            period_ms,
            slot,
            tick_ms = timing.tick_ms,
            macrocycle_ticks = timing.macrocycle_ticks,
            "Task added"
        );
        Ok(())
    }

    /// Unregister `id` and return its descriptor.  Same stop / recompute
    /// protocol as [`add_task`](Self::add_task).
    pub async fn remove_task(&mut self, id: &str) -> Result<Task, SchedulerError> {
        let timing = {
            let core = lock(&self.core);
            core.table.lookup(id)?;
            let periods: Vec<u64> = core
                .table
                .iter()
                .filter(|t| t.id != id)
                .map(|t| t.period_ms)
                .collect();
            hyperperiod::calculate(&periods, self.default_tick_ms)?
        };

        self.stop_for_mutation().await;

        let removed = {
            let mut core = lock(&self.core);
            let removed = core.table.remove(id)?;
            core.table.apply_timing(&timing);
            core.elapsed_ticks = 0;
            removed
        };
        self.timing = timing;

        info!(
            task = %id,
            activations = removed.activation_count(),
            tick_ms = timing.tick_ms,
            macrocycle_ticks = timing.macrocycle_ticks,
            "Task removed"
        );
        Ok(removed)
    }

    async fn stop_for_mutation(&mut self) {
        if self.tick_loop.is_some() {
            debug!("Table mutation requested while running, stopping first");
            // NotRunning only for a loop that died on its own; it is reaped
            // either way.
            let _ = self.stop().await;
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Snapshot of the task registered as `id`.
    pub fn describe(&self, id: &str) -> Result<Task, SchedulerError> {
        lock(&self.core).table.lookup(id).cloned()
    }

    /// Snapshot of every registered task, in table order.
    pub fn describe_all(&self) -> Vec<Task> {
        lock(&self.core).table.iter().cloned().collect()
    }

    /// Lifecycle state, timing and table occupancy in one snapshot.
    pub fn status(&self) -> SchedulerStatus {
        let core = lock(&self.core);
        SchedulerStatus {
            state: self.state(),
            tick_ms: self.timing.tick_ms,
            macrocycle_ticks: self.timing.macrocycle_ticks,
            elapsed_ticks: core.elapsed_ticks,
            capacity: core.table.capacity(),
            task_count: core.table.len(),
        }
    }

    pub fn tick_ms(&self) -> u64 {
        self.timing.tick_ms
    }

    pub fn macrocycle_ticks(&self) -> u64 {
        self.timing.macrocycle_ticks
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Ticks evaluated since the last start, or `0` after a table change.
    pub fn elapsed_ticks(&self) -> u64 {
        lock(&self.core).elapsed_ticks
    }

    pub fn capacity(&self) -> usize {
        lock(&self.core).table.capacity()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        // Dropping `stop_tx` ends the loop at its next wake-up.
        if let Some(tl) = self.tick_loop.take() {
            debug!("Scheduler dropped while running");
            drop(tl.stop_tx);
        }
    }
}

// ── Tick loop ─────────────────────────────────────────────────────────────────

async fn tick_loop(core: Arc<Mutex<Core>>, tick: Duration, mut stop_rx: oneshot::Receiver<()>) {
    let mut interval = tokio::time::interval(tick);
    // A late tick shifts the schedule rather than bursting to catch up.
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            // Fires on an explicit stop or when the scheduler is dropped.
            _ = &mut stop_rx => break,
            _ = interval.tick() => {
                let activated = lock(&core).run_tick();
                if activated > 0 {
                    debug!(activated, "tick");
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Activation, ChannelSink};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn scheduler(capacity: usize) -> (Scheduler, UnboundedReceiver<Activation>) {
        let (sink, rx) = ChannelSink::new();
        (Scheduler::new(10, capacity, sink).unwrap(), rx)
    }

    /// Evaluate `n` ticks synchronously, without the runtime clock.
    fn run_ticks(sched: &Scheduler, n: u64) {
        let mut core = lock(&sched.core);
        for _ in 0..n {
            core.run_tick();
        }
    }

    fn drain(rx: &mut UnboundedReceiver<Activation>) -> Vec<Activation> {
        let mut v = Vec::new();
        while let Ok(a) = rx.try_recv() {
            v.push(a);
        }
        v
    }

    // ── construction ──────────────────────────────────────────────────────────

    #[test]
    fn construction_rejects_zero_capacity_and_tick() {
        assert!(matches!(
            Scheduler::new(10, 0, crate::dispatch::LogSink),
            Err(SchedulerError::ConstructionFailed { .. })
        ));
        assert!(matches!(
            Scheduler::new(0, 4, crate::dispatch::LogSink),
            Err(SchedulerError::ConstructionFailed { .. })
        ));
    }

    #[test]
    fn new_scheduler_is_stopped_with_default_timing() {
        let (sched, _rx) = scheduler(4);
        assert_eq!(sched.state(), SchedulerState::Stopped);
        assert_eq!(sched.tick_ms(), 10);
        assert_eq!(sched.macrocycle_ticks(), 0);
        assert_eq!(sched.capacity(), 4);
    }

    // ── timing recomputation ──────────────────────────────────────────────────

    #[tokio::test]
    async fn periods_100_and_250_give_50ms_tick_and_10_tick_macrocycle() {
        let (mut sched, _rx) = scheduler(4);
        sched.add_task(Task::new("A", 100, 1)).await.unwrap();
        sched.add_task(Task::new("B", 250, 2)).await.unwrap();

        assert_eq!(sched.tick_ms(), 50);
        assert_eq!(sched.macrocycle_ticks(), 10);
        assert_eq!(sched.describe("A").unwrap().period_ticks(), 2);
        assert_eq!(sched.describe("B").unwrap().period_ticks(), 5);
    }

    #[tokio::test]
    async fn period_equals_ticks_times_tick_after_every_mutation() {
        let (mut sched, _rx) = scheduler(8);
        for (id, p) in [("a", 30), ("b", 45), ("c", 75), ("d", 20)] {
            sched.add_task(Task::new(id, p, 0)).await.unwrap();
            for t in sched.describe_all() {
                assert_eq!(t.period_ms, t.period_ticks() * sched.tick_ms());
            }
        }
        sched.remove_task("d").await.unwrap();
        assert_eq!(sched.tick_ms(), 15);
        for t in sched.describe_all() {
            assert_eq!(t.period_ms, t.period_ticks() * sched.tick_ms());
        }
    }

    #[tokio::test]
    async fn add_then_remove_restores_prior_timing() {
        let (mut sched, _rx) = scheduler(4);
        let before = sched.timing();

        sched.add_task(Task::new("x", 70, 0)).await.unwrap();
        assert_eq!(sched.tick_ms(), 70);

        let removed = sched.remove_task("x").await.unwrap();
        assert_eq!(removed.id, "x");
        assert_eq!(sched.timing(), before);
        assert!(sched.describe_all().is_empty());
    }

    // ── activation pattern ────────────────────────────────────────────────────

    #[tokio::test]
    async fn activation_pattern_over_one_macrocycle() {
        let (mut sched, mut rx) = scheduler(4);
        sched.add_task(Task::new("A", 100, 1)).await.unwrap();
        sched.add_task(Task::new("B", 250, 2)).await.unwrap();

        let mut a_ticks = Vec::new();
        let mut b_ticks = Vec::new();
        for tick in 0..10 {
            run_ticks(&sched, 1);
            for act in drain(&mut rx) {
                match act.id.as_str() {
                    "A" => a_ticks.push(tick),
                    "B" => b_ticks.push(tick),
                    other => panic!("unexpected task {other}"),
                }
            }
        }

        assert_eq!(a_ticks, vec![0, 2, 4, 6, 8]);
        assert_eq!(b_ticks, vec![0, 5]);
        assert_eq!(sched.describe("A").unwrap().activation_count(), 5);
        assert_eq!(sched.describe("B").unwrap().activation_count(), 2);
        assert_eq!(sched.elapsed_ticks(), 10);
    }

    #[tokio::test]
    async fn simultaneous_activations_follow_table_order() {
        let (mut sched, mut rx) = scheduler(4);
        sched.add_task(Task::new("first", 20, 9)).await.unwrap();
        sched.add_task(Task::new("second", 40, 1)).await.unwrap();
        sched.add_task(Task::new("third", 20, 5)).await.unwrap();
        sched.remove_task("first").await.unwrap();
        // Reuses slot 0, ahead of "second".
        sched.add_task(Task::new("fourth", 40, 0)).await.unwrap();

        run_ticks(&sched, 1);
        let order: Vec<String> = drain(&mut rx).into_iter().map(|a| a.id).collect();
        assert_eq!(order, vec!["fourth", "second", "third"]);
    }

    #[tokio::test]
    async fn pattern_repeats_every_macrocycle() {
        let (mut sched, mut rx) = scheduler(4);
        sched.add_task(Task::new("A", 20, 0)).await.unwrap();
        sched.add_task(Task::new("B", 30, 0)).await.unwrap();
        let m = sched.macrocycle_ticks();
        assert_eq!(m, 6);

        let mut cycles = Vec::new();
        for _ in 0..3 {
            let mut cycle = Vec::new();
            for _ in 0..m {
                run_ticks(&sched, 1);
                cycle.push(drain(&mut rx).len());
            }
            cycles.push(cycle);
        }
        assert_eq!(cycles[0], vec![2, 0, 1, 1, 1, 0]);
        assert_eq!(cycles[0], cycles[1]);
        assert_eq!(cycles[1], cycles[2]);
    }

    // ── mutation rejections ───────────────────────────────────────────────────

    #[tokio::test]
    async fn zero_period_is_rejected() {
        let (mut sched, _rx) = scheduler(4);
        let err = sched.add_task(Task::new("z", 0, 0)).await.unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidPeriod { .. }));
        assert!(sched.describe_all().is_empty());
    }

    #[tokio::test]
    async fn rejected_add_leaves_table_and_timing_unchanged() {
        let (mut sched, _rx) = scheduler(2);
        sched.add_task(Task::new("a", 40, 0)).await.unwrap();
        sched.add_task(Task::new("b", 60, 0)).await.unwrap();
        let before = (sched.describe_all(), sched.timing());

        assert!(matches!(
            sched.add_task(Task::new("c", 10, 0)).await,
            Err(SchedulerError::CapacityExceeded { capacity: 2 })
        ));
        sched.remove_task("b").await.unwrap();
        sched.add_task(Task::new("b", 60, 0)).await.unwrap();
        assert_eq!(
            sched.add_task(Task::new("a", 10, 0)).await.unwrap_err(),
            SchedulerError::DuplicateIdentifier("a".into())
        );
        assert_eq!((sched.describe_all(), sched.timing()), before);
    }

    #[tokio::test]
    async fn remove_unknown_returns_not_found() {
        let (mut sched, _rx) = scheduler(2);
        assert_eq!(
            sched.remove_task("ghost").await.unwrap_err(),
            SchedulerError::NotFound("ghost".into())
        );
        assert!(sched.describe("ghost").is_err());
    }

    // ── lifecycle ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn start_and_stop_are_not_idempotent() {
        let (mut sched, _rx) = scheduler(2);
        sched.add_task(Task::new("a", 10, 0)).await.unwrap();

        assert_eq!(sched.stop().await.unwrap_err(), SchedulerError::NotRunning);

        sched.start().unwrap();
        assert_eq!(sched.start().unwrap_err(), SchedulerError::AlreadyRunning);
        assert!(sched.is_running());

        sched.stop().await.unwrap();
        let count = sched.describe("a").unwrap().activation_count();
        assert_eq!(sched.stop().await.unwrap_err(), SchedulerError::NotRunning);
        assert_eq!(sched.describe("a").unwrap().activation_count(), count);
    }

    #[tokio::test]
    async fn rejected_add_does_not_stop_running_scheduler() {
        let (mut sched, _rx) = scheduler(2);
        sched.add_task(Task::new("a", 10, 0)).await.unwrap();
        sched.start().unwrap();

        assert!(sched.add_task(Task::new("a", 20, 0)).await.is_err());
        assert!(sched.is_running());
        sched.stop().await.unwrap();
    }

    #[tokio::test]
    async fn add_while_running_stops_and_is_visible() {
        let (mut sched, _rx) = scheduler(4);
        sched.add_task(Task::new("a", 10, 0)).await.unwrap();
        sched.start().unwrap();

        sched.add_task(Task::new("b", 20, 0)).await.unwrap();
        assert_eq!(sched.state(), SchedulerState::Stopped);
        let ids: Vec<String> = sched.describe_all().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn status_reports_table_summary() {
        let (mut sched, _rx) = scheduler(3);
        sched.add_task(Task::new("a", 100, 0)).await.unwrap();
        sched.add_task(Task::new("b", 250, 0)).await.unwrap();

        let status = sched.status();
        assert_eq!(status.state, SchedulerState::Stopped);
        assert_eq!(status.task_count, 2);
        assert_eq!(status.capacity, 3);
        assert!(status.to_string().contains("macrocycle=10 ticks (500ms)"));
    }

    #[tokio::test]
    async fn status_hyperperiod_matches_timing() {
        let (mut sched, _rx) = scheduler(3);
        sched.add_task(Task::new("a", 20, 0)).await.unwrap();
        sched.add_task(Task::new("b", 30, 0)).await.unwrap();
        assert_eq!(sched.status().hyperperiod_ms(), sched.timing().hyperperiod_ms());
        assert_eq!(sched.status().hyperperiod_ms(), 60);
    }

    #[tokio::test]
    async fn table_change_zeroes_elapsed_ticks() {
        let (mut sched, _rx) = scheduler(3);
        sched.add_task(Task::new("a", 10, 0)).await.unwrap();
        run_ticks(&sched, 4);
        assert_eq!(sched.status().elapsed_ticks, 4);

        sched.add_task(Task::new("b", 20, 0)).await.unwrap();
        assert_eq!(sched.status().elapsed_ticks, 0);

        run_ticks(&sched, 3);
        sched.remove_task("a").await.unwrap();
        assert_eq!(sched.elapsed_ticks(), 0);

        // Rejected changes leave it alone.
        run_ticks(&sched, 2);
        assert!(sched.remove_task("ghost").await.is_err());
        assert_eq!(sched.elapsed_ticks(), 2);
    }

    /// Panics on its first activation.
    struct PanickingSink;

    impl DispatchSink for PanickingSink {
        fn on_activation(&mut self, id: &str, _activation_count: u64) {
            panic!("sink failure on {id}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dead_tick_loop_is_reported_stopped() {
        let mut sched = Scheduler::new(10, 1, PanickingSink).unwrap();
        sched.add_task(Task::new("boom", 10, 0)).await.unwrap();

        sched.start().unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(sched.state(), SchedulerState::Stopped);
        assert!(!sched.is_running());

        // Restart is allowed without an explicit stop.
        sched.start().unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(sched.stop().await.unwrap_err(), SchedulerError::NotRunning);
        assert_eq!(sched.stop().await.unwrap_err(), SchedulerError::NotRunning);

        // The table survives the poisoned lock.
        assert_eq!(sched.describe("boom").unwrap().activation_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn mutation_after_dead_loop_reaps_it() {
        let mut sched = Scheduler::new(10, 2, PanickingSink).unwrap();
        sched.add_task(Task::new("boom", 10, 0)).await.unwrap();
        sched.start().unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        sched.remove_task("boom").await.unwrap();
        assert_eq!(sched.state(), SchedulerState::Stopped);
        sched.start().unwrap();
        assert!(sched.is_running());
        sched.stop().await.unwrap();
    }
}

