/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Activation sinks.
//!
//! The tick loop calls [`DispatchSink::on_activation`] synchronously, once per
//! due task, in table order.  A sink either does the work inline or hands it
//! to another execution context:
//!
//! | Sink | Effect |
//! |---|---|
//! | [`LogSink`] | `tracing` event per activation |
//! | [`ChannelSink`] | [`Activation`] message on an mpsc channel |
//! | [`WakeSink`] | wakes the [`PeriodWaiter`] registered for the task |
//! | [`FrameSink`] | newline-terminated notification frame on a writer |
//!
//! Sinks must return quickly; anything slow delays the remaining activations
//! of the tick and the next tick itself.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};

use crate::frame::{validate_header, write_frame, Frame, FrameError};

/// Receiver of task activations.
pub trait DispatchSink: Send {
    fn on_activation(&mut self, id: &str, activation_count: u64);
}

impl<S: DispatchSink + ?Sized> DispatchSink for Box<S> {
    fn on_activation(&mut self, id: &str, activation_count: u64) {
        (**self).on_activation(id, activation_count);
    }
}

/// Fan-out: every sink sees every activation, in vector order.
impl DispatchSink for Vec<Box<dyn DispatchSink>> {
    fn on_activation(&mut self, id: &str, activation_count: u64) {
        for sink in self.iter_mut() {
            sink.on_activation(id, activation_count);
        }
    }
}

// ── LogSink ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct LogSink;

impl DispatchSink for LogSink {
    fn on_activation(&mut self, id: &str, activation_count: u64) {
        info!(task = %id, activation = activation_count, "activation");
    }
}

// ── ChannelSink ───────────────────────────────────────────────────────────────

/// One activation as seen by the tick loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub id: String,
    pub activation_count: u64,
}

/// Forwards activations to an unbounded channel.  Sending never blocks the
/// tick loop; once the receiver is gone activations are dropped.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Activation>,
    receiver_gone: bool,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Activation>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                receiver_gone: false,
            },
            rx,
        )
    }
}

impl DispatchSink for ChannelSink {
    fn on_activation(&mut self, id: &str, activation_count: u64) {
        let msg = Activation {
            id: id.to_string(),
            activation_count,
        };
        if self.tx.send(msg).is_err() && !self.receiver_gone {
            warn!(task = %id, "activation receiver dropped, discarding activations");
            self.receiver_gone = true;
        }
    }
}

// ── WakeSink ──────────────────────────────────────────────────────────────────

/// Wakes one waiter per task.
///
/// ```rust,ignore
/// let mut wake = WakeSink::new();
/// let waiter = wake.register("blink");
/// tokio::spawn(async move {
///     loop {
///         waiter.wait_period().await;
///         toggle_led();
///     }
/// });
/// ```
#[derive(Debug, Default)]
pub struct WakeSink {
    waiters: HashMap<String, Arc<Notify>>,
}

impl WakeSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the waiter for `id`, creating it on first use.  Every call for the
    /// same identifier returns a handle on the same wake-up.
    pub fn register(&mut self, id: impl Into<String>) -> PeriodWaiter {
        let notify = self.waiters.entry(id.into()).or_default();
        PeriodWaiter {
            notify: Arc::clone(notify),
        }
    }
}

impl DispatchSink for WakeSink {
    fn on_activation(&mut self, id: &str, activation_count: u64) {
        match self.waiters.get(id) {
            Some(notify) => notify.notify_one(),
            None => debug!(task = %id, activation = activation_count, "no waiter registered"),
        }
    }
}

/// Handle a task body awaits between periods.
#[derive(Debug, Clone)]
pub struct PeriodWaiter {
    notify: Arc<Notify>,
}

impl PeriodWaiter {
    /// Resolve at the task's next activation.  An activation delivered while
    /// nobody was waiting is kept, so a body that overruns one period returns
    /// immediately instead of missing it.
    pub async fn wait_period(&self) {
        self.notify.notified().await;
    }
}

// ── FrameSink ─────────────────────────────────────────────────────────────────

/// Announces each activation as a notification frame whose payload is the
/// task identifier.
pub struct FrameSink<W> {
    writer: W,
    device_id: u8,
    command: u8,
}

impl<W: Write + Send> FrameSink<W> {
    /// Fails when `device_id` or `command` cannot be carried by the line
    /// transport; no frame would ever be readable on the other end.
    pub fn new(writer: W, device_id: u8, command: u8) -> Result<Self, FrameError> {
        validate_header(device_id, command)?;
        Ok(Self {
            writer,
            device_id,
            command,
        })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> DispatchSink for FrameSink<W> {
    fn on_activation(&mut self, id: &str, activation_count: u64) {
        let frame = match Frame::new(self.device_id, self.command, id.as_bytes()) {
            Ok(f) => f,
            Err(e) => {
                warn!(task = %id, error = %e, "task identifier cannot be framed, skipping");
                return;
            }
        };
        if let Err(e) = write_frame(&mut self.writer, &frame) {
            warn!(task = %id, activation = activation_count, error = %e, "frame write failed");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
