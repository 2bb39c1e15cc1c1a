/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Digital I/O and the shared I/O snapshot.
//!
//! Task bodies never talk to drivers directly.  Once per period they read the
//! latest input states from an [`IoSnapshot`] and write output states back to
//! it; [`refresh_inputs`] and [`update_outputs`] move data between the
//! snapshot and the drivers.  The scheduler core does not touch any of this.

use thiserror::Error;
use tracing::warn;

/// Number of input and of output channels in a snapshot.
pub const CHANNELS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IoError {
    #[error("channel {channel} does not exist (0..{})", CHANNELS)]
    InvalidChannel { channel: usize },

    #[error("device for channel {channel} is not ready")]
    NotReady { channel: usize },
}

/// Polled digital input (buttons).
pub trait DigitalInput {
    fn read_input(&self, channel: usize) -> Result<bool, IoError>;
}

/// Digital output (LEDs).
pub trait DigitalOutput {
    fn write_output(&mut self, channel: usize, state: bool) -> Result<(), IoError>;
}

// ── IoSnapshot ────────────────────────────────────────────────────────────────

/// Fixed-size view of input and output states shared by task bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoSnapshot {
    pub inputs: [bool; CHANNELS],
    pub outputs: [bool; CHANNELS],
}

impl IoSnapshot {
    pub fn input(&self, channel: usize) -> Result<bool, IoError> {
        self.inputs
            .get(channel)
            .copied()
            .ok_or(IoError::InvalidChannel { channel })
    }

    pub fn set_output(&mut self, channel: usize, state: bool) -> Result<(), IoError> {
        let slot = self
            .outputs
            .get_mut(channel)
            .ok_or(IoError::InvalidChannel { channel })?;
        *slot = state;
        Ok(())
    }
}

/// Read every input channel into `snapshot`.
///
/// A channel that fails to read keeps its previous value; the first error is
/// returned after all channels have been tried.
pub fn refresh_inputs<I: DigitalInput + ?Sized>(
    snapshot: &mut IoSnapshot,
    inputs: &I,
) -> Result<(), IoError> {
    let mut first_err = None;
    for (channel, state) in snapshot.inputs.iter_mut().enumerate() {
        match inputs.read_input(channel) {
            Ok(v) => *state = v,
            Err(e) => {
                warn!(channel, error = %e, "input read failed");
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
    }
    first_err.map_or(Ok(()), Err)
}

/// Drive every output channel from `snapshot`.
pub fn update_outputs<O: DigitalOutput + ?Sized>(
    snapshot: &IoSnapshot,
    outputs: &mut O,
) -> Result<(), IoError> {
    let mut first_err = None;
    for (channel, &state) in snapshot.outputs.iter().enumerate() {
        if let Err(e) = outputs.write_output(channel, state) {
            warn!(channel, error = %e, "output write failed");
            if first_err.is_none() {
                first_err = Some(e);
            }
        }
    }
    first_err.map_or(Ok(()), Err)
}

// ── SimulatedBoard ────────────────────────────────────────────────────────────

/// In-memory board with [`CHANNELS`] buttons and LEDs.
#[derive(Debug, Default, Clone)]
pub struct SimulatedBoard {
    buttons: [bool; CHANNELS],
    leds: [bool; CHANNELS],
}

impl SimulatedBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, channel: usize, pressed: bool) -> Result<(), IoError> {
        let b = self
            .buttons
            .get_mut(channel)
            .ok_or(IoError::InvalidChannel { channel })?;
        *b = pressed;
        Ok(())
    }

    pub fn leds(&self) -> [bool; CHANNELS] {
        self.leds
    }
}

impl DigitalInput for SimulatedBoard {
    fn read_input(&self, channel: usize) -> Result<bool, IoError> {
        self.buttons
            .get(channel)
            .copied()
            .ok_or(IoError::InvalidChannel { channel })
    }
}

impl DigitalOutput for SimulatedBoard {
    fn write_output(&mut self, channel: usize, state: bool) -> Result<(), IoError> {
        let led = self
            .leds
            .get_mut(channel)
            .ok_or(IoError::InvalidChannel { channel })?;
        *led = state;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
