/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Tick and macrocycle calculation.
//!
//! The scheduler runs on a single tick whose length is the GCD of every
//! registered period, so each period is a whole number of ticks.  The
//! macrocycle (hyperperiod) is the LCM of the periods: after that many
//! milliseconds the activation pattern of the whole table repeats.
//!
//! | Periods (ms) | `tick_ms` | hyperperiod (ms) | `macrocycle_ticks` |
//! |---|---|---|---|
//! | 100, 250 | 50 | 500 | 10 |
//! | 20, 30 | 10 | 60 | 6 |
//! | 40 | 40 | 40 | 1 |
//! | (none) | default | – | 0 |

pub mod math;

use tracing::{debug, info};

use math::{gcd_of_slice, lcm_of_slice};

// ── Error type ────────────────────────────────────────────────────────────────

/// Errors that can occur during hyperperiod calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HyperperiodError {
    /// LCM calculation overflowed `u64`.
    ///
    /// Contains the two operands that caused the overflow so the caller can
    /// log a useful message.
    Overflow { a: u64, b: u64 },
}

impl std::fmt::Display for HyperperiodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HyperperiodError::Overflow { a, b } => {
                write!(f, "LCM overflow computing lcm({a}, {b})")
            }
        }
    }
}

impl std::error::Error for HyperperiodError {}

// ── Timing ────────────────────────────────────────────────────────────────────

/// Derived periodicity of a task table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Duration of one scheduling tick in milliseconds.
    pub tick_ms: u64,

    /// Number of ticks after which the activation pattern repeats.
    /// `0` when no task is registered.
    pub macrocycle_ticks: u64,
}

impl Timing {
    /// Timing of an empty table.
    pub fn idle(default_tick_ms: u64) -> Self {
        Self {
            tick_ms: default_tick_ms,
            macrocycle_ticks: 0,
        }
    }

    /// Macrocycle length in milliseconds (the LCM of all periods).
    pub fn hyperperiod_ms(&self) -> u64 {
        self.tick_ms.saturating_mul(self.macrocycle_ticks)
    }

    /// Number of ticks between activations of a task with `period_ms`.
    ///
    /// Exact whenever `self` was produced by [`calculate`] over a set that
    /// contains `period_ms`.
    pub fn period_ticks(&self, period_ms: u64) -> u64 {
        if self.tick_ms == 0 {
            return 0;
        }
        period_ms / self.tick_ms
    }
}

/// Derive the tick length and macrocycle from a set of periods.
///
/// `periods` is order-independent and may contain duplicates.  Zero periods
/// are ignored; the task table never admits them.
///
/// An empty set yields [`Timing::idle`] with `default_tick_ms`.
///
/// # Errors
/// [`HyperperiodError::Overflow`] if the LCM does not fit in `u64`.
pub fn calculate(periods: &[u64], default_tick_ms: u64) -> Result<Timing, HyperperiodError> {
    let valid: Vec<u64> = {
        let mut v: Vec<u64> = periods.iter().copied().filter(|&p| p > 0).collect();
        v.sort_unstable();
        v.dedup();
        v
    };

    if valid.is_empty() {
        debug!(default_tick_ms, "No periods registered, using default tick");
        return Ok(Timing::idle(default_tick_ms));
    }

    let tick_ms = gcd_of_slice(&valid);
    let hyperperiod_ms = lcm_of_slice(&valid)?;
    let macrocycle_ticks = hyperperiod_ms / tick_ms;

    info!(
        unique_periods = valid.len(),
        tick_ms,
        hyperperiod_ms,
        macrocycle_ticks,
        "Calculated hyperperiod"
    );

    Ok(Timing {
        tick_ms,
        macrocycle_ticks,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_periods_give_gcd_tick_and_lcm_macrocycle() {
        let t = calculate(&[100, 250], 10).unwrap();
        assert_eq!(t.tick_ms, 50);
        assert_eq!(t.macrocycle_ticks, 10);
        assert_eq!(t.hyperperiod_ms(), 500);
    }

    #[test]
    fn single_period_is_its_own_tick() {
        let t = calculate(&[40], 10).unwrap();
        assert_eq!(t.tick_ms, 40);
        assert_eq!(t.macrocycle_ticks, 1);
    }

    #[test]
    fn duplicates_do_not_change_result() {
        let a = calculate(&[20, 30], 1).unwrap();
        let b = calculate(&[30, 20, 20, 30, 30], 1).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.tick_ms, 10);
        assert_eq!(a.macrocycle_ticks, 6);
    }

    #[test]
    fn empty_set_uses_default_tick() {
        let t = calculate(&[], 25).unwrap();
        assert_eq!(t, Timing::idle(25));
        assert_eq!(t.macrocycle_ticks, 0);
        assert_eq!(t.hyperperiod_ms(), 0);
    }

    #[test]
    fn zero_periods_are_ignored() {
        assert_eq!(calculate(&[0, 0], 5).unwrap(), Timing::idle(5));
        assert_eq!(calculate(&[0, 60], 5).unwrap().tick_ms, 60);
    }

    #[test]
    fn every_period_divides_exactly() {
        let periods = [30, 45, 75, 90];
        let t = calculate(&periods, 1).unwrap();
        for p in periods {
            assert_eq!(t.period_ticks(p) * t.tick_ms, p);
            assert_eq!(t.hyperperiod_ms() % p, 0);
        }
    }

    #[test]
    fn overflow_is_reported() {
        let a = u64::MAX / 2 + 1;
        let b = u64::MAX / 2 + 3;
        assert!(matches!(
            calculate(&[a, b], 10),
            Err(HyperperiodError::Overflow { .. })
        ));
    }

    #[test]
    fn period_ticks_with_zero_tick_is_zero() {
        let t = Timing {
            tick_ms: 0,
            macrocycle_ticks: 0,
        };
        assert_eq!(t.period_ticks(100), 0);
    }
}
