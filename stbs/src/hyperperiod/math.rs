/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Pure arithmetic helpers: GCD and checked LCM, pairwise and folded over a
//! whole period set.
//!
//! These are free functions rather than methods so they can be used and tested
//! independently of the scheduler.

use super::HyperperiodError;

/// Iterative Euclidean GCD.  `gcd(a, 0) == a`, so `0` acts as the identity
/// when folding over a set.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Checked LCM: returns `Err(HyperperiodError::Overflow { a, b })` if the
/// result would overflow `u64`.
///
/// Divides before multiplying (`(a / gcd(a, b)) * b`); the final
/// multiplication is still checked.
///
/// Returns `Ok(0)` when either input is `0`.
pub fn lcm(a: u64, b: u64) -> Result<u64, HyperperiodError> {
    if a == 0 || b == 0 {
        return Ok(0);
    }

    let reduced = a / gcd(a, b);

    reduced
        .checked_mul(b)
        .ok_or(HyperperiodError::Overflow { a, b })
}

/// GCD of every value in `periods`.  Returns `0` for an empty slice.
pub fn gcd_of_slice(periods: &[u64]) -> u64 {
    periods.iter().fold(0, |acc, &p| gcd(acc, p))
}

/// Reduce a slice of periods to their overall LCM.
///
/// Returns:
/// * `Ok(0)` for an empty slice.
/// * `Err` on the first overflow encountered.
pub fn lcm_of_slice(periods: &[u64]) -> Result<u64, HyperperiodError> {
    periods
        .iter()
        .try_fold(periods.first().copied().unwrap_or(0), |acc, &p| lcm(acc, p))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
