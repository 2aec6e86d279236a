/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! UUniFast utilization splitting (Bini & Buttazzo, 2005).
//!
//! Splits a total utilization across `n` tasks with the distribution uniform
//! over the valid simplex, which avoids the bias of naive repeated uniform
//! draws.  The discard variant redraws whenever a single share exceeds `1.0`,
//! since no single task may require more than one full processor.

use rand::Rng;

/// One UUniFast draw: `n` shares summing to `total` (up to float error).
/// `n = 0` yields no shares.
///
/// Shares may individually exceed `1.0`; use [`uunifast_discard`] when that
/// must be ruled out.
pub fn uunifast<R: Rng>(rng: &mut R, n: usize, total: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let mut shares = Vec::with_capacity(n);
    let mut remaining = total;
    for i in 1..n {
        let next = remaining * rng.gen::<f64>().powf(1.0 / (n - i) as f64);
        shares.push(remaining - next);
        remaining = next;
    }
    shares.push(remaining);
    shares
}

/// UUniFast with rejection: redraw until every share lies in `(0, 1]`.
///
/// Returns `None` after `max_attempts` rejected draws (possible when `total`
/// is very close to `n`, where almost every draw has a share at the limit —
/// the caller maps this to a generation error).
pub fn uunifast_discard<R: Rng>(
    rng: &mut R,
    n: usize,
    total: f64,
    max_attempts: u32,
) -> Option<Vec<f64>> {
    for _ in 0..max_attempts {
        let shares = uunifast(rng, n, total);
        if shares.iter().all(|&u| u > 0.0 && u <= 1.0) {
            return Some(shares);
        }
    }
    None
}

// ── Tests ─────────────────────────────────────────────────────────────────────
