/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Pure statistics helpers: mean, population standard deviation, and
//! linear-interpolation quantiles.
//!
//! These are free functions rather than methods so they can be used and
//! tested independently of the `ResultAggregator`.  All of them expect the
//! caller to pass the sample **pre-sorted** where noted — the aggregator
//! sorts once and reuses the ordering for q1/median/q3.

/// Arithmetic mean.  Returns `0.0` for an empty sample.
pub fn mean(sample: &[f64]) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    sample.iter().sum::<f64>() / sample.len() as f64
}

/// Population standard deviation (divides by `n`, not `n − 1`).
///
/// Returns `0.0` for an empty or single-element sample.  The result is
/// always ≥ 0.
pub fn std_dev(sample: &[f64]) -> f64 {
    if sample.len() < 2 {
        return 0.0;
    }
    let m = mean(sample);
    let var = sample.iter().map(|&x| (x - m) * (x - m)).sum::<f64>() / sample.len() as f64;
    var.sqrt()
}

/// Quantile by linear interpolation between order statistics.
///
/// For a sorted sample of size `n` and probability `p ∈ [0, 1]`, the rank is
/// `h = (n − 1) × p`; the result interpolates between `sorted[floor(h)]` and
/// `sorted[floor(h) + 1]`.  This is the same rule for q1, median, and q3 —
/// mixing interpolation methods across quantiles would break the
/// `min ≤ q1 ≤ median ≤ q3 ≤ max` ordering guarantee.
///
/// Returns `0.0` for an empty sample.
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let h = (n - 1) as f64 * p.clamp(0.0, 1.0);
            let lo = h.floor() as usize;
            let frac = h - lo as f64;
            if lo + 1 < n {
                sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
            } else {
                sorted[n - 1]
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
