/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Hardware platform description for a simulation run.
//!
//! A platform is an **ordered** list of processor pools.  Two pools may share
//! the same [`ProcessorKind`] — they are then treated as independently
//! configured pools (e.g. a preemptive and a non-preemptive CPU cluster).
//!
//! # Ownership model
//! [`HardwareConfig`] is part of the immutable [`SimulationConfig`] input: it
//! is built once by configuration collection, validated, and never mutated
//! during a run.
//!
//! [`SimulationConfig`]: crate::config::SimulationConfig

use serde::{Deserialize, Serialize};

// ── Processor kind ────────────────────────────────────────────────────────────

/// The four processor classes the simulator models.
///
/// Carrying the typed enum through the whole pipeline (instead of a raw
/// string) makes it impossible to build a configuration with an unknown
/// processor class; the string form only exists at the YAML boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProcessorKind {
    /// General-purpose CPU core.
    #[serde(rename = "CPU")]
    Cpu,
    /// GPU compute engine.
    #[serde(rename = "GPU")]
    Gpu,
    /// Dedicated data-movement engine (DMA-style copy unit).
    #[serde(rename = "DATACOPY")]
    Datacopy,
    /// FPGA fabric slot.
    #[serde(rename = "FPGA")]
    Fpga,
}

impl ProcessorKind {
    /// All kinds, in the canonical display order.
    pub const ALL: [ProcessorKind; 4] = [
        ProcessorKind::Cpu,
        ProcessorKind::Gpu,
        ProcessorKind::Datacopy,
        ProcessorKind::Fpga,
    ];

    /// Canonical upper-case name, matching the wire contract.
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessorKind::Cpu => "CPU",
            ProcessorKind::Gpu => "GPU",
            ProcessorKind::Datacopy => "DATACOPY",
            ProcessorKind::Fpga => "FPGA",
        }
    }
}

impl std::fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Processor pool ────────────────────────────────────────────────────────────

/// One pool of identical processors.
///
/// `count` must be ≥ 1 — the validator rejects zero-sized pools before a run
/// can start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Processor {
    /// Processor class of every core in this pool.
    #[serde(rename = "type")]
    pub kind: ProcessorKind,

    /// Number of cores in the pool.
    pub count: u32,

    /// Whether cores in this pool may preempt a running unit.
    ///
    /// Non-preemptive pools additionally constrain the timeline shape: no two
    /// execution events on the same core may share a time slot.
    pub preemptive: bool,
}

// ── HardwareConfig ────────────────────────────────────────────────────────────

/// Ordered sequence of processor pools making up the simulated platform.
///
/// Processor **ids** are global and derived from pool order: pool 0 owns ids
/// `0..count₀`, pool 1 owns the next `count₁` ids, and so on.  The ordering is
/// therefore significant and preserved through (de)serialisation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareConfig {
    pub processors: Vec<Processor>,
}

impl HardwareConfig {
    /// Total number of cores across all pools of `kind`.
    ///
    /// Duplicate pools of the same kind accumulate, matching their
    /// independent-pools interpretation.
    pub fn capacity(&self, kind: ProcessorKind) -> u32 {
        self.processors
            .iter()
            .filter(|p| p.kind == kind)
            .map(|p| p.count)
            .sum()
    }

    /// Total number of cores across the whole platform.
    pub fn total_cores(&self) -> u32 {
        self.processors.iter().map(|p| p.count).sum()
    }

    /// Returns `true` if at least one core of `kind` exists.
    pub fn has_kind(&self, kind: ProcessorKind) -> bool {
        self.capacity(kind) > 0
    }

    /// Processor kinds present on the platform, deduplicated, in pool order.
    pub fn kinds(&self) -> Vec<ProcessorKind> {
        let mut kinds = Vec::new();
        for p in &self.processors {
            if p.count > 0 && !kinds.contains(&p.kind) {
                kinds.push(p.kind);
            }
        }
        kinds
    }

    /// The pool a global processor id belongs to, or `None` when the id is
    /// past the end of the platform.
    pub fn pool_of(&self, processor_id: u32) -> Option<&Processor> {
        let mut base = 0u32;
        for p in &self.processors {
            if processor_id < base + p.count {
                return Some(p);
            }
            base += p.count;
        }
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
