/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured validation errors.
//!
//! Every variant names the first violated invariant and the offending field
//! or unit, so the caller can surface a precise message without re-parsing
//! anything.  There is no partial acceptance: validation either returns
//! `Ok(())` or exactly one of these variants.

use thiserror::Error;

use crate::config::{PeriodDeadlineRule, TaskModel};
use crate::hardware::ProcessorKind;
use crate::taskgraph::Affinity;

/// Reason a [`SimulationConfig`](crate::config::SimulationConfig) was
/// rejected before submission.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    // ── Hardware ──────────────────────────────────────────────────────────────
    /// The hardware configuration contains no processor pools at all.
    #[error("hardware configuration is empty — at least one processor is required")]
    NoProcessors,

    /// A processor pool was declared with `count = 0`.
    #[error("processor pool #{index} ({kind}) has count 0 — every pool needs count >= 1")]
    InvalidProcessorCount { index: usize, kind: ProcessorKind },

    // ── Taskset parameters ────────────────────────────────────────────────────
    /// `taskCount` must be ≥ 1.
    #[error("taskCount must be >= 1")]
    InvalidTaskCount,

    /// DAG model only: `edgeDensity` must lie in `[0, 1]`.
    #[error("edgeDensity {value} is outside [0, 1]")]
    EdgeDensityOutOfRange { value: f64 },

    /// Target utilization must lie in `(0, taskCount]`.
    #[error("utilization {value} is outside (0, {task_count}]")]
    InvalidUtilization { value: f64, task_count: u32 },

    /// Suspension model only: `segmentNumber` must be ≥ 1.
    #[error("segmentNumber must be >= 1")]
    InvalidSegmentNumber,

    /// Segment length bounds must be positive with min ≤ max.
    #[error("segment length bounds [{min}, {max}] are invalid — need 0 < min <= max")]
    SegmentLengthBounds { min: u32, max: u32 },

    /// The deadline factor is incompatible with the period–deadline rule.
    #[error("deadlineFactor {factor} is invalid for the {rule:?} rule")]
    InvalidDeadlineFactor {
        rule: PeriodDeadlineRule,
        factor: f64,
    },

    // ── User taskset (cross-field) ────────────────────────────────────────────
    /// `genMethod = User` but no taskset was supplied.
    #[error("genMethod is User but no user taskset was supplied")]
    MissingUserTaskset,

    /// A task's body does not use the configured task model.
    #[error("task '{task}' does not use the configured {expected:?} task model")]
    ModelMismatch { task: String, expected: TaskModel },

    /// Two units of the same task share an id.
    #[error("task '{task}' declares unit id '{unit}' more than once")]
    DuplicateUnitId { task: String, unit: String },

    /// An edge references a node id that does not exist in the task.
    #[error("task '{task}' edge '{edge}' references unknown node '{endpoint}'")]
    DanglingEdge {
        task: String,
        edge: String,
        endpoint: String,
    },

    /// The edge relation of a DAG task contains a directed cycle.
    #[error("task '{task}' precedence edges form a cycle — the graph must be acyclic")]
    CycleDetected { task: String },

    /// A unit requires a processor kind absent from the hardware
    /// configuration.
    #[error("task '{task}' unit '{unit}' requires {affinity:?} but the hardware offers none")]
    UnsatisfiableAffinity {
        task: String,
        unit: String,
        affinity: Affinity,
    },

    /// A unit's execution time is not strictly positive.
    #[error("task '{task}' unit '{unit}' has non-positive execution time {value}")]
    NonPositiveExecutionTime {
        task: String,
        unit: String,
        value: f64,
    },

    /// A task's period or deadline is not strictly positive.
    #[error("task '{task}' has non-positive {field} {value}")]
    NonPositiveTiming {
        task: String,
        field: &'static str,
        value: f64,
    },
}
