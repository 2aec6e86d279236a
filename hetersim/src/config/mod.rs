//! Simulation configuration: taskset parameters + hardware + optional
//! user-supplied taskset, loadable from a YAML file.
//!
//! The expected YAML structure is:
//! ```yaml
//! hardware:
//!   processors:
//!     - type: CPU
//!       count: 2
//!       preemptive: true
//!     - type: GPU
//!       count: 1
//!       preemptive: false
//! taskset:
//!   taskCount: 3
//!   taskModel: DAG
//!   edgeDensity: 0.4
//!   utilization: 1.5
//!   segmentNumber: 4
//!   releaseTimes: 10
//!   randomSeed: 42
//!   genMethod: Random
//! ```
//!
//! Field names follow the camelCase data contract of the client API, so a
//! configuration exported by the front-end deserialises unchanged.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::hardware::HardwareConfig;
use crate::taskgraph::Taskset;

// ── Enumerated parameters ─────────────────────────────────────────────────────

/// Which task model the taskset uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskModel {
    #[serde(rename = "DAG")]
    Dag,
    Suspension,
}

/// How the taskset comes into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenMethod {
    /// The task graph / segment chains are supplied explicitly
    /// ([`SimulationConfig::user_taskset`]); generation parameters are
    /// advisory.
    User,
    /// The taskset is synthesized deterministically from `randomSeed`.
    Random,
}

/// Relation between a generated task's deadline and its period.
///
/// Mirrors the "Period-Deadline Rule" control of the configuration UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PeriodDeadlineRule {
    /// Deadline equals period.
    #[default]
    Implicit,
    /// Deadline = `deadlineFactor` × period, with factor ≤ 1.
    Constrained,
    /// Deadline = `deadlineFactor` × period, any positive factor.
    Arbitrary,
}

// ── TasksetConfig ─────────────────────────────────────────────────────────────

/// Parameters that define how a task set is produced.
///
/// Which fields are meaningful depends on `task_model` and `gen_method`; the
/// validator in [`crate::validate`] enforces the cross-field rules before a
/// run may start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksetConfig {
    /// Number of tasks, ≥ 1.
    pub task_count: u32,

    pub task_model: TaskModel,

    /// Fraction of the maximum possible edge count, in `[0, 1]`.  Meaningful
    /// only for the DAG model.
    pub edge_density: f64,

    /// Target total utilization, in `(0, task_count]`.
    pub utilization: f64,

    /// Units per task: segments for the Suspension model, nodes for DAG.
    pub segment_number: u32,

    /// Lower bound on a generated unit's execution time (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_length_min: Option<u32>,

    /// Upper bound on a generated unit's execution time (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_length_max: Option<u32>,

    /// Number of job releases per task during a run.
    pub release_times: u32,

    /// Seed for deterministic generation (`gen_method = Random`).
    pub random_seed: i64,

    pub gen_method: GenMethod,

    /// Deadline derivation rule for generated tasks.
    #[serde(default)]
    pub period_deadline_rule: PeriodDeadlineRule,

    /// Deadline factor used by the `Constrained` / `Arbitrary` rules.
    #[serde(default = "default_deadline_factor")]
    pub deadline_factor: f64,
}

fn default_deadline_factor() -> f64 {
    1.0
}

impl TasksetConfig {
    /// Execution-time range the generator draws from, applying the default
    /// range when no bounds were supplied.
    ///
    /// The inclusive default `[1, 100]` is the engine-defined fallback.
    pub fn segment_length_range(&self) -> (u32, u32) {
        match (self.segment_length_min, self.segment_length_max) {
            (Some(lo), Some(hi)) => (lo, hi),
            (Some(lo), None) => (lo, lo.max(DEFAULT_SEGMENT_LENGTH_MAX)),
            (None, Some(hi)) => (DEFAULT_SEGMENT_LENGTH_MIN.min(hi), hi),
            (None, None) => (DEFAULT_SEGMENT_LENGTH_MIN, DEFAULT_SEGMENT_LENGTH_MAX),
        }
    }
}

/// Default execution-time range when no segment length bounds are given.
pub const DEFAULT_SEGMENT_LENGTH_MIN: u32 = 1;
pub const DEFAULT_SEGMENT_LENGTH_MAX: u32 = 100;

// ── SimulationConfig ──────────────────────────────────────────────────────────

/// The complete, immutable input to one simulation run.
///
/// # Lifecycle
/// Constructed by configuration collection (or [`from_yaml_file`]), validated
/// by [`crate::validate::validate_config`], submitted once to a
/// [`crate::run::SimulationSession`], never mutated during the run.
///
/// [`from_yaml_file`]: SimulationConfig::from_yaml_file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    pub hardware: HardwareConfig,
    pub taskset: TasksetConfig,

    /// Explicit taskset for `gen_method = User`.  Ignored (and permitted to
    /// be absent) for `Random`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_taskset: Option<Taskset>,
}

impl SimulationConfig {
    /// Parse a YAML configuration file.
    ///
    /// Parsing does **not** validate the semantic invariants — call
    /// [`crate::validate::validate_config`] before submitting.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or the YAML is
    /// structurally invalid.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        info!("Loading simulation configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        let config: SimulationConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        info!(
            pools = config.hardware.processors.len(),
            cores = config.hardware.total_cores(),
            task_count = config.taskset.task_count,
            task_model = ?config.taskset.task_model,
            gen_method = ?config.taskset.gen_method,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Serialise back to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialise configuration to YAML")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
