//! Deterministic taskset generation.
//!
//! [`generate_taskset`] synthesizes a [`Taskset`] from a [`TasksetConfig`]
//! as a **pure function** of the random seed and the other parameters: the
//! same `(seed, parameters, hardware)` triple always yields the identical
//! task set — node ids, edges, execution times, affinities, everything.
//! This repeatability is what makes scheduling-algorithm comparisons and
//! regression tests meaningful.
//!
//! # Construction guarantees
//! * **DAG model** — every task gets `segmentNumber` nodes; edges only run
//!   from a lower node index to a higher one, so the graph is acyclic by
//!   construction.  The edge count is `floor(edgeDensity × n(n−1)/2)`; the
//!   concrete edges are a seeded shuffle of the candidate pairs, and the
//!   fractional remainder is discarded by the floor, never randomly.
//! * **Suspension model** — every task gets exactly `segmentNumber`
//!   segments, each length drawn inclusively from the configured bounds
//!   (default `[1, 100]`).
//! * Per-task utilization shares come from a UUniFast split of the target
//!   total; the period is then `total execution time / share`, and the
//!   deadline follows the configured period–deadline rule.
//! * Affinities are drawn only from processor kinds actually present on the
//!   platform (DAG nodes may additionally draw `Any`), so a generated
//!   taskset always passes affinity validation against the same hardware.

pub mod uunifast;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{PeriodDeadlineRule, TaskModel, TasksetConfig};
use crate::hardware::{HardwareConfig, ProcessorKind};
use crate::taskgraph::{
    Affinity, NodeKind, Task, TaskBody, TaskEdge, TaskNode, TaskSegment, Taskset,
};

/// Attempts before the UUniFast rejection loop gives up.
const MAX_SPLIT_ATTEMPTS: u32 = 1_000;

/// Canvas layout grid for generated DAG nodes (presentation only).
const LAYOUT_COLS: usize = 4;
const LAYOUT_DX: f64 = 180.0;
const LAYOUT_DY: f64 = 120.0;

// ── Error type ────────────────────────────────────────────────────────────────

/// Random generation could not satisfy the configured constraints.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    /// The hardware configuration offers no processor kind to draw
    /// affinities from.
    #[error("hardware has no usable processor kind to draw affinities from")]
    NoEligibleProcessor,

    /// The utilization target could not be split into per-task shares within
    /// `(0, 1]` after the configured number of attempts.
    #[error(
        "could not split utilization {utilization} across {task_count} tasks \
         with every share in (0, 1]"
    )]
    UtilizationUnsplittable { utilization: f64, task_count: u32 },
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Generate a taskset deterministically from `config.random_seed`.
///
/// # Errors
/// Returns a [`GenerationError`] when the constraints are unsatisfiable for
/// the given hardware; parameter-shape errors (zero task count, inverted
/// bounds) are the validator's job and are assumed to have been checked.
pub fn generate_taskset(
    hardware: &HardwareConfig,
    config: &TasksetConfig,
) -> Result<Taskset, GenerationError> {
    let kinds = hardware.kinds();
    if kinds.is_empty() {
        return Err(GenerationError::NoEligibleProcessor);
    }

    let mut rng = StdRng::seed_from_u64(config.random_seed as u64);

    let task_count = config.task_count as usize;
    let shares = uunifast::uunifast_discard(
        &mut rng,
        task_count,
        config.utilization,
        MAX_SPLIT_ATTEMPTS,
    )
    .ok_or(GenerationError::UtilizationUnsplittable {
        utilization: config.utilization,
        task_count: config.task_count,
    })?;

    let mut tasks = Vec::with_capacity(task_count);
    for (index, &share) in shares.iter().enumerate() {
        let task = generate_task(&mut rng, config, &kinds, index as u32, share);
        debug!(
            task = %task.name,
            period = task.period,
            deadline = task.deadline,
            wcet = task.body.total_execution_time(),
            share,
            "generated task"
        );
        tasks.push(task);
    }

    let taskset = Taskset { tasks };
    info!(
        seed = config.random_seed,
        task_count,
        model = ?config.task_model,
        total_utilization = taskset.total_utilization(),
        "taskset generated"
    );
    Ok(taskset)
}

// ── Per-task generation ───────────────────────────────────────────────────────

fn generate_task(
    rng: &mut StdRng,
    config: &TasksetConfig,
    kinds: &[ProcessorKind],
    id: u32,
    share: f64,
) -> Task {
    let unit_count = config.segment_number.max(1) as usize;
    let (lo, hi) = config.segment_length_range();

    let lengths: Vec<f64> = (0..unit_count)
        .map(|_| rng.gen_range(lo..=hi) as f64)
        .collect();
    let total_exec: f64 = lengths.iter().sum();

    // share > 0 is guaranteed by the UUniFast rejection loop
    let period = total_exec / share;
    let deadline = match config.period_deadline_rule {
        PeriodDeadlineRule::Implicit => period,
        PeriodDeadlineRule::Constrained | PeriodDeadlineRule::Arbitrary => {
            period * config.deadline_factor
        }
    };

    let body = match config.task_model {
        TaskModel::Dag => generate_dag_body(rng, config, kinds, id, &lengths),
        TaskModel::Suspension => generate_suspension_body(rng, kinds, id, &lengths),
    };

    Task {
        id,
        name: format!("task{id}"),
        period,
        deadline,
        body,
    }
}

fn generate_dag_body(
    rng: &mut StdRng,
    config: &TasksetConfig,
    kinds: &[ProcessorKind],
    task_id: u32,
    lengths: &[f64],
) -> TaskBody {
    let n = lengths.len();

    let nodes: Vec<TaskNode> = lengths
        .iter()
        .enumerate()
        .map(|(j, &wcet)| {
            // Index == kinds.len() selects the `Any` wildcard
            let pick = rng.gen_range(0..=kinds.len());
            let affinity = if pick == kinds.len() {
                Affinity::Any
            } else {
                Affinity::from(kinds[pick])
            };
            let kind = if affinity == Affinity::Datacopy {
                NodeKind::Datacopy
            } else {
                NodeKind::Compute
            };
            TaskNode {
                id: format!("t{task_id}n{j}"),
                name: format!("task{task_id}/n{j}"),
                kind,
                execution_time: wcet,
                affinity,
                x: (j % LAYOUT_COLS) as f64 * LAYOUT_DX,
                y: (j / LAYOUT_COLS) as f64 * LAYOUT_DY,
                period: None,
                deadline: None,
            }
        })
        .collect();

    // Forward-only candidate pairs keep the graph acyclic by construction
    let mut candidates: Vec<(usize, usize)> = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            candidates.push((i, j));
        }
    }
    let max_edges = candidates.len();
    let target = (config.edge_density * max_edges as f64).floor() as usize;
    candidates.shuffle(rng);

    let edges: Vec<TaskEdge> = candidates
        .into_iter()
        .take(target)
        .enumerate()
        .map(|(k, (i, j))| TaskEdge {
            id: format!("t{task_id}e{k}"),
            source: nodes[i].id.clone(),
            target: nodes[j].id.clone(),
        })
        .collect();

    TaskBody::Dag { nodes, edges }
}

fn generate_suspension_body(
    rng: &mut StdRng,
    kinds: &[ProcessorKind],
    task_id: u32,
    lengths: &[f64],
) -> TaskBody {
    let segments: Vec<TaskSegment> = lengths
        .iter()
        .enumerate()
        .map(|(j, &wcet)| {
            // Segments carry a concrete kind — no `Any` wildcard here
            let kind = kinds[rng.gen_range(0..kinds.len())];
            TaskSegment {
                id: format!("t{task_id}s{j}"),
                kind: kind.into(),
                execution_time: wcet,
                affinity: kind,
            }
        })
        .collect();

    TaskBody::Suspension { segments }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
