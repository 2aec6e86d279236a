//! Configuration admission control.
//!
//! [`validate_config`] decides whether a [`SimulationConfig`] may be
//! submitted to a run.  Checks execute in a fixed order — hardware, taskset
//! parameters, then cross-field checks on a user-supplied taskset — and the
//! **first** violated invariant is returned.  There is no partial
//! acceptance.
//!
//! The same per-taskset checks are exposed as [`validate_taskset`] so the
//! generator's output can be re-checked under the identical rules.

pub mod error;

pub use error::ValidationError;

use std::collections::HashSet;

use tracing::debug;

use crate::config::{GenMethod, PeriodDeadlineRule, SimulationConfig, TaskModel, TasksetConfig};
use crate::hardware::HardwareConfig;
use crate::taskgraph::{topo, Task, TaskBody, Taskset};

/// Validate a complete simulation configuration.
///
/// # Errors
/// The first violated invariant, as a [`ValidationError`] naming the
/// offending field, pool, task, or unit.
pub fn validate_config(config: &SimulationConfig) -> Result<(), ValidationError> {
    validate_hardware(&config.hardware)?;
    validate_taskset_params(&config.taskset)?;

    if config.taskset.gen_method == GenMethod::User {
        let taskset = config
            .user_taskset
            .as_ref()
            .ok_or(ValidationError::MissingUserTaskset)?;
        validate_taskset(&config.hardware, taskset, Some(config.taskset.task_model))?;
    }

    debug!("configuration admissible");
    Ok(())
}

/// Hardware invariants: at least one pool, every pool non-empty.
pub fn validate_hardware(hardware: &HardwareConfig) -> Result<(), ValidationError> {
    if hardware.processors.is_empty() {
        return Err(ValidationError::NoProcessors);
    }
    for (index, pool) in hardware.processors.iter().enumerate() {
        if pool.count == 0 {
            return Err(ValidationError::InvalidProcessorCount {
                index,
                kind: pool.kind,
            });
        }
    }
    Ok(())
}

/// Taskset parameter invariants (model-dependent).
fn validate_taskset_params(taskset: &TasksetConfig) -> Result<(), ValidationError> {
    if taskset.task_count == 0 {
        return Err(ValidationError::InvalidTaskCount);
    }

    match taskset.task_model {
        TaskModel::Dag => {
            if !(0.0..=1.0).contains(&taskset.edge_density) {
                return Err(ValidationError::EdgeDensityOutOfRange {
                    value: taskset.edge_density,
                });
            }
        }
        TaskModel::Suspension => {
            if taskset.segment_number == 0 {
                return Err(ValidationError::InvalidSegmentNumber);
            }
        }
    }

    if !(taskset.utilization > 0.0 && taskset.utilization <= taskset.task_count as f64) {
        return Err(ValidationError::InvalidUtilization {
            value: taskset.utilization,
            task_count: taskset.task_count,
        });
    }

    if let (Some(min), Some(max)) = (taskset.segment_length_min, taskset.segment_length_max) {
        if min == 0 || min > max {
            return Err(ValidationError::SegmentLengthBounds { min, max });
        }
    }

    let factor_ok = match taskset.period_deadline_rule {
        PeriodDeadlineRule::Implicit => true,
        PeriodDeadlineRule::Constrained => {
            taskset.deadline_factor > 0.0 && taskset.deadline_factor <= 1.0
        }
        PeriodDeadlineRule::Arbitrary => taskset.deadline_factor > 0.0,
    };
    if !factor_ok {
        return Err(ValidationError::InvalidDeadlineFactor {
            rule: taskset.period_deadline_rule,
            factor: taskset.deadline_factor,
        });
    }

    Ok(())
}

/// Validate a concrete taskset against the task-graph invariants and the
/// hardware's affinity coverage.
///
/// `expected_model` additionally pins every task body to one task model
/// (used for user-supplied tasksets; pass `None` for mixed sets).
pub fn validate_taskset(
    hardware: &HardwareConfig,
    taskset: &Taskset,
    expected_model: Option<TaskModel>,
) -> Result<(), ValidationError> {
    for task in &taskset.tasks {
        validate_task(hardware, task, expected_model)?;
    }
    Ok(())
}

fn validate_task(
    hardware: &HardwareConfig,
    task: &Task,
    expected_model: Option<TaskModel>,
) -> Result<(), ValidationError> {
    if let Some(expected) = expected_model {
        let actual = match task.body {
            TaskBody::Dag { .. } => TaskModel::Dag,
            TaskBody::Suspension { .. } => TaskModel::Suspension,
        };
        if actual != expected {
            return Err(ValidationError::ModelMismatch {
                task: task.name.clone(),
                expected,
            });
        }
    }

    if task.period <= 0.0 {
        return Err(ValidationError::NonPositiveTiming {
            task: task.name.clone(),
            field: "period",
            value: task.period,
        });
    }
    if task.deadline <= 0.0 {
        return Err(ValidationError::NonPositiveTiming {
            task: task.name.clone(),
            field: "deadline",
            value: task.deadline,
        });
    }

    match &task.body {
        TaskBody::Dag { nodes, edges } => {
            // Unique node ids
            let mut seen: HashSet<&str> = HashSet::new();
            for node in nodes {
                if !seen.insert(node.id.as_str()) {
                    return Err(ValidationError::DuplicateUnitId {
                        task: task.name.clone(),
                        unit: node.id.clone(),
                    });
                }
                if node.execution_time <= 0.0 {
                    return Err(ValidationError::NonPositiveExecutionTime {
                        task: task.name.clone(),
                        unit: node.id.clone(),
                        value: node.execution_time,
                    });
                }
                if !node.affinity.satisfiable_on(hardware) {
                    return Err(ValidationError::UnsatisfiableAffinity {
                        task: task.name.clone(),
                        unit: node.id.clone(),
                        affinity: node.affinity,
                    });
                }
            }

            // Every edge endpoint must name a node of this task
            for edge in edges {
                for endpoint in [&edge.source, &edge.target] {
                    if !seen.contains(endpoint.as_str()) {
                        return Err(ValidationError::DanglingEdge {
                            task: task.name.clone(),
                            edge: edge.id.clone(),
                            endpoint: endpoint.clone(),
                        });
                    }
                }
            }

            // Acyclicity — a cycle is a validation error, not a runtime
            // condition
            let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
            if topo::has_cycle(&ids, edges) {
                return Err(ValidationError::CycleDetected {
                    task: task.name.clone(),
                });
            }
        }

        TaskBody::Suspension { segments } => {
            let mut seen: HashSet<&str> = HashSet::new();
            for seg in segments {
                if !seen.insert(seg.id.as_str()) {
                    return Err(ValidationError::DuplicateUnitId {
                        task: task.name.clone(),
                        unit: seg.id.clone(),
                    });
                }
                if seg.execution_time <= 0.0 {
                    return Err(ValidationError::NonPositiveExecutionTime {
                        task: task.name.clone(),
                        unit: seg.id.clone(),
                        value: seg.execution_time,
                    });
                }
                if !hardware.has_kind(seg.affinity) {
                    return Err(ValidationError::UnsatisfiableAffinity {
                        task: task.name.clone(),
                        unit: seg.id.clone(),
                        affinity: seg.affinity.into(),
                    });
                }
            }
        }
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
