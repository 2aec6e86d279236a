//! Simulation result schema and the aggregation that produces it.
//!
//! The engine reports two raw event streams while it runs — per-job
//! completions and per-slot execution events — plus an opaque trace.  The
//! [`ResultAggregator`] folds those into one immutable [`SimulationResult`]:
//!
//! * deadline-miss records (`responseTime > deadline`, strictly);
//! * per-task response-time statistics (one quantile rule for every task);
//! * per-processor-kind utilization percentages, clamped to `[0, 100]`;
//! * the per-processor execution timeline, ordered by time slot;
//! * the derived verdict fields `hasDeadlineMiss` / `isSchedulable` /
//!   `worstResponseTime`, computed **once** here and stored as plain values
//!   so every consumer sees the same answer.
//!
//! # Policy decisions
//! `averageResponseTime` is the global mean over all completed jobs across
//! all tasks — **not** a mean of per-task means, which would over-weight
//! tasks with few jobs.  Quantiles use linear interpolation between order
//! statistics (see [`stats::quantile`]); response-time ties sort stably by
//! job release order.

pub mod stats;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::hardware::{HardwareConfig, ProcessorKind};

// ── Raw engine events ─────────────────────────────────────────────────────────

/// One completed job, as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCompletion {
    pub task_id: u32,
    pub release_time: f64,
    /// Relative deadline of this job.
    pub deadline: f64,
    pub completion_time: f64,
}

impl JobCompletion {
    /// Response time: completion − release.
    pub fn response_time(&self) -> f64 {
        self.completion_time - self.release_time
    }
}

/// One time slot of execution on one processor, as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSlot {
    pub processor_id: u32,
    pub kind: ProcessorKind,
    pub time_slot: u64,
    pub task_id: u32,
    pub segment_id: u32,
}

// ── Result schema ─────────────────────────────────────────────────────────────

/// A job whose response time exceeded its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineMiss {
    pub task_id: u32,
    pub deadline: f64,
    pub response_time: f64,
}

/// Per-task aggregate over all observed job completions.
///
/// When `count == 0` every statistic is zero **by convention** — consumers
/// must treat the entry as "no data", never as a measured zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponseStats {
    pub task_id: u32,
    pub count: u32,
    pub mean: f64,
    pub std_dev: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub min: f64,
    pub max: f64,
    /// `max − min`.
    pub range: f64,
}

/// One cell of the per-processor execution timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorTimelineEvent {
    pub processor_id: u32,
    pub time_slot: u64,
    pub task_id: u32,
    pub segment_id: u32,
}

/// The complete, immutable outcome of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// Derived: true iff `deadline_misses` is non-empty.
    pub has_deadline_miss: bool,
    pub deadline_misses: Vec<DeadlineMiss>,
    /// Global mean response time over all completed jobs across all tasks.
    pub average_response_time: f64,
    /// Maximum response time among all completed jobs; ≥ every per-task
    /// `max` in `task_response_stats`.
    pub worst_response_time: f64,
    /// Per-processor-kind utilization percentage in `[0, 100]`.
    pub utilization: BTreeMap<ProcessorKind, f64>,
    pub task_response_stats: Vec<TaskResponseStats>,
    /// Indexed by global processor id; each inner list is ordered by time
    /// slot.
    pub processor_timeline: Vec<Vec<ProcessorTimelineEvent>>,
    /// Opaque ordered log of engine-internal events.
    pub trace: Vec<String>,
    /// Derived: no deadline miss **and** no engine-reported infeasibility.
    pub is_schedulable: bool,
}

// ── ResultAggregator ──────────────────────────────────────────────────────────

/// Folds raw engine events into a [`SimulationResult`].
///
/// All derived fields are computed exactly once, in [`finish`] — the
/// returned result is plain data and never re-derives anything.
///
/// [`finish`]: ResultAggregator::finish
#[derive(Debug)]
pub struct ResultAggregator {
    hardware: HardwareConfig,
    /// Simulation horizon in time slots (denominator of the utilization
    /// figures).
    horizon_slots: u64,
    /// Task ids expected to appear; tasks that never complete a job still
    /// get a flagged `count = 0` stats entry.
    task_ids: Vec<u32>,
    jobs: Vec<JobCompletion>,
    slots: Vec<ExecutionSlot>,
    trace: Vec<String>,
    infeasible: bool,
}

impl ResultAggregator {
    pub fn new(hardware: HardwareConfig, horizon_slots: u64, task_ids: Vec<u32>) -> Self {
        Self {
            hardware,
            horizon_slots,
            task_ids,
            jobs: Vec::new(),
            slots: Vec::new(),
            trace: Vec::new(),
            infeasible: false,
        }
    }

    /// Record one completed job.  Jobs are expected in release order; the
    /// recorded order is what breaks response-time ties.
    pub fn record_job(&mut self, job: JobCompletion) {
        self.jobs.push(job);
    }

    /// Record one executed time slot.
    pub fn record_slot(&mut self, slot: ExecutionSlot) {
        self.slots.push(slot);
    }

    /// Append one line to the opaque engine trace.
    pub fn push_trace(&mut self, line: impl Into<String>) {
        self.trace.push(line.into());
    }

    /// Flag an engine-defined infeasibility (e.g. an unassignable segment).
    /// The run still completes with a result, but `is_schedulable` is false.
    pub fn mark_infeasible(&mut self, reason: &str) {
        warn!(reason, "engine reported infeasibility");
        self.trace.push(format!("infeasible: {reason}"));
        self.infeasible = true;
    }

    /// Consume the aggregator and build the final result.
    pub fn finish(self) -> SimulationResult {
        let deadline_misses: Vec<DeadlineMiss> = self
            .jobs
            .iter()
            .filter(|j| j.response_time() > j.deadline)
            .map(|j| DeadlineMiss {
                task_id: j.task_id,
                deadline: j.deadline,
                response_time: j.response_time(),
            })
            .collect();

        let all_responses: Vec<f64> = self.jobs.iter().map(JobCompletion::response_time).collect();
        let average_response_time = stats::mean(&all_responses);
        // True maximum over the jobs; a response may be negative if the
        // engine's clock reports completion before release.  Empty runs
        // report 0, never -inf.
        let worst_response_time = if all_responses.is_empty() {
            0.0
        } else {
            all_responses.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        };

        let task_response_stats = self.per_task_stats();
        let utilization = self.utilization_by_kind();
        let processor_timeline = self.build_timeline();

        let has_deadline_miss = !deadline_misses.is_empty();
        let is_schedulable = !has_deadline_miss && !self.infeasible;

        debug!(
            jobs = self.jobs.len(),
            misses = deadline_misses.len(),
            is_schedulable,
            "result aggregated"
        );

        SimulationResult {
            has_deadline_miss,
            deadline_misses,
            average_response_time,
            worst_response_time,
            utilization,
            task_response_stats,
            processor_timeline,
            trace: self.trace,
            is_schedulable,
        }
    }

    // ── Derivation helpers ────────────────────────────────────────────────────

    fn per_task_stats(&self) -> Vec<TaskResponseStats> {
        // BTreeMap keeps the output ordered by task id
        let mut by_task: BTreeMap<u32, Vec<&JobCompletion>> =
            self.task_ids.iter().map(|&id| (id, Vec::new())).collect();
        for job in &self.jobs {
            by_task.entry(job.task_id).or_default().push(job);
        }

        by_task
            .into_iter()
            .map(|(task_id, mut jobs)| {
                if jobs.is_empty() {
                    warn!(task_id, "task completed no jobs — statistics are flagged empty");
                    return TaskResponseStats {
                        task_id,
                        count: 0,
                        ..Default::default()
                    };
                }

                // Ties in response time resolve by job release order: order
                // by release first, then stable-sort by response time.
                jobs.sort_by(|a, b| a.release_time.total_cmp(&b.release_time));
                let mut responses: Vec<f64> =
                    jobs.iter().map(|j| j.response_time()).collect();
                responses.sort_by(f64::total_cmp);

                let min = responses[0];
                let max = responses[responses.len() - 1];
                TaskResponseStats {
                    task_id,
                    count: responses.len() as u32,
                    mean: stats::mean(&responses),
                    std_dev: stats::std_dev(&responses),
                    q1: stats::quantile(&responses, 0.25),
                    median: stats::quantile(&responses, 0.5),
                    q3: stats::quantile(&responses, 0.75),
                    min,
                    max,
                    range: max - min,
                }
            })
            .collect()
    }

    fn utilization_by_kind(&self) -> BTreeMap<ProcessorKind, f64> {
        let mut busy: BTreeMap<ProcessorKind, u64> = BTreeMap::new();
        for slot in &self.slots {
            *busy.entry(slot.kind).or_insert(0) += 1;
        }

        self.hardware
            .kinds()
            .into_iter()
            .map(|kind| {
                let capacity = self.hardware.capacity(kind) as u64 * self.horizon_slots;
                let pct = if capacity == 0 {
                    // zero horizon or zero capacity is reported as 0, not an
                    // error
                    0.0
                } else {
                    let executed = busy.get(&kind).copied().unwrap_or(0) as f64;
                    (executed / capacity as f64 * 100.0).clamp(0.0, 100.0)
                };
                (kind, pct)
            })
            .collect()
    }

    fn build_timeline(&self) -> Vec<Vec<ProcessorTimelineEvent>> {
        let cores = self.hardware.total_cores() as usize;
        let mut timeline: Vec<Vec<ProcessorTimelineEvent>> = vec![Vec::new(); cores];
        for slot in &self.slots {
            let Some(lane) = timeline.get_mut(slot.processor_id as usize) else {
                warn!(
                    processor_id = slot.processor_id,
                    "execution slot references a processor outside the platform — dropped"
                );
                continue;
            };
            lane.push(ProcessorTimelineEvent {
                processor_id: slot.processor_id,
                time_slot: slot.time_slot,
                task_id: slot.task_id,
                segment_id: slot.segment_id,
            });
        }
        for lane in &mut timeline {
            lane.sort_by_key(|e| e.time_slot);
        }
        timeline
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
