/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Task graph data structures for both supported task models.
//!
//! Two task models share one `Task` abstraction:
//!
//! ```text
//! DAG        – a directed acyclic graph of compute / data-movement / IO
//!              nodes; edges are precedence constraints.
//! Suspension – an ordered chain of execution segments; the gap between two
//!              adjacent segments is a self-suspension interval, and segment
//!              order is the (only) precedence relation.
//! ```
//!
//! [`TaskBody`] is a tagged union rather than a trait hierarchy so adding a
//! third model later keeps exhaustive-match safety everywhere the body is
//! inspected.  Only the operations both models share are exposed on it:
//! affinity lookup, total execution time, unit count, and precedence check.

pub mod topo;

use serde::{Deserialize, Serialize};

use crate::hardware::{HardwareConfig, ProcessorKind};

// ── Affinity ──────────────────────────────────────────────────────────────────

/// Processor eligibility of a DAG node.
///
/// `Any` means the node may run on every processor class present on the
/// platform.  Segments do not carry `Any` — they use [`ProcessorKind`]
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Affinity {
    #[serde(rename = "CPU")]
    Cpu,
    #[serde(rename = "GPU")]
    Gpu,
    #[serde(rename = "DATACOPY")]
    Datacopy,
    #[serde(rename = "FPGA")]
    Fpga,
    Any,
}

impl Affinity {
    /// The single processor kind this affinity names, or `None` for `Any`.
    pub fn kind(self) -> Option<ProcessorKind> {
        match self {
            Affinity::Cpu => Some(ProcessorKind::Cpu),
            Affinity::Gpu => Some(ProcessorKind::Gpu),
            Affinity::Datacopy => Some(ProcessorKind::Datacopy),
            Affinity::Fpga => Some(ProcessorKind::Fpga),
            Affinity::Any => None,
        }
    }

    /// Returns `true` if a processor of `kind` may execute a unit with this
    /// affinity.
    pub fn allows(self, kind: ProcessorKind) -> bool {
        match self.kind() {
            Some(k) => k == kind,
            None => true,
        }
    }

    /// Returns `true` if the platform offers at least one eligible core.
    pub fn satisfiable_on(self, hardware: &HardwareConfig) -> bool {
        match self.kind() {
            Some(k) => hardware.has_kind(k),
            None => hardware.total_cores() > 0,
        }
    }
}

impl From<ProcessorKind> for Affinity {
    fn from(kind: ProcessorKind) -> Self {
        match kind {
            ProcessorKind::Cpu => Affinity::Cpu,
            ProcessorKind::Gpu => Affinity::Gpu,
            ProcessorKind::Datacopy => Affinity::Datacopy,
            ProcessorKind::Fpga => Affinity::Fpga,
        }
    }
}

// ── DAG node ──────────────────────────────────────────────────────────────────

/// Functional class of a DAG node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Compute,
    Datacopy,
    #[serde(rename = "I/O")]
    Io,
}

/// One unit of work inside a DAG task.
///
/// `x` / `y` are canvas layout coordinates carried for the presentation layer
/// only; they have no scheduling effect but round-trip through serialisation
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskNode {
    /// Unique id within the owning task.
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Worst-case execution time, abstract time units, strictly positive.
    pub execution_time: f64,
    pub affinity: Affinity,
    /// Layout coordinate (presentation only).
    #[serde(default)]
    pub x: f64,
    /// Layout coordinate (presentation only).
    #[serde(default)]
    pub y: f64,
    /// Optional per-node period.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<f64>,
    /// Optional per-node relative deadline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<f64>,
}

impl TaskNode {
    /// Relative deadline under the implicit-deadline convention: when a
    /// period is set and no deadline is, the deadline defaults to the period.
    pub fn effective_deadline(&self) -> Option<f64> {
        self.deadline.or(self.period)
    }
}

/// Precedence edge between two nodes of the same DAG task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEdge {
    pub id: String,
    /// `TaskNode::id` of the predecessor.
    pub source: String,
    /// `TaskNode::id` of the successor.
    pub target: String,
}

// ── Suspension segment ────────────────────────────────────────────────────────

/// Functional class of a suspension segment.
///
/// Same four classes as [`ProcessorKind`], but the wire contract spells the
/// segment *type* `Datacopy` while the affinity stays `DATACOPY`, so the two
/// need distinct serde names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    #[serde(rename = "CPU")]
    Cpu,
    #[serde(rename = "GPU")]
    Gpu,
    Datacopy,
    #[serde(rename = "FPGA")]
    Fpga,
}

impl From<ProcessorKind> for SegmentKind {
    fn from(kind: ProcessorKind) -> Self {
        match kind {
            ProcessorKind::Cpu => SegmentKind::Cpu,
            ProcessorKind::Gpu => SegmentKind::Gpu,
            ProcessorKind::Datacopy => SegmentKind::Datacopy,
            ProcessorKind::Fpga => SegmentKind::Fpga,
        }
    }
}

impl From<SegmentKind> for ProcessorKind {
    fn from(kind: SegmentKind) -> Self {
        match kind {
            SegmentKind::Cpu => ProcessorKind::Cpu,
            SegmentKind::Gpu => ProcessorKind::Gpu,
            SegmentKind::Datacopy => ProcessorKind::Datacopy,
            SegmentKind::Fpga => ProcessorKind::Fpga,
        }
    }
}

/// One execution segment of a self-suspension task.
///
/// Segments are strictly sequential: segment *i* must finish before segment
/// *i + 1* may start, and the boundary between them is a self-suspension
/// interval.  Unlike DAG nodes, a segment's affinity is always a concrete
/// processor kind — `Any` is not part of the segment contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSegment {
    /// Unique id within the owning task.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    /// Worst-case execution time, abstract time units, strictly positive.
    pub execution_time: f64,
    pub affinity: ProcessorKind,
}

// ── Task ──────────────────────────────────────────────────────────────────────

/// Model-specific body of a [`Task`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model")]
pub enum TaskBody {
    /// DAG task model: precedence is the edge relation.
    #[serde(rename = "DAG")]
    Dag {
        nodes: Vec<TaskNode>,
        edges: Vec<TaskEdge>,
    },
    /// Self-suspension task model: precedence is segment order.
    Suspension { segments: Vec<TaskSegment> },
}

impl TaskBody {
    /// Number of schedulable units (nodes or segments).
    pub fn unit_count(&self) -> usize {
        match self {
            TaskBody::Dag { nodes, .. } => nodes.len(),
            TaskBody::Suspension { segments } => segments.len(),
        }
    }

    /// Sum of the execution times of every unit.
    pub fn total_execution_time(&self) -> f64 {
        match self {
            TaskBody::Dag { nodes, .. } => nodes.iter().map(|n| n.execution_time).sum(),
            TaskBody::Suspension { segments } => {
                segments.iter().map(|s| s.execution_time).sum()
            }
        }
    }

    /// Affinity of the unit with id `unit_id`, or `None` if no such unit
    /// exists in this body.
    pub fn affinity_of(&self, unit_id: &str) -> Option<Affinity> {
        match self {
            TaskBody::Dag { nodes, .. } => {
                nodes.iter().find(|n| n.id == unit_id).map(|n| n.affinity)
            }
            TaskBody::Suspension { segments } => segments
                .iter()
                .find(|s| s.id == unit_id)
                .map(|s| Affinity::from(s.affinity)),
        }
    }

    /// Returns `true` if unit `a` must complete before unit `b` may start.
    ///
    /// * DAG: reachability over the edge relation (transitive).
    /// * Suspension: strict segment-index order.
    ///
    /// Unknown unit ids never precede anything.
    pub fn precedes(&self, a: &str, b: &str) -> bool {
        match self {
            TaskBody::Dag { edges, .. } => topo::reachable(edges, a, b),
            TaskBody::Suspension { segments } => {
                let ia = segments.iter().position(|s| s.id == a);
                let ib = segments.iter().position(|s| s.id == b);
                matches!((ia, ib), (Some(x), Some(y)) if x < y)
            }
        }
    }
}

/// One real-time task: timing parameters plus a model-specific body.
///
/// Built either by the deterministic generator (`genMethod = Random`) or
/// supplied explicitly by the user (`genMethod = User`), then validated and
/// frozen inside the run input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u32,
    pub name: String,
    /// Release period, abstract time units, strictly positive.
    pub period: f64,
    /// Relative deadline, strictly positive.  May be below, equal to, or
    /// above `period` depending on the configured period–deadline rule.
    pub deadline: f64,
    pub body: TaskBody,
}

impl Task {
    /// Utilization fraction: total execution time over period.
    ///
    /// Returns `0.0` when the period is zero to avoid division by zero (a
    /// zero period is rejected by validation anyway).
    pub fn utilization(&self) -> f64 {
        if self.period <= 0.0 {
            0.0
        } else {
            self.body.total_execution_time() / self.period
        }
    }
}

/// An ordered task set — the unit the validator admits and the generator
/// produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Taskset {
    pub tasks: Vec<Task>,
}

impl Taskset {
    /// Sum of per-task utilizations.
    pub fn total_utilization(&self) -> f64 {
        self.tasks.iter().map(Task::utilization).sum()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::Processor;

    fn node(id: &str, affinity: Affinity, wcet: f64) -> TaskNode {
        TaskNode {
            id: id.into(),
            name: id.into(),
            kind: NodeKind::Compute,
            execution_time: wcet,
            affinity,
            x: 0.0,
            y: 0.0,
            period: None,
            deadline: None,
        }
    }

    fn edge(id: &str, source: &str, target: &str) -> TaskEdge {
        TaskEdge {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }

    fn segment(id: &str, kind: ProcessorKind, wcet: f64) -> TaskSegment {
        TaskSegment {
            id: id.into(),
            kind: kind.into(),
            execution_time: wcet,
            affinity: kind,
        }
    }

    // ── Affinity ──────────────────────────────────────────────────────────────

    #[test]
    fn any_affinity_allows_every_kind() {
        for kind in ProcessorKind::ALL {
            assert!(Affinity::Any.allows(kind));
        }
    }

    #[test]
    fn concrete_affinity_allows_only_its_kind() {
        assert!(Affinity::Gpu.allows(ProcessorKind::Gpu));
        assert!(!Affinity::Gpu.allows(ProcessorKind::Cpu));
    }

    #[test]
    fn satisfiable_on_checks_platform_kinds() {
        let hw = HardwareConfig {
            processors: vec![Processor {
                kind: ProcessorKind::Cpu,
                count: 2,
                preemptive: true,
            }],
        };
        assert!(Affinity::Cpu.satisfiable_on(&hw));
        assert!(Affinity::Any.satisfiable_on(&hw));
        assert!(!Affinity::Fpga.satisfiable_on(&hw));
    }

    #[test]
    fn any_is_unsatisfiable_on_empty_platform() {
        let hw = HardwareConfig::default();
        assert!(!Affinity::Any.satisfiable_on(&hw));
    }

    // ── TaskNode ──────────────────────────────────────────────────────────────

    #[test]
    fn effective_deadline_defaults_to_period() {
        let mut n = node("n0", Affinity::Any, 1.0);
        assert_eq!(n.effective_deadline(), None);

        n.period = Some(100.0);
        assert_eq!(n.effective_deadline(), Some(100.0));

        n.deadline = Some(80.0);
        assert_eq!(n.effective_deadline(), Some(80.0));
    }

    // ── TaskBody: shared operations ───────────────────────────────────────────

    fn diamond_dag() -> TaskBody {
        // n0 → n1 → n3, n0 → n2 → n3
        TaskBody::Dag {
            nodes: vec![
                node("n0", Affinity::Cpu, 1.0),
                node("n1", Affinity::Gpu, 2.0),
                node("n2", Affinity::Any, 3.0),
                node("n3", Affinity::Cpu, 4.0),
            ],
            edges: vec![
                edge("e0", "n0", "n1"),
                edge("e1", "n0", "n2"),
                edge("e2", "n1", "n3"),
                edge("e3", "n2", "n3"),
            ],
        }
    }

    #[test]
    fn dag_total_execution_time_sums_nodes() {
        assert_eq!(diamond_dag().total_execution_time(), 10.0);
    }

    #[test]
    fn dag_affinity_lookup() {
        let body = diamond_dag();
        assert_eq!(body.affinity_of("n1"), Some(Affinity::Gpu));
        assert_eq!(body.affinity_of("missing"), None);
    }

    #[test]
    fn dag_precedence_is_transitive() {
        let body = diamond_dag();
        assert!(body.precedes("n0", "n1"));
        assert!(body.precedes("n0", "n3"), "transitive via n1 or n2");
        assert!(!body.precedes("n3", "n0"));
        assert!(!body.precedes("n1", "n2"), "siblings are unordered");
    }

    #[test]
    fn suspension_precedence_is_segment_order() {
        let body = TaskBody::Suspension {
            segments: vec![
                segment("s0", ProcessorKind::Cpu, 2.0),
                segment("s1", ProcessorKind::Gpu, 3.0),
                segment("s2", ProcessorKind::Cpu, 1.0),
            ],
        };
        assert!(body.precedes("s0", "s2"));
        assert!(!body.precedes("s2", "s0"));
        assert!(!body.precedes("s1", "s1"));
        assert!(!body.precedes("s0", "missing"));
        assert_eq!(body.total_execution_time(), 6.0);
        assert_eq!(body.affinity_of("s1"), Some(Affinity::Gpu));
    }

    // ── Task ──────────────────────────────────────────────────────────────────

    #[test]
    fn task_utilization_is_wcet_over_period() {
        let t = Task {
            id: 0,
            name: "t0".into(),
            period: 100.0,
            deadline: 100.0,
            body: diamond_dag(),
        };
        assert!((t.utilization() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn task_utilization_zero_period_is_zero() {
        let t = Task {
            id: 0,
            name: "t0".into(),
            period: 0.0,
            deadline: 1.0,
            body: diamond_dag(),
        };
        assert_eq!(t.utilization(), 0.0);
    }

    #[test]
    fn taskset_total_utilization_sums_tasks() {
        let mk = |period| Task {
            id: 0,
            name: "t".into(),
            period,
            deadline: period,
            body: diamond_dag(),
        };
        let ts = Taskset {
            tasks: vec![mk(100.0), mk(50.0)],
        };
        assert!((ts.total_utilization() - 0.3).abs() < 1e-12);
    }

    // ── Serialisation contract ────────────────────────────────────────────────

    #[test]
    fn task_body_yaml_tags_match_task_model_names() {
        let dag = serde_yaml::to_string(&diamond_dag()).unwrap();
        assert!(dag.contains("model: DAG"), "got:\n{dag}");

        let susp = TaskBody::Suspension {
            segments: vec![segment("s0", ProcessorKind::Fpga, 1.0)],
        };
        let yaml = serde_yaml::to_string(&susp).unwrap();
        assert!(yaml.contains("model: Suspension"), "got:\n{yaml}");
        let back: TaskBody = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, susp);
    }

    #[test]
    fn node_kind_io_uses_wire_name() {
        let yaml = serde_yaml::to_string(&NodeKind::Io).unwrap();
        assert_eq!(yaml.trim(), "I/O");
    }

    #[test]
    fn segment_type_and_affinity_use_distinct_datacopy_spellings() {
        let seg = segment("s0", ProcessorKind::Datacopy, 2.0);
        let yaml = serde_yaml::to_string(&seg).unwrap();
        assert!(yaml.contains("type: Datacopy"), "got:\n{yaml}");
        assert!(yaml.contains("affinity: DATACOPY"), "got:\n{yaml}");

        // A segment exported by the front-end deserialises unchanged
        let wire = "id: s0\ntype: Datacopy\nexecutionTime: 2.0\naffinity: DATACOPY\n";
        let back: TaskSegment = serde_yaml::from_str(wire).unwrap();
        assert_eq!(back, seg);
    }
}
