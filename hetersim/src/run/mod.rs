//! Simulation session: submission, live progress, cancellation, terminal
//! events.
//!
//! A run is one long computation observed asynchronously.  Submission
//! returns immediately with a [`RunHandle`]; the engine executes on a
//! blocking task and streams [`RunEvent`]s over an ordered channel:
//!
//! ```text
//! idle ──submit──► running ──┬──► completed   (exactly one SimulationResult)
//!                            ├──► failed      (structured error, logs remain valid)
//!                            └──► stopped     (cancellation; logs only, no result)
//! ```
//!
//! Guarantees enforced here, independent of the engine implementation:
//!
//! * progress and `current_slice` are **non-decreasing** across snapshots
//!   (regressions from a sloppy engine are clamped);
//! * **at most one terminal event** per run — the event sender is consumed
//!   by the terminal send;
//! * only one run is active per session; a second submission is rejected
//!   with [`RunError::Conflict`];
//! * cancellation is honored at the engine's next suspension point and is
//!   idempotent — cancelling after the terminal event is an acknowledged
//!   no-op.
//!
//! The scheduling engine itself is out of scope; [`SimulationEngine`] is the
//! seam where one plugs in.

pub mod error;

pub use error::{EngineError, RunError};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;
use crate::result::SimulationResult;
use crate::validate;

// ── Progress snapshot ─────────────────────────────────────────────────────────

/// One ephemeral status snapshot; each instance supersedes the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationProgress {
    /// Completion fraction in `[0, 1]`, non-decreasing across snapshots.
    pub progress: f64,
    /// Current time slice, `current_slice <= total_slices`.
    pub current_slice: u64,
    pub total_slices: u64,
    pub status: String,
    /// Append-only log lines emitted so far.
    pub logs: Vec<String>,
}

/// Lifecycle of one run as observed through its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Failed,
    Stopped,
}

/// One element of the ordered event stream a caller observes.
///
/// The stream is zero or more `Progress` events followed by exactly one
/// terminal event (`Completed`, `Failed`, or `Stopped`).
#[derive(Debug)]
pub enum RunEvent {
    Progress(SimulationProgress),
    Completed(Box<SimulationResult>),
    Failed(String),
    Stopped,
}

// ── Engine seam ───────────────────────────────────────────────────────────────

/// Live context handed to the engine for the duration of one run.
///
/// The engine reports progress through [`report`](Self::report), appends log
/// lines through [`log`](Self::log), and polls
/// [`cancelled`](Self::cancelled) at its suspension points.
pub struct EngineContext {
    cancel: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<RunEvent>,
    logs: Vec<String>,
    last_progress: f64,
    last_slice: u64,
}

impl EngineContext {
    /// Returns `true` once cancellation has been requested.  The engine
    /// should unwind with [`EngineError::Cancelled`] at the next observable
    /// suspension point — not necessarily instantaneously.
    pub fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Append one line to the run log.  Lines already emitted stay valid
    /// even if the run later fails or stops.
    pub fn log(&mut self, line: impl Into<String>) {
        let line = line.into();
        debug!(line = %line, "engine log");
        self.logs.push(line);
    }

    /// Emit a progress snapshot.
    ///
    /// `progress` and `current_slice` are clamped so the observed sequence
    /// never decreases; `progress` is additionally clamped into `[0, 1]`
    /// and `current_slice` to `total_slices`.
    pub fn report(
        &mut self,
        progress: f64,
        current_slice: u64,
        total_slices: u64,
        status: impl Into<String>,
    ) {
        if progress < self.last_progress || current_slice < self.last_slice {
            warn!(progress, current_slice, "engine reported regressing progress; clamped");
        }
        let progress = progress.clamp(0.0, 1.0).max(self.last_progress);
        let current_slice = current_slice.min(total_slices).max(self.last_slice);
        self.last_progress = progress;
        self.last_slice = current_slice;

        let snapshot = SimulationProgress {
            progress,
            current_slice,
            total_slices,
            status: status.into(),
            logs: self.logs.clone(),
        };
        // A dropped handle only means nobody is watching; the run finishes
        // regardless.
        let _ = self.events.send(RunEvent::Progress(snapshot));
    }
}

/// The seam where a concrete scheduling engine plugs in.
///
/// The engine receives the immutable run input and the live context; it
/// returns the finished [`SimulationResult`], or an [`EngineError`] which
/// the session maps to the matching terminal event.
pub trait SimulationEngine: Send + 'static {
    fn run(
        self: Box<Self>,
        config: SimulationConfig,
        ctx: &mut EngineContext,
    ) -> Result<SimulationResult, EngineError>;
}

// ── RunHandle ─────────────────────────────────────────────────────────────────

/// Caller-side handle to one submitted run.
#[derive(Debug)]
pub struct RunHandle {
    events: mpsc::UnboundedReceiver<RunEvent>,
    cancel: Arc<AtomicBool>,
    state: RunState,
}

impl RunHandle {
    /// Receive the next event, updating the observed [`RunState`].
    ///
    /// Returns `None` once the stream is exhausted (always after a terminal
    /// event has been delivered).
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        let event = self.events.recv().await?;
        match &event {
            RunEvent::Progress(_) => {}
            RunEvent::Completed(_) => self.state = RunState::Completed,
            RunEvent::Failed(_) => self.state = RunState::Failed,
            RunEvent::Stopped => self.state = RunState::Stopped,
        }
        Some(event)
    }

    /// Drain the stream until the terminal event and return it.
    ///
    /// Progress snapshots on the way are discarded.  Returns `None` only if
    /// the stream ended without a terminal event, which the session never
    /// produces for a successfully started run.
    pub async fn wait(&mut self) -> Option<RunEvent> {
        while let Some(event) = self.next_event().await {
            if !matches!(event, RunEvent::Progress(_)) {
                return Some(event);
            }
        }
        None
    }

    /// Request cancellation.
    ///
    /// Idempotent: requesting after the run reached a terminal state is an
    /// acknowledged no-op, not an error.
    pub fn cancel(&self) {
        if !self.cancel.swap(true, Ordering::Relaxed) {
            info!("cancellation requested");
        }
    }

    /// Last observed lifecycle state (updated by [`next_event`]).
    ///
    /// [`next_event`]: Self::next_event
    pub fn state(&self) -> RunState {
        self.state
    }
}

// ── SimulationSession ─────────────────────────────────────────────────────────

/// Owns the one-active-run rule for a configuration session.
///
/// Cloning the session shares the rule: all clones gate on the same active
/// flag.
#[derive(Clone, Default)]
pub struct SimulationSession {
    active: Arc<AtomicBool>,
}

impl SimulationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while a run is active.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Validate `config` and start `engine` on it.
    ///
    /// Returns immediately with a [`RunHandle`]; the engine runs on a
    /// blocking task.  The handle's event stream carries zero or more
    /// progress snapshots and exactly one terminal event.
    ///
    /// # Errors
    /// * [`RunError::Validation`] — the configuration is inadmissible;
    ///   nothing was started.
    /// * [`RunError::Conflict`] — another run is active in this session.
    pub fn submit(
        &self,
        config: SimulationConfig,
        engine: Box<dyn SimulationEngine>,
    ) -> Result<RunHandle, RunError> {
        // Validation strictly precedes the idle → running transition
        validate::validate_config(&config)?;

        if self.active.swap(true, Ordering::SeqCst) {
            return Err(RunError::Conflict);
        }

        info!(
            task_count = config.taskset.task_count,
            gen_method = ?config.taskset.gen_method,
            "run submitted"
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let handle = RunHandle {
            events: rx,
            cancel: Arc::clone(&cancel),
            state: RunState::Running,
        };

        let active = Arc::clone(&self.active);
        let events = tx;
        tokio::task::spawn_blocking(move || {
            let guard = ActiveGuard(active);
            let mut ctx = EngineContext {
                cancel,
                events: events.clone(),
                logs: Vec::new(),
                last_progress: 0.0,
                last_slice: 0,
            };

            // Contain engine panics: a panicking engine must still produce
            // its terminal event, like any other failure.
            let outcome =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    engine.run(config, &mut ctx)
                }));

            // The flag clears before the terminal event goes out, so a
            // caller that has observed the terminal may submit again
            // immediately.
            drop(guard);

            // Exactly one terminal event; `events` is dropped right after,
            // which ends the handle's stream.
            let terminal = match outcome {
                Ok(Ok(result)) => {
                    info!(
                        is_schedulable = result.is_schedulable,
                        misses = result.deadline_misses.len(),
                        "run completed"
                    );
                    RunEvent::Completed(Box::new(result))
                }
                Ok(Err(EngineError::Cancelled)) => {
                    info!("run stopped before completion");
                    RunEvent::Stopped
                }
                Ok(Err(EngineError::Failure(message))) => {
                    warn!(message = %message, "run failed");
                    RunEvent::Failed(message)
                }
                Err(payload) => {
                    let message = format!("engine panicked: {}", panic_message(payload.as_ref()));
                    warn!(message = %message, "run failed");
                    RunEvent::Failed(message)
                }
            };
            let _ = events.send(terminal);
        });

        Ok(handle)
    }
}

/// Clears the session's active flag on every exit path of the blocking
/// task, including an unwinding engine.
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}

// ── Trace export ──────────────────────────────────────────────────────────────

/// Render a completed run's opaque trace as a downloadable text artifact,
/// one engine event per line.
pub fn export_trace(result: &SimulationResult) -> String {
    let mut artifact = result.trace.join("\n");
    if !artifact.is_empty() {
        artifact.push('\n');
    }
    artifact
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenMethod, PeriodDeadlineRule, TaskModel, TasksetConfig};
    use crate::hardware::{HardwareConfig, Processor, ProcessorKind};
    use crate::result::ResultAggregator;
    use std::time::Duration;

    // ── Test helpers ──────────────────────────────────────────────────────────

    fn valid_config() -> SimulationConfig {
        SimulationConfig {
            hardware: HardwareConfig {
                processors: vec![Processor {
                    kind: ProcessorKind::Cpu,
                    count: 2,
                    preemptive: false,
                }],
            },
            taskset: TasksetConfig {
                task_count: 3,
                task_model: TaskModel::Dag,
                edge_density: 0.3,
                utilization: 1.0,
                segment_number: 3,
                segment_length_min: None,
                segment_length_max: None,
                release_times: 5,
                random_seed: 1,
                gen_method: GenMethod::Random,
                period_deadline_rule: PeriodDeadlineRule::Implicit,
                deadline_factor: 1.0,
            },
            user_taskset: None,
        }
    }

    /// Engine that reports a few slices and completes with an empty result.
    struct TickEngine {
        slices: u64,
    }

    impl SimulationEngine for TickEngine {
        fn run(
            self: Box<Self>,
            config: SimulationConfig,
            ctx: &mut EngineContext,
        ) -> Result<SimulationResult, EngineError> {
            let mut agg = ResultAggregator::new(config.hardware.clone(), self.slices, vec![]);
            for slice in 0..self.slices {
                if ctx.cancelled() {
                    return Err(EngineError::Cancelled);
                }
                ctx.log(format!("slice {slice}"));
                ctx.report(
                    slice as f64 / self.slices as f64,
                    slice,
                    self.slices,
                    "Simulation running...",
                );
                agg.push_trace(format!("tick {slice}"));
            }
            ctx.report(1.0, self.slices, self.slices, "Simulation completed");
            Ok(agg.finish())
        }
    }

    /// Engine that spins until cancelled.
    struct SpinEngine;

    impl SimulationEngine for SpinEngine {
        fn run(
            self: Box<Self>,
            _config: SimulationConfig,
            ctx: &mut EngineContext,
        ) -> Result<SimulationResult, EngineError> {
            loop {
                if ctx.cancelled() {
                    ctx.log("stopping at last consistent slice");
                    return Err(EngineError::Cancelled);
                }
                std::thread::sleep(Duration::from_millis(2));
            }
        }
    }

    /// Engine that panics mid-run instead of returning an error.
    struct PanickingEngine;

    impl SimulationEngine for PanickingEngine {
        fn run(
            self: Box<Self>,
            _config: SimulationConfig,
            ctx: &mut EngineContext,
        ) -> Result<SimulationResult, EngineError> {
            ctx.report(0.1, 1, 10, "Simulation running...");
            panic!("slot table index out of range");
        }
    }

    /// Engine that fails immediately with a message.
    struct FailingEngine;

    impl SimulationEngine for FailingEngine {
        fn run(
            self: Box<Self>,
            _config: SimulationConfig,
            _ctx: &mut EngineContext,
        ) -> Result<SimulationResult, EngineError> {
            Err(EngineError::Failure("internal solver diverged".into()))
        }
    }

    /// Engine that reports regressing progress values.
    struct RegressingEngine;

    impl SimulationEngine for RegressingEngine {
        fn run(
            self: Box<Self>,
            config: SimulationConfig,
            ctx: &mut EngineContext,
        ) -> Result<SimulationResult, EngineError> {
            ctx.report(0.6, 6, 10, "forward");
            ctx.report(0.2, 2, 10, "backward"); // must be clamped
            ctx.report(0.9, 9, 10, "forward again");
            let agg = ResultAggregator::new(config.hardware.clone(), 10, vec![]);
            Ok(agg.finish())
        }
    }

    // ── Happy path ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn completed_run_delivers_progress_then_one_result() {
        let session = SimulationSession::new();
        let mut handle = session
            .submit(valid_config(), Box::new(TickEngine { slices: 4 }))
            .unwrap();

        let mut progress_count = 0;
        let mut completed = 0;
        while let Some(event) = handle.next_event().await {
            match event {
                RunEvent::Progress(p) => {
                    progress_count += 1;
                    assert!(p.current_slice <= p.total_slices);
                }
                RunEvent::Completed(result) => {
                    completed += 1;
                    assert!(result.is_schedulable);
                    assert_eq!(result.trace.len(), 4);
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }
        assert!(progress_count >= 1);
        assert_eq!(completed, 1, "exactly one terminal event");
        assert_eq!(handle.state(), RunState::Completed);
        assert!(!session.is_active(), "session frees up after completion");
    }

    #[tokio::test]
    async fn progress_and_slices_are_non_decreasing() {
        let session = SimulationSession::new();
        let mut handle = session
            .submit(valid_config(), Box::new(RegressingEngine))
            .unwrap();

        let mut last = (0.0f64, 0u64);
        while let Some(event) = handle.next_event().await {
            if let RunEvent::Progress(p) = event {
                assert!(p.progress >= last.0, "progress regressed");
                assert!(p.current_slice >= last.1, "slice regressed");
                last = (p.progress, p.current_slice);
            }
        }
        assert_eq!(handle.state(), RunState::Completed);
    }

    #[tokio::test]
    async fn logs_accumulate_across_snapshots() {
        let session = SimulationSession::new();
        let mut handle = session
            .submit(valid_config(), Box::new(TickEngine { slices: 3 }))
            .unwrap();

        let mut last_len = 0;
        while let Some(event) = handle.next_event().await {
            if let RunEvent::Progress(p) = event {
                assert!(p.logs.len() >= last_len, "logs must be append-only");
                last_len = p.logs.len();
            }
        }
        assert_eq!(last_len, 3);
    }

    // ── Submission rejection ──────────────────────────────────────────────────

    #[tokio::test]
    async fn invalid_config_is_rejected_before_any_run() {
        let session = SimulationSession::new();
        let mut config = valid_config();
        config.hardware.processors[0].count = 0;

        let err = session
            .submit(config, Box::new(TickEngine { slices: 1 }))
            .unwrap_err();
        assert!(matches!(err, RunError::Validation(_)));
        assert!(!session.is_active(), "rejected submission starts nothing");

        // The session accepts a valid config afterwards
        let mut handle = session
            .submit(valid_config(), Box::new(TickEngine { slices: 1 }))
            .unwrap();
        assert!(matches!(handle.wait().await, Some(RunEvent::Completed(_))));
    }

    #[tokio::test]
    async fn second_run_while_active_is_a_conflict() {
        let session = SimulationSession::new();
        let handle = session.submit(valid_config(), Box::new(SpinEngine)).unwrap();

        let err = session
            .submit(valid_config(), Box::new(TickEngine { slices: 1 }))
            .unwrap_err();
        assert_eq!(err, RunError::Conflict);

        handle.cancel();
        let mut handle = handle;
        assert!(matches!(handle.wait().await, Some(RunEvent::Stopped)));
    }

    // ── Cancellation ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn cancelled_run_stops_without_a_result() {
        let session = SimulationSession::new();
        let mut handle = session.submit(valid_config(), Box::new(SpinEngine)).unwrap();

        handle.cancel();
        match handle.wait().await {
            Some(RunEvent::Stopped) => {}
            other => panic!("expected Stopped, got {other:?}"),
        }
        assert_eq!(handle.state(), RunState::Stopped);
        assert!(handle.next_event().await.is_none(), "nothing after terminal");
    }

    #[tokio::test]
    async fn cancel_after_completion_is_an_acknowledged_noop() {
        let session = SimulationSession::new();
        let mut handle = session
            .submit(valid_config(), Box::new(TickEngine { slices: 2 }))
            .unwrap();

        assert!(matches!(handle.wait().await, Some(RunEvent::Completed(_))));
        let state_before = handle.state();

        handle.cancel();
        handle.cancel(); // idempotent

        assert_eq!(handle.state(), state_before, "no state change");
    }

    #[tokio::test]
    async fn session_accepts_a_new_run_after_cancellation() {
        let session = SimulationSession::new();
        let mut handle = session.submit(valid_config(), Box::new(SpinEngine)).unwrap();
        handle.cancel();
        assert!(matches!(handle.wait().await, Some(RunEvent::Stopped)));

        let mut handle = session
            .submit(valid_config(), Box::new(TickEngine { slices: 1 }))
            .unwrap();
        assert!(matches!(handle.wait().await, Some(RunEvent::Completed(_))));
    }

    // ── Failure ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn failing_engine_delivers_one_failed_event() {
        let session = SimulationSession::new();
        let mut handle = session.submit(valid_config(), Box::new(FailingEngine)).unwrap();

        match handle.wait().await {
            Some(RunEvent::Failed(message)) => {
                assert!(message.contains("solver diverged"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        assert_eq!(handle.state(), RunState::Failed);
        assert!(handle.next_event().await.is_none());
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn panicking_engine_still_delivers_a_terminal_event() {
        let session = SimulationSession::new();
        let mut handle = session
            .submit(valid_config(), Box::new(PanickingEngine))
            .unwrap();

        // The stream must not simply end: the panic surfaces as Failed
        match handle.wait().await {
            Some(RunEvent::Failed(message)) => {
                assert!(message.contains("panicked"), "got: {message}");
                assert!(message.contains("slot table"), "got: {message}");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        assert_eq!(handle.state(), RunState::Failed);
        assert!(handle.next_event().await.is_none());

        // The session frees up despite the unwound engine
        assert!(!session.is_active());
        let mut handle = session
            .submit(valid_config(), Box::new(TickEngine { slices: 1 }))
            .unwrap();
        assert!(matches!(handle.wait().await, Some(RunEvent::Completed(_))));
    }

    // ── Trace export ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn trace_export_renders_one_line_per_event() {
        let session = SimulationSession::new();
        let mut handle = session
            .submit(valid_config(), Box::new(TickEngine { slices: 3 }))
            .unwrap();

        let Some(RunEvent::Completed(result)) = handle.wait().await else {
            panic!("expected completion");
        };
        let artifact = export_trace(&result);
        assert_eq!(artifact, "tick 0\ntick 1\ntick 2\n");
    }

    #[test]
    fn trace_export_of_empty_trace_is_empty() {
        let agg = ResultAggregator::new(HardwareConfig::default(), 0, vec![]);
        let result = agg.finish();
        assert_eq!(export_trace(&result), "");
    }
}
