/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the simulation session.
//!
//! Two error enums model the two failure layers:
//!
//! * [`RunError`] — submission-time failures, raised **before** a run starts
//!   (nothing has been spawned when one of these is returned).
//! * [`EngineError`] — failures raised by the engine while a run executes;
//!   the session maps them to the matching terminal [`RunEvent`].
//!
//! Every variant carries a human-readable message (the `Display` impl) and a
//! machine-checkable kind (the variant itself).
//!
//! [`RunEvent`]: super::RunEvent

use thiserror::Error;

use crate::validate::ValidationError;

/// Why a submission was rejected before a run could start.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    /// The configuration failed validation; no run was started.
    #[error("configuration rejected: {0}")]
    Validation(#[from] ValidationError),

    /// A run is already active in this session.  Cancel or await it before
    /// submitting again.
    #[error("a simulation run is already active in this session")]
    Conflict,
}

/// Failure raised by the engine during a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Opaque internal failure.  Surfaced to the caller as the `Failed`
    /// terminal event; non-retriable within this run.
    #[error("engine failure: {0}")]
    Failure(String),

    /// The engine observed the cancellation flag and unwound.  Surfaced as
    /// the `Stopped` terminal event — benign, never fatal.
    #[error("run cancelled")]
    Cancelled,
}
