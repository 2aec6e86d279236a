/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Hetersim – heterogeneous real-time scheduling simulator (domain model)
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── hardware/    – processor pools and the hardware platform
//! ├── taskgraph/   – DAG / suspension task model, topology helpers
//! ├── config/      – YAML simulation configuration
//! ├── validate/    – admissibility checks for configs and tasksets
//! ├── generate/    – seeded random taskset generation (UUniFast)
//! ├── run/         – simulation session, progress channel, cancellation
//! └── result/      – result aggregation and response-time statistics
//! ```

pub mod config;
pub mod generate;
pub mod hardware;
pub mod result;
pub mod run;
pub mod taskgraph;
pub mod validate;
