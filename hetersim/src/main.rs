/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info};

use hetersim::config::{GenMethod, SimulationConfig};
use hetersim::generate::generate_taskset;
use hetersim::taskgraph::Taskset;
use hetersim::validate::validate_config;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Hetersim configuration front-end.
///
/// Example:
///   hetersim -c demos/simulation.yaml --seed 42 --dump-taskset
#[derive(Debug, Parser)]
#[command(
    name = "hetersim",
    about = "Heterogeneous real-time scheduling simulator – configuration front-end",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML simulation configuration file.
    #[arg(short = 'c', long = "config")]
    config: PathBuf,

    /// Override the configured random seed.
    #[arg(short = 's', long = "seed")]
    seed: Option<i64>,

    /// Validate the configuration and exit without generating anything.
    #[arg(long = "validate-only", default_value_t = false)]
    validate_only: bool,

    /// Print the generated (or user-provided) taskset as YAML on stdout.
    #[arg(long = "dump-taskset", default_value_t = false)]
    dump_taskset: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Initialise structured logging.
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // ── Load and validate the configuration ───────────────────────────────────
    let mut config = match SimulationConfig::from_yaml_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            process::exit(1);
        }
    };

    if let Some(seed) = cli.seed {
        info!(seed, "Overriding configured random seed");
        config.taskset.random_seed = seed;
    }

    if let Err(e) = validate_config(&config) {
        error!("Configuration rejected: {e}");
        process::exit(1);
    }
    info!("Configuration is valid");

    if cli.validate_only {
        return;
    }

    // ── Obtain the taskset ────────────────────────────────────────────────────
    let taskset = match config.taskset.gen_method {
        GenMethod::User => match config.user_taskset {
            // validate_config guarantees presence for GenMethod::User
            Some(taskset) => taskset,
            None => {
                error!("genMethod is User but no taskset was provided");
                process::exit(1);
            }
        },
        GenMethod::Random => match generate_taskset(&config.hardware, &config.taskset) {
            Ok(taskset) => taskset,
            Err(e) => {
                error!("Taskset generation failed: {e}");
                process::exit(1);
            }
        },
    };

    print_summary(&taskset);

    if cli.dump_taskset {
        match serde_yaml::to_string(&taskset) {
            Ok(yaml) => println!("{yaml}"),
            Err(e) => {
                error!("Failed to serialise taskset: {e}");
                process::exit(1);
            }
        }
    }
}

fn print_summary(taskset: &Taskset) {
    info!(
        "Taskset: {} task(s), total utilization {:.3}",
        taskset.tasks.len(),
        taskset.total_utilization(),
    );
    for task in &taskset.tasks {
        info!(
            "  [{name}]  period={period:.1}  deadline={deadline:.1}  util={util:.3}  units={units}",
            name = task.name,
            period = task.period,
            deadline = task.deadline,
            util = task.utilization(),
            units = task.body.unit_count(),
        );
    }
}
