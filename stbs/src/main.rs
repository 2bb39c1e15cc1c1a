/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use stbs::config::StbsConfig;
use stbs::dispatch::{DispatchSink, FrameSink, LogSink, PeriodWaiter, WakeSink};
use stbs::io::{refresh_inputs, update_outputs, IoSnapshot, SimulatedBoard};
use stbs::{Scheduler, Task};

// ── CLI argument definition ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SinkKind {
    /// Log every activation.
    Log,
    /// Write a notification frame per activation to stdout.
    Frame,
    /// Both of the above.
    Both,
}

/// Time-triggered cyclic scheduler demo.
///
/// Example:
///   stbs --config stbs.yaml --run-for-ms 2000 --sink frame | stbs-monitor
#[derive(Debug, Parser)]
#[command(name = "stbs", about = "Simple time-based scheduler", long_about = None)]
struct Cli {
    /// Path to the YAML scheduler configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// How long to keep the scheduler running, in milliseconds.
    #[arg(short = 'r', long = "run-for-ms", default_value_t = 1_000)]
    run_for_ms: u64,

    /// Where activations are reported.
    #[arg(short = 's', long = "sink", value_enum, default_value_t = SinkKind::Log)]
    sink: SinkKind,

    /// Device id written into notification frames (overrides the config).
    #[arg(short = 'd', long = "device-id")]
    device_id: Option<u8>,
}

/// Task table used when no configuration file is given.
fn demo_tasks() -> Vec<Task> {
    vec![
        Task::new("inputs", 50, 3),
        Task::new("leds", 100, 2),
        Task::new("heartbeat", 250, 1),
    ]
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    // stdout carries notification frames, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!(
        config = ?cli.config,
        run_for_ms = cli.run_for_ms,
        sink = ?cli.sink,
        "STBS starting up..."
    );

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // ── Load configuration ────────────────────────────────────────────────────
    let mut config = match &cli.config {
        Some(path) => StbsConfig::load_from_file(path)?,
        None => {
            warn!("No configuration file provided, using demo task table");
            StbsConfig::default()
        }
    };
    if let Some(id) = cli.device_id {
        config.notify.device_id = id;
        config
            .notify
            .validate()
            .with_context(|| format!("Invalid --device-id {id}"))?;
    }
    let tasks = if config.tasks.is_empty() {
        demo_tasks()
    } else {
        config.tasks()
    };

    // ── Build sinks ───────────────────────────────────────────────────────────
    let mut wake = WakeSink::new();
    let waiters: Vec<(String, PeriodWaiter)> = tasks
        .iter()
        .map(|t| (t.id.clone(), wake.register(t.id.clone())))
        .collect();

    let mut sinks: Vec<Box<dyn DispatchSink>> = vec![Box::new(wake)];
    if matches!(cli.sink, SinkKind::Log | SinkKind::Both) {
        sinks.push(Box::new(LogSink));
    }
    if matches!(cli.sink, SinkKind::Frame | SinkKind::Both) {
        sinks.push(Box::new(FrameSink::new(
            std::io::stdout(),
            config.notify.device_id,
            config.notify.command,
        )?));
    }

    // ── Register tasks ────────────────────────────────────────────────────────
    let mut scheduler = Scheduler::new(
        config.scheduler.default_tick_ms,
        config.scheduler.capacity,
        sinks,
    )
    .context("Failed to create scheduler")?;

    for task in tasks {
        let id = task.id.clone();
        if let Err(e) = scheduler.add_task(task).await {
            warn!(task = %id, error = %e, "Task rejected");
        }
    }

    // ── Task bodies ───────────────────────────────────────────────────────────
    let snapshot = Arc::new(Mutex::new(IoSnapshot::default()));
    let board = Arc::new(Mutex::new(SimulatedBoard::new()));
    if let Ok(mut b) = board.lock() {
        // Something to mirror.
        b.press(0, true)?;
        b.press(2, true)?;
    }

    let workers: Vec<JoinHandle<()>> = waiters
        .into_iter()
        .map(|(id, waiter)| {
            let snapshot = Arc::clone(&snapshot);
            let board = Arc::clone(&board);
            tokio::spawn(async move {
                loop {
                    waiter.wait_period().await;
                    task_body(&id, &snapshot, &board);
                }
            })
        })
        .collect();

    // ── Run ───────────────────────────────────────────────────────────────────
    scheduler.start()?;
    tokio::time::sleep(Duration::from_millis(cli.run_for_ms)).await;
    scheduler.stop().await?;

    for w in &workers {
        w.abort();
    }

    info!("{}", scheduler.status());
    for task in scheduler.describe_all() {
        info!("  {task}");
    }
    if let Ok(b) = board.lock() {
        info!(leds = ?b.leds(), "Final LED state");
    }

    Ok(())
}

/// Work done on each activation.  `inputs` samples the buttons, `leds` mirrors
/// them to the LEDs, anything else just reports in.
fn task_body(id: &str, snapshot: &Mutex<IoSnapshot>, board: &Mutex<SimulatedBoard>) {
    let (Ok(mut snap), Ok(mut board)) = (snapshot.lock(), board.lock()) else {
        warn!(task = %id, "I/O state unavailable");
        return;
    };
    let result = match id {
        "inputs" => refresh_inputs(&mut snap, &*board),
        "leds" => {
            snap.outputs = snap.inputs;
            update_outputs(&snap, &mut *board)
        }
        _ => {
            tracing::debug!(task = %id, "tick");
            Ok(())
        }
    };
    if let Err(e) = result {
        warn!(task = %id, error = %e, "I/O failed");
    }
}
